// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # amdkit-loader
//!
//! An asynchronous AMD / CommonJS module loading engine.
//!
//! - `define([name,] [dependencies,] factory)` in AMD, CommonJS and mixed styles
//! - `require.load(name)` with at most one in-flight fetch per module
//! - a synchronous exports cache behind `require(name)`
//! - path aliases, packages with shimmed legacy entries, `.json` data
//! - `resource!plugin` identifiers handled by plugin modules
//!
//! How module bodies reach the loader is up to a [`Fetcher`]:
//! [`MemoryFetcher`] serves closures registered in-process, [`FsFetcher`]
//! reads files and hands them to a pluggable [`ScriptHost`].
//!
//! ## Quick Start
//!
//! ```rust
//! use amdkit_loader::{Definition, Factory, MemoryFetcher, ModuleLoader, Value};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> amdkit_loader::Result<()> {
//! let fetcher = MemoryFetcher::new();
//! fetcher.module("greeting", Definition::new(Factory::value(Value::from("hello"))));
//!
//! let loader = ModuleLoader::new(fetcher);
//! assert_eq!(loader.load("./greeting").await?, Value::from("hello"));
//! assert_eq!(loader.require("greeting")?, Value::from("hello"));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod fetch;
pub mod module_system;
pub mod value;

// Re-exports
pub use config::{LoaderConfig, Shim};
pub use error::{LoaderError, Result};
pub use fetch::{DataOnlyHost, FetchRequest, Fetcher, FsFetcher, MemoryFetcher, ScriptHost};
pub use module_system::{
    DeclarationKind, DefineArg, DefinedModule, Definition, Factory, HostModules, ModuleHandle,
    ModuleLoader, ModuleLoaderBuilder, ModuleScope, Require,
};
pub use value::{NativeFunction, Object, Value};

/// Version of the loader
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
