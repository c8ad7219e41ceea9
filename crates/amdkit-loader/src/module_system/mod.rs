// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! AMD / CommonJS module system
//!
//! ## Declaration
//! - `define([name,] [dependencies,] factory)`
//! - AMD factories return their exports
//! - CommonJS factories fill `exports` / `module.exports`
//! - Mixed factories take `exports` / `module` as positional dependencies
//!
//! ## Loading
//! - `require.load(name)` resolves, fetches and defines asynchronously
//! - one in-flight load per module name
//! - `require(name)` reads the synchronous cache
//! - packages, `.json` data and `resource!plugin` identifiers

mod cache;
mod definition;
mod loader;
mod package;
pub mod path;
mod plugin;
mod require;
mod resolver;
mod scope;
mod sniffer;

pub use cache::{ModuleCache, ModuleRecord, ModuleState};
pub use definition::{DeclarationKind, DefineArg, Definition, Factory};
pub use loader::{DefinedModule, HostModules, ModuleLoader, ModuleLoaderBuilder};
pub use package::{entry_path, manifest_path, PackageManifest};
pub use require::Require;
pub use resolver::{DependencyDescriptor, DependencyKind, IdentifierResolver, ModuleId, Target};
pub use scope::{ModuleHandle, ModuleScope};
pub use sniffer::{DependencySniffer, RegexSniffer};
