// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Fetch boundary
//!
//! The loader never knows how module source reaches it. A [`Fetcher`]
//! executes the unit behind a resolved path (which calls `define` on the
//! scope it is given) and reads raw text for manifests, data resources
//! and dependency sniffing.

mod fs;
mod memory;

pub use fs::{DataOnlyHost, FsFetcher, ScriptHost};
pub use memory::MemoryFetcher;

use crate::error::{LoaderError, Result};
use crate::module_system::ModuleScope;
use async_trait::async_trait;

/// What to fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Identifier as requested, used in error messages
    pub name: String,
    /// Resolved module path
    pub path: String,
    /// URL built from the path and `baseUrl`
    pub url: String,
}

impl FetchRequest {
    /// The error to report when nothing exists behind this request
    pub fn not_found(&self) -> LoaderError {
        LoaderError::not_found(&self.name)
    }
}

/// Environment-specific transport for module bodies and text resources.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Execute the unit behind `request`. The unit declares itself through
    /// `scope.define(..)` or fills `scope.module()` directly.
    ///
    /// Returns [`LoaderError::NotFound`] when no such unit exists.
    async fn execute(&self, request: &FetchRequest, scope: ModuleScope) -> Result<()>;

    /// Read the raw text behind `request` without executing it.
    ///
    /// Returns [`LoaderError::NotFound`] when no such resource exists.
    async fn read(&self, request: &FetchRequest) -> Result<String>;
}
