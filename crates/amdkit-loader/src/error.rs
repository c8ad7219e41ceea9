// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for the module loader

use std::sync::Arc;
use thiserror::Error;

/// Result type for loader operations
pub type Result<T> = std::result::Result<T, LoaderError>;

/// Shared handle to a foreign error (factory, host or plugin failure)
pub type SharedError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while resolving, fetching or defining modules.
///
/// A settled load is observed by every requester of the same identifier,
/// so the error is cheaply cloneable: foreign errors are kept behind an
/// [`Arc`].
#[derive(Debug, Clone, Error)]
pub enum LoaderError {
    /// The fetch boundary could not locate or execute the identifier
    #[error("Module: {0} failed to load")]
    NotFound(String),

    /// The fetched unit executed but never declared a module
    #[error("Module: {0} failed to load: no module definition")]
    NoDefinition(String),

    /// The module's own factory failed; displays the original error
    #[error("{source}")]
    Factory {
        /// Module whose factory failed
        module: String,
        /// Error raised by the factory
        source: SharedError,
    },

    /// A package manifest has no usable entry field
    #[error("Package '{package}' has no usable entry point: {reason}")]
    Manifest {
        /// Package name
        package: String,
        /// Reason for failure
        reason: String,
    },

    /// A module (transitively) waits on itself
    #[error("Circular dependency detected: {0}")]
    CircularDependency(String),

    /// A plugin did not honour its load contract
    #[error("Plugin '{plugin}' failed to load '{resource}': {reason}")]
    Plugin {
        /// Plugin identifier
        plugin: String,
        /// Resource requested through the plugin
        resource: String,
        /// Reason for failure
        reason: String,
    },

    /// Invalid configuration options
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    Json(Arc<serde_json::Error>),

    /// File system error
    #[error("File system error: {0}")]
    Io(Arc<std::io::Error>),

    /// The host module system rejected a synchronous require
    #[error("Host module '{module}' could not be required: {source}")]
    Host {
        /// Module name
        module: String,
        /// Error raised by the host
        source: SharedError,
    },

    /// A require handle outlived the loader that created it
    #[error("Module loader has been dropped")]
    Detached,

    /// A load task stopped before settling
    #[error("Load of '{0}' was aborted")]
    Aborted(String),
}

impl LoaderError {
    /// Create a module not found error
    pub fn not_found(module: impl Into<String>) -> Self {
        Self::NotFound(module.into())
    }

    /// Wrap an error raised by a module factory
    pub fn factory(module: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Factory {
            module: module.into(),
            source: share(source),
        }
    }

    /// Wrap an error raised by the host module system
    pub fn host(module: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Host {
            module: module.into(),
            source: share(source),
        }
    }

    /// Create a manifest error for a package
    pub fn manifest(package: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Manifest {
            package: package.into(),
            reason: reason.into(),
        }
    }

    /// Create a plugin contract error
    pub fn plugin(
        plugin: impl Into<String>,
        resource: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Plugin {
            plugin: plugin.into(),
            resource: resource.into(),
            reason: reason.into(),
        }
    }

    /// Returns true for errors raised because an identifier does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

fn share(err: anyhow::Error) -> SharedError {
    Arc::from(Box::<dyn std::error::Error + Send + Sync>::from(err))
}

impl From<serde_json::Error> for LoaderError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(Arc::new(err))
    }
}

impl From<std::io::Error> for LoaderError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}
