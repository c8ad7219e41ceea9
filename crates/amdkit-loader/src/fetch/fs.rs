// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! File system fetcher

use super::{FetchRequest, Fetcher};
use crate::error::{LoaderError, Result};
use crate::module_system::ModuleScope;
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Evaluates script source inside a module scope.
///
/// The loader has no script engine of its own; an embedder plugs one in
/// here. The evaluated code reaches the loader through `scope.define(..)`.
pub trait ScriptHost: Send + Sync {
    /// Evaluate `source`, fetched for `request`, in `scope`
    fn evaluate(&self, request: &FetchRequest, source: &str, scope: &ModuleScope) -> anyhow::Result<()>;
}

/// A host that cannot run scripts. Data resources and manifests still
/// load.
#[derive(Debug, Default, Clone, Copy)]
pub struct DataOnlyHost;

impl ScriptHost for DataOnlyHost {
    fn evaluate(&self, request: &FetchRequest, _source: &str, _scope: &ModuleScope) -> anyhow::Result<()> {
        anyhow::bail!("cannot evaluate {}: no script host configured", request.url)
    }
}

/// Fetches units from files below a root directory, addressed by URL.
pub struct FsFetcher {
    root: PathBuf,
    host: Arc<dyn ScriptHost>,
}

impl FsFetcher {
    /// Create a fetcher rooted at `root`
    pub fn new(root: impl Into<PathBuf>, host: impl ScriptHost + 'static) -> Self {
        Self {
            root: root.into(),
            host: Arc::new(host),
        }
    }

    /// The root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing a request, if the URL is local
    pub fn file_for(&self, request: &FetchRequest) -> Option<PathBuf> {
        if request.url.contains("://") {
            return None;
        }
        Some(self.root.join(request.url.trim_start_matches('/')))
    }

    async fn read_source(&self, request: &FetchRequest) -> Result<String> {
        let file = self.file_for(request).ok_or_else(|| request.not_found())?;

        match tokio::fs::read_to_string(&file).await {
            Ok(source) => Ok(source),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("No file at {}", file.display());
                Err(request.not_found())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl Fetcher for FsFetcher {
    async fn execute(&self, request: &FetchRequest, scope: ModuleScope) -> Result<()> {
        let source = self.read_source(request).await?;
        self.host
            .evaluate(request, &source, &scope)
            .map_err(|e| LoaderError::factory(&request.name, e))
    }

    async fn read(&self, request: &FetchRequest) -> Result<String> {
        self.read_source(request).await
    }
}
