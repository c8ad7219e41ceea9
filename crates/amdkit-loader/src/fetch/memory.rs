// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! In-process fetcher backed by registered closures and text

use super::{FetchRequest, Fetcher};
use crate::error::{LoaderError, Result};
use crate::module_system::{Definition, ModuleScope};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

type ScriptBody = dyn Fn(&ModuleScope) -> anyhow::Result<()> + Send + Sync;

#[derive(Clone)]
enum Resource {
    Script {
        body: Arc<ScriptBody>,
        source: Option<String>,
    },
    Text(String),
}

/// A fetcher that serves units registered in memory, keyed by resolved
/// module path (`a/b`, `node_modules/pkg/package.json`).
///
/// Cloning shares the registry.
#[derive(Clone, Default)]
pub struct MemoryFetcher {
    resources: Arc<DashMap<String, Resource>>,
    executions: Arc<DashMap<String, usize>>,
}

impl MemoryFetcher {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a unit body
    pub fn script<F>(&self, path: impl Into<String>, body: F) -> &Self
    where
        F: Fn(&ModuleScope) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.resources.insert(
            path.into(),
            Resource::Script {
                body: Arc::new(body),
                source: None,
            },
        );
        self
    }

    /// Register a unit body together with its source text, so that the
    /// source can be read for dependency sniffing
    pub fn script_with_source<F>(
        &self,
        path: impl Into<String>,
        source: impl Into<String>,
        body: F,
    ) -> &Self
    where
        F: Fn(&ModuleScope) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.resources.insert(
            path.into(),
            Resource::Script {
                body: Arc::new(body),
                source: Some(source.into()),
            },
        );
        self
    }

    /// Register a unit whose body only calls `define(definition)`.
    ///
    /// Its readable source is a `define(...)` call, so the unit is
    /// recognized as a module when it is a package entry.
    pub fn module(&self, path: impl Into<String>, definition: Definition) -> &Self {
        let source = match definition.factory.source() {
            Some(source) => format!("define({})", source),
            None => "define(function () {})".to_string(),
        };
        self.script_with_source(path, source, move |scope: &ModuleScope| {
            scope.define(definition.clone());
            Ok(())
        })
    }

    /// Register a text resource (manifest, JSON data, ...)
    pub fn text(&self, path: impl Into<String>, text: impl Into<String>) -> &Self {
        self.resources.insert(path.into(), Resource::Text(text.into()));
        self
    }

    /// Unregister a path
    pub fn remove(&self, path: &str) {
        self.resources.remove(path);
    }

    /// How many times the unit at `path` was executed
    pub fn executions(&self, path: &str) -> usize {
        self.executions.get(path).map(|count| *count).unwrap_or(0)
    }

    fn lookup(&self, request: &FetchRequest) -> Result<Resource> {
        self.resources
            .get(&request.path)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| request.not_found())
    }
}

#[async_trait]
impl Fetcher for MemoryFetcher {
    async fn execute(&self, request: &FetchRequest, scope: ModuleScope) -> Result<()> {
        // Settle on a later turn, like a real transport would
        tokio::task::yield_now().await;

        let body = match self.lookup(request)? {
            Resource::Script { body, .. } => body,
            Resource::Text(_) => {
                return Err(LoaderError::not_found(&request.name));
            }
        };

        *self.executions.entry(request.path.clone()).or_insert(0) += 1;
        tracing::debug!("Executing in-memory unit {}", request.path);

        body(&scope).map_err(|e| LoaderError::factory(&request.name, e))
    }

    async fn read(&self, request: &FetchRequest) -> Result<String> {
        tokio::task::yield_now().await;

        match self.lookup(request)? {
            Resource::Text(text) => Ok(text),
            Resource::Script {
                source: Some(source),
                ..
            } => Ok(source),
            Resource::Script { source: None, .. } => Err(request.not_found()),
        }
    }
}
