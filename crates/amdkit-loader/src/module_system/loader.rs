// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module loader - schedules fetches and runs definitions

use crate::config::LoaderConfig;
use crate::error::{LoaderError, Result};
use crate::fetch::{FetchRequest, Fetcher, MemoryFetcher};
use crate::module_system::cache::{ModuleCache, ModuleRecord, ModuleState};
use crate::module_system::definition::{self, Definition, Resolved};
use crate::module_system::require::Require;
use crate::module_system::resolver::{
    DependencyDescriptor, DependencyKind, IdentifierResolver, ModuleId, Target,
};
use crate::module_system::scope::{ModuleHandle, ModuleScope};
use crate::module_system::sniffer::{DependencySniffer, RegexSniffer};
use crate::module_system::{package, plugin};
use crate::value::Value;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{self, BoxFuture, FutureExt, Shared};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::Instrument;

type LoadFuture = Shared<BoxFuture<'static, Result<Value>>>;

/// Synchronous module system of the embedding host, consulted for bare
/// names before anything is fetched.
pub trait HostModules: Send + Sync {
    /// Require a module from the host
    fn require(&self, name: &str) -> anyhow::Result<Value>;
}

impl<F> HostModules for F
where
    F: Fn(&str) -> anyhow::Result<Value> + Send + Sync,
{
    fn require(&self, name: &str) -> anyhow::Result<Value> {
        self(name)
    }
}

/// Result of a top-level `define`
#[derive(Debug, Clone, PartialEq)]
pub struct DefinedModule {
    /// Name the module was registered under (generated for anonymous ones)
    pub name: String,
    /// The module's exports
    pub exports: Value,
}

/// Builder for [`ModuleLoader`]
#[derive(Default)]
pub struct ModuleLoaderBuilder {
    config: LoaderConfig,
    fetcher: Option<Arc<dyn Fetcher>>,
    host: Option<Arc<dyn HostModules>>,
    sniffer: Option<Arc<dyn DependencySniffer>>,
}

impl ModuleLoaderBuilder {
    /// Start from a configuration
    pub fn config(mut self, config: LoaderConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the fetch boundary. Defaults to an empty [`MemoryFetcher`].
    pub fn fetcher(mut self, fetcher: impl Fetcher + 'static) -> Self {
        self.fetcher = Some(Arc::new(fetcher));
        self
    }

    /// Set the host module system
    pub fn host(mut self, host: impl HostModules + 'static) -> Self {
        self.host = Some(Arc::new(host));
        self
    }

    /// Replace the dependency sniffer. Defaults to [`RegexSniffer`].
    pub fn sniffer(mut self, sniffer: impl DependencySniffer + 'static) -> Self {
        self.sniffer = Some(Arc::new(sniffer));
        self
    }

    /// Build the loader
    pub fn build(self) -> ModuleLoader {
        let inner = LoaderInner {
            config: RwLock::new(self.config),
            cache: ModuleCache::new(),
            in_flight: DashMap::new(),
            waits_for: Mutex::new(HashMap::new()),
            fetcher: self
                .fetcher
                .unwrap_or_else(|| Arc::new(MemoryFetcher::new())),
            host: self.host,
            sniffer: self.sniffer.unwrap_or_else(|| Arc::new(RegexSniffer)),
            anonymous: AtomicU64::new(0),
        };

        ModuleLoader {
            inner: Arc::new(inner),
        }
    }
}

/// An independent loader context.
///
/// Owns the configuration, the synchronous exports cache and the table of
/// in-flight loads. Cloning is cheap and shares the context; separate
/// loaders share nothing.
#[derive(Clone)]
pub struct ModuleLoader {
    inner: Arc<LoaderInner>,
}

impl ModuleLoader {
    /// Start building a loader
    pub fn builder() -> ModuleLoaderBuilder {
        ModuleLoaderBuilder::default()
    }

    /// Create a loader over a fetcher with the default configuration
    pub fn new(fetcher: impl Fetcher + 'static) -> Self {
        Self::builder().fetcher(fetcher).build()
    }

    /// Declare a module.
    ///
    /// Processing starts immediately on the current Tokio runtime; the
    /// returned future only reports the outcome. Anonymous definitions are
    /// registered under a generated name.
    pub fn define(&self, definition: Definition) -> BoxFuture<'static, Result<DefinedModule>> {
        self.inner.define(definition)
    }

    /// Load a module and everything it depends on.
    ///
    /// Concurrent loads of the same name share one fetch and observe the
    /// same exports.
    pub fn load(&self, name: &str) -> BoxFuture<'static, Result<Value>> {
        let inner = Arc::clone(&self.inner);
        let name = name.to_string();
        async move { inner.request(&name, None).await }.boxed()
    }

    /// Return a module's exports if it is already loaded.
    ///
    /// Never fetches. Falls back to the host module system on a cache miss.
    pub fn require(&self, name: &str) -> Result<Value> {
        self.inner.require_sync(name, None)
    }

    /// Merge options into the configuration
    pub fn config(&self, options: serde_json::Value) -> Result<()> {
        self.inner.config.write().merge(options)
    }

    /// Read a single configuration option back
    pub fn config_value(&self, key: &str) -> Option<serde_json::Value> {
        self.inner.config.read().get(key)
    }

    /// Snapshot of the current configuration
    pub fn configuration(&self) -> LoaderConfig {
        self.inner.config.read().clone()
    }

    /// Resolve a requested name, relative to `base` when it is local
    pub fn resolve(&self, name: &str, base: Option<&str>) -> DependencyDescriptor {
        self.inner.describe(name, base)
    }

    /// Fetch URL for a requested name
    pub fn to_url(&self, name: &str) -> String {
        let descriptor = self.inner.describe(name, None);
        self.inner.url_for(&descriptor.id.path)
    }

    /// Record of a module, by requested name
    pub fn record(&self, name: &str) -> Option<ModuleRecord> {
        let descriptor = self.inner.describe(name, None);
        self.inner.cache.record(&descriptor.id.name)
    }

    /// Whether a module's exports are cached
    pub fn is_loaded(&self, name: &str) -> bool {
        let descriptor = self.inner.describe(name, None);
        self.inner.cache.lookup(&descriptor.id).is_some()
    }

    /// The synchronous exports cache
    pub fn cache(&self) -> &ModuleCache {
        &self.inner.cache
    }

    /// Register ready exports under `name` without fetching anything.
    ///
    /// A module that is already ready keeps its exports.
    pub fn provide(&self, name: &str, exports: impl Into<Value>) -> Value {
        let id = self.inner.describe(name, None).id;
        self.inner.cache.complete(&id, exports.into());
        tracing::debug!("Module {} provided directly", id);
        self.inner.cache.lookup(&id).unwrap_or_default()
    }

    /// A top-level `require` handle bound to this loader
    pub fn require_handle(&self) -> Require {
        self.inner.require_for(None)
    }
}

/// Shared state behind a [`ModuleLoader`]
pub(crate) struct LoaderInner {
    pub(crate) config: RwLock<LoaderConfig>,
    pub(crate) cache: ModuleCache,
    /// In-flight loads keyed by module name
    in_flight: DashMap<String, LoadFuture>,
    /// Waits-for graph: waiter -> dependency -> number of open waits
    waits_for: Mutex<HashMap<String, HashMap<String, usize>>>,
    pub(crate) fetcher: Arc<dyn Fetcher>,
    host: Option<Arc<dyn HostModules>>,
    pub(crate) sniffer: Arc<dyn DependencySniffer>,
    anonymous: AtomicU64,
}

impl LoaderInner {
    pub(crate) fn describe(&self, requested: &str, base: Option<&str>) -> DependencyDescriptor {
        let config = self.config.read();
        IdentifierResolver::new(&config).describe(requested, base)
    }

    pub(crate) fn url_for(&self, path: &str) -> String {
        let config = self.config.read();
        IdentifierResolver::new(&config).to_url(path)
    }

    pub(crate) fn request_for(&self, descriptor: &DependencyDescriptor) -> FetchRequest {
        FetchRequest {
            name: descriptor.requested.clone(),
            path: descriptor.id.path.clone(),
            url: self.url_for(&descriptor.id.path),
        }
    }

    pub(crate) fn require_for(self: &Arc<Self>, base: Option<String>) -> Require {
        Require::new(Arc::downgrade(self), base)
    }

    pub(crate) fn request(
        self: &Arc<Self>,
        requested: &str,
        base: Option<&str>,
    ) -> BoxFuture<'static, Result<Value>> {
        let descriptor = self.describe(requested, base);
        self.load_descriptor(&descriptor)
    }

    /// Load a dependency on behalf of `waiter`, refusing waits that would
    /// close a cycle.
    pub(crate) fn load_as(
        self: &Arc<Self>,
        waiter: &str,
        descriptor: &DependencyDescriptor,
    ) -> BoxFuture<'static, Result<Value>> {
        if let Some(exports) = self.cache.lookup(&descriptor.id) {
            self.cache.alias(&descriptor.id.name, exports.clone());
            return future::ready(Ok(exports)).boxed();
        }

        let edge = match self.enter_wait(waiter, &descriptor.id.name) {
            Ok(edge) => edge,
            Err(err) => return future::ready(Err(err)).boxed(),
        };

        let load = self.load_descriptor(descriptor);
        async move {
            let result = load.await;
            drop(edge);
            result
        }
        .boxed()
    }

    fn load_descriptor(
        self: &Arc<Self>,
        descriptor: &DependencyDescriptor,
    ) -> BoxFuture<'static, Result<Value>> {
        match descriptor.kind {
            DependencyKind::SpecialRequire => {
                return future::ready(Ok(Value::Require(self.require_for(None)))).boxed();
            }
            DependencyKind::SpecialExports | DependencyKind::SpecialModule => {
                return future::ready(Ok(Value::Undefined)).boxed();
            }
            DependencyKind::Normal => {}
        }

        let id = &descriptor.id;

        if let Some(exports) = self.cache.lookup(id) {
            self.cache.alias(&id.name, exports.clone());
            return future::ready(Ok(exports)).boxed();
        }

        if let (Some(host), Target::Package { .. }) = (&self.host, &descriptor.target) {
            match host.require(&descriptor.requested) {
                Ok(exports) => {
                    tracing::debug!("Module {} provided by the host", id);
                    self.cache.complete(id, exports.clone());
                    return future::ready(Ok(exports)).boxed();
                }
                Err(e) => {
                    tracing::debug!("Host does not provide {}: {}", id, e);
                }
            }
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                return future::ready(Err(LoaderError::Config(format!(
                    "loading {} requires a running Tokio runtime",
                    descriptor.requested
                ))))
                .boxed();
            }
        };

        let shared = match self.in_flight.entry(id.name.clone()) {
            Entry::Occupied(entry) => {
                tracing::debug!("Joining in-flight load of {}", id);
                entry.get().clone()
            }
            Entry::Vacant(entry) => {
                self.cache.transition(id, ModuleState::Pending);
                let task = runtime.spawn(Arc::clone(self).dispatch(descriptor.clone()));
                let shared = join_task(id.name.clone(), task).boxed().shared();
                entry.insert(shared.clone());
                shared
            }
        };

        shared.boxed()
    }

    fn dispatch(self: Arc<Self>, descriptor: DependencyDescriptor) -> BoxFuture<'static, Result<Value>> {
        let span = tracing::debug_span!("dispatch", module = %descriptor.id);
        async move {
            self.cache.transition(&descriptor.id, ModuleState::Loading);
            tracing::debug!("Loading {} as {:?}", descriptor.id, descriptor.target);

            let result = match &descriptor.target {
                Target::Script => self.fetch_module(&descriptor, &descriptor.id.path).await,
                Target::Data => self.load_data(&descriptor).await,
                Target::Package { package, subpath } => {
                    package::load_package(&self, &descriptor, package, subpath.as_deref()).await
                }
                Target::Plugin { resource, plugin } => {
                    plugin::load_via_plugin(&self, &descriptor, resource, plugin).await
                }
                Target::Special => Ok(Value::Undefined),
            };

            self.settle(&descriptor.id, result, true)
        }
        .instrument(span)
        .boxed()
    }

    /// Record the outcome of a load. Failures are never cached and release
    /// the in-flight slot so that a later request starts over.
    fn settle(&self, id: &ModuleId, result: Result<Value>, owns_entry: bool) -> Result<Value> {
        match result {
            Ok(exports) => {
                self.cache.complete(id, exports.clone());
                tracing::debug!("Module {} is ready", id);
                Ok(self.cache.lookup(id).unwrap_or(exports))
            }
            Err(err) => {
                if let Some(exports) = self.cache.lookup(id) {
                    tracing::debug!("Module {} was defined elsewhere while loading", id);
                    return Ok(exports);
                }
                self.cache.transition(id, ModuleState::Failed);
                if owns_entry {
                    self.in_flight.remove(&id.name);
                }
                tracing::warn!("Module {} failed: {}", id, err);
                Err(err)
            }
        }
    }

    /// Execute the unit behind `descriptor` and process what it declared.
    pub(crate) async fn fetch_module(
        self: &Arc<Self>,
        descriptor: &DependencyDescriptor,
        base: &str,
    ) -> Result<Value> {
        let request = self.request_for(descriptor);
        let scope = ModuleScope::new(
            descriptor.id.clone(),
            self.require_for(Some(base.to_string())),
        );

        self.execute_unit(&request, &scope).await?;

        match scope.take_definition() {
            Some(definition) => {
                self.process_definition(descriptor.id.clone(), definition, base.to_string())
                    .await
            }
            None => {
                let exports = scope.exports();
                match &exports {
                    Value::Object(object) if object.is_empty() => {
                        Err(LoaderError::NoDefinition(descriptor.requested.clone()))
                    }
                    _ => {
                        scope.module().seal();
                        Ok(exports)
                    }
                }
            }
        }
    }

    pub(crate) async fn execute_unit(&self, request: &FetchRequest, scope: &ModuleScope) -> Result<()> {
        tracing::debug!("Executing {} from {}", request.path, request.url);
        self.fetcher.execute(request, scope.clone()).await
    }

    /// Load a definition's dependencies in parallel, then run its factory.
    ///
    /// Local dependency names are joined against `base`.
    pub(crate) async fn process_definition(
        self: &Arc<Self>,
        id: ModuleId,
        definition: Definition,
        base: String,
    ) -> Result<Value> {
        let (kind, dependencies) = definition.plan(self.sniffer.as_ref());
        self.cache.set_kind(&id, kind);
        self.cache.transition(&id, ModuleState::Resolving);

        let require = self.require_for(Some(base.clone()));
        let module = ModuleHandle::new(id.clone());

        let pending = dependencies.iter().map(|name| {
            let descriptor = self.describe(name, Some(&base));
            match descriptor.kind {
                DependencyKind::SpecialRequire => {
                    future::ready(Ok(Resolved::Value(Value::Require(require.clone())))).boxed()
                }
                DependencyKind::SpecialExports => future::ready(Ok(Resolved::Exports)).boxed(),
                DependencyKind::SpecialModule => future::ready(Ok(Resolved::Module)).boxed(),
                DependencyKind::Normal => self
                    .load_as(&id.name, &descriptor)
                    .map(|result| result.map(Resolved::Value))
                    .boxed(),
            }
        });
        let resolved = future::try_join_all(pending).await?;

        tracing::debug!("Running factory of {} ({:?})", id, kind);
        let exports = definition::invoke(
            &id.name,
            kind,
            &definition.factory,
            resolved,
            require,
            &module,
        )?;
        module.seal();

        Ok(exports)
    }

    /// Read a `.json` resource, merge it into the configuration when it is
    /// an object and expose it as the exports.
    async fn load_data(&self, descriptor: &DependencyDescriptor) -> Result<Value> {
        let request = self.request_for(descriptor);
        let text = self.fetcher.read(&request).await?;
        let json: serde_json::Value = serde_json::from_str(&text)?;

        if json.is_object() {
            self.config.write().merge(json.clone())?;
        }

        Ok(Value::from_json(&json))
    }

    pub(crate) fn define(self: &Arc<Self>, mut definition: Definition) -> BoxFuture<'static, Result<DefinedModule>> {
        let name = match definition.name.clone() {
            Some(name) => name,
            None => {
                let n = self.anonymous.fetch_add(1, Ordering::Relaxed);
                let name = format!("__anonymous_{}__", n);
                definition.name = Some(name.clone());
                name
            }
        };

        let id = self.describe(&name, None).id;

        if let Some(exports) = self.cache.lookup(&id) {
            tracing::warn!("Module {} is already defined; keeping the first definition", id);
            return future::ready(Ok(DefinedModule { name, exports })).boxed();
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                return future::ready(Err(LoaderError::Config(format!(
                    "define({}) requires a running Tokio runtime",
                    name
                ))))
                .boxed();
            }
        };

        let shared = match self.in_flight.entry(id.name.clone()) {
            Entry::Occupied(_) => {
                tracing::debug!("Module {} is also being fetched; processing its definition", id);
                let task = runtime.spawn(Arc::clone(self).run_definition(id.clone(), definition, false));
                join_task(id.name.clone(), task).boxed().shared()
            }
            Entry::Vacant(entry) => {
                let task = runtime.spawn(Arc::clone(self).run_definition(id.clone(), definition, true));
                let shared = join_task(id.name.clone(), task).boxed().shared();
                entry.insert(shared.clone());
                shared
            }
        };

        async move {
            let exports = shared.await?;
            Ok(DefinedModule { name, exports })
        }
        .boxed()
    }

    fn run_definition(
        self: Arc<Self>,
        id: ModuleId,
        definition: Definition,
        owns_entry: bool,
    ) -> BoxFuture<'static, Result<Value>> {
        async move {
            let base = id.path.clone();
            let result = self.process_definition(id.clone(), definition, base).await;
            self.settle(&id, result, owns_entry)
        }
        .boxed()
    }

    pub(crate) fn require_sync(self: &Arc<Self>, name: &str, base: Option<&str>) -> Result<Value> {
        let descriptor = self.describe(name, base);
        match descriptor.kind {
            DependencyKind::SpecialRequire => {
                return Ok(Value::Require(self.require_for(base.map(str::to_string))));
            }
            DependencyKind::SpecialExports | DependencyKind::SpecialModule => {
                return Ok(Value::Undefined);
            }
            DependencyKind::Normal => {}
        }

        if let Some(exports) = self.cache.lookup(&descriptor.id) {
            self.cache.alias(&descriptor.id.name, exports.clone());
            return Ok(exports);
        }

        match &self.host {
            Some(host) => host
                .require(name)
                .map_err(|e| LoaderError::host(name, e)),
            None => Err(LoaderError::not_found(name)),
        }
    }

    /// Register that `waiter` is about to wait on `dependency`.
    fn enter_wait(self: &Arc<Self>, waiter: &str, dependency: &str) -> Result<WaitEdge> {
        let mut graph = self.waits_for.lock();

        if let Some(chain) = find_path(&graph, dependency, waiter) {
            let mut cycle = vec![waiter.to_string()];
            cycle.extend(chain);
            return Err(LoaderError::CircularDependency(cycle.join(" -> ")));
        }

        *graph
            .entry(waiter.to_string())
            .or_default()
            .entry(dependency.to_string())
            .or_insert(0) += 1;

        Ok(WaitEdge {
            loader: Arc::clone(self),
            waiter: waiter.to_string(),
            dependency: dependency.to_string(),
        })
    }

    fn leave_wait(&self, waiter: &str, dependency: &str) {
        let mut graph = self.waits_for.lock();
        let Some(edges) = graph.get_mut(waiter) else {
            return;
        };
        if let Some(count) = edges.get_mut(dependency) {
            *count -= 1;
            if *count == 0 {
                edges.remove(dependency);
            }
        }
        if edges.is_empty() {
            graph.remove(waiter);
        }
    }
}

/// An open wait in the waits-for graph, closed on drop
struct WaitEdge {
    loader: Arc<LoaderInner>,
    waiter: String,
    dependency: String,
}

impl Drop for WaitEdge {
    fn drop(&mut self) {
        self.loader.leave_wait(&self.waiter, &self.dependency);
    }
}

/// Depth-first search for a path `from -> ... -> to`, both ends included.
fn find_path(
    graph: &HashMap<String, HashMap<String, usize>>,
    from: &str,
    to: &str,
) -> Option<Vec<String>> {
    let mut stack = vec![vec![from.to_string()]];
    let mut visited = std::collections::HashSet::new();

    while let Some(chain) = stack.pop() {
        let Some(node) = chain.last() else {
            continue;
        };
        if node == to {
            return Some(chain);
        }
        if !visited.insert(node.clone()) {
            continue;
        }
        if let Some(edges) = graph.get(node) {
            for next in edges.keys() {
                let mut extended = chain.clone();
                extended.push(next.clone());
                stack.push(extended);
            }
        }
    }

    None
}

async fn join_task(name: String, task: tokio::task::JoinHandle<Result<Value>>) -> Result<Value> {
    match task.await {
        Ok(result) => result,
        Err(e) => Err(LoaderError::Aborted(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(&str, &str)]) -> HashMap<String, HashMap<String, usize>> {
        let mut graph: HashMap<String, HashMap<String, usize>> = HashMap::new();
        for (from, to) in edges {
            graph
                .entry(from.to_string())
                .or_default()
                .insert(to.to_string(), 1);
        }
        graph
    }

    #[test]
    fn test_find_path() {
        let g = graph(&[("a", "b"), ("b", "c")]);

        assert_eq!(
            find_path(&g, "a", "c"),
            Some(vec!["a".to_string(), "b".to_string(), "c".to_string()])
        );
        assert_eq!(find_path(&g, "c", "a"), None);
        assert_eq!(find_path(&g, "x", "x"), Some(vec!["x".to_string()]));
    }

    #[test]
    fn test_wait_edges_detect_cycles_and_close_on_drop() {
        let loader = ModuleLoader::builder().build();
        let inner = &loader.inner;

        let edge = inner.enter_wait("a", "b").unwrap();
        let err = inner.enter_wait("b", "a").err().unwrap();
        assert_eq!(err.to_string(), "Circular dependency detected: b -> a -> b");

        drop(edge);
        assert!(inner.enter_wait("b", "a").is_ok());
    }

    #[test]
    fn test_require_misses_without_host() {
        let loader = ModuleLoader::builder().build();
        let err = loader.require("absent").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_require_falls_back_to_host() {
        let loader = ModuleLoader::builder()
            .host(|name: &str| {
                if name == "fs" {
                    Ok(Value::from("host fs"))
                } else {
                    Err(anyhow::anyhow!("no host module {}", name))
                }
            })
            .build();

        assert_eq!(loader.require("fs").unwrap(), Value::from("host fs"));
        assert!(matches!(loader.require("net"), Err(LoaderError::Host { .. })));
    }

    #[test]
    fn test_define_outside_runtime_is_an_error() {
        let loader = ModuleLoader::builder().build();
        let result = futures::executor::block_on(
            loader.define(Definition::new(crate::module_system::Factory::value(Value::Null))),
        );
        assert!(matches!(result, Err(LoaderError::Config(_))));
    }

    #[test]
    fn test_require_provided_module() {
        let loader = ModuleLoader::builder().build();
        let object = crate::value::Object::new();
        object.set("debug", true);
        let settings = Value::Object(object);

        loader.provide("app/settings", settings.clone());

        assert_eq!(loader.require("app/settings").unwrap(), settings);
        assert!(loader.cache().has("app/settings"));
        assert_eq!(loader.cache().keys(), vec!["app/settings".to_string()]);
        assert_eq!(loader.cache().len(), 1);
        assert!(loader.is_loaded("app/settings"));

        // Ready exports never change
        assert_eq!(loader.provide("app/settings", 2), settings);
        assert_eq!(loader.require("app/settings").unwrap(), settings);
    }

    #[test]
    fn test_load_outside_runtime_is_an_error() {
        let loader = ModuleLoader::builder().build();

        let result = futures::executor::block_on(loader.load("./x"));
        assert!(matches!(result, Err(LoaderError::Config(_))));

        let result = futures::executor::block_on(loader.require_handle().load("./x"));
        assert!(matches!(result, Err(LoaderError::Config(_))));
        assert!(!loader.inner.in_flight.contains_key("x"));
    }

    #[test]
    fn test_resolve_relative_to_base() {
        let loader = ModuleLoader::builder().build();

        let descriptor = loader.resolve("./b", Some("pkg/a"));
        assert_eq!(descriptor.id.name, "pkg/b");
        assert_eq!(descriptor.requested, "./b");
    }
}
