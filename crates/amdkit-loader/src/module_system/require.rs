// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The `require` function handed to factories and plugins

use crate::error::{LoaderError, Result};
use crate::module_system::definition::Definition;
use crate::module_system::loader::LoaderInner;
use crate::value::{NativeFunction, Value};
use futures::future::{self, BoxFuture, FutureExt};
use std::fmt;
use std::sync::{Arc, Weak};

/// `require` bound to a loader and to the module it was handed to.
///
/// Relative names are resolved against `base`. The handle holds the
/// loader weakly; once the loader is dropped every call fails with
/// [`LoaderError::Detached`].
#[derive(Clone)]
pub struct Require {
    loader: Weak<LoaderInner>,
    base: Option<String>,
}

impl Require {
    pub(crate) fn new(loader: Weak<LoaderInner>, base: Option<String>) -> Self {
        Self { loader, base }
    }

    /// A handle that is not bound to any loader
    pub fn detached() -> Self {
        Self {
            loader: Weak::new(),
            base: None,
        }
    }

    /// Module path relative names are resolved against
    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    /// Whether both handles are bound to the same loader
    pub fn same_loader(&self, other: &Require) -> bool {
        Weak::ptr_eq(&self.loader, &other.loader)
    }

    fn loader(&self) -> Result<Arc<LoaderInner>> {
        self.loader.upgrade().ok_or(LoaderError::Detached)
    }

    /// Synchronous `require(name)`: cached exports only
    pub fn call(&self, name: &str) -> Result<Value> {
        self.loader()?.require_sync(name, self.base())
    }

    /// `require.load(name)`
    pub fn load(&self, name: &str) -> BoxFuture<'static, Result<Value>> {
        match self.loader() {
            Ok(loader) => loader.request(name, self.base()),
            Err(err) => future::ready(Err(err)).boxed(),
        }
    }

    /// `require.config(options)`
    pub fn config(&self, options: serde_json::Value) -> Result<()> {
        self.loader()?.config.write().merge(options)
    }

    /// `require.config(key)`
    pub fn config_value(&self, key: &str) -> Result<Option<serde_json::Value>> {
        Ok(self.loader()?.config.read().get(key))
    }

    /// `require.toUrl(name)`
    pub fn to_url(&self, name: &str) -> Result<String> {
        let loader = self.loader()?;
        let descriptor = loader.describe(name, self.base());
        Ok(loader.url_for(&descriptor.id.path))
    }

    /// Whether `name` is already loaded
    pub fn specified(&self, name: &str) -> bool {
        self.loader()
            .map(|loader| {
                let descriptor = loader.describe(name, self.base());
                loader.cache.lookup(&descriptor.id).is_some()
            })
            .unwrap_or(false)
    }

    /// Register a definition found while executing another unit
    pub(crate) fn define_detached(&self, definition: Definition) {
        match self.loader() {
            Ok(loader) => {
                // Processing is spawned; the outcome is observed through loads.
                let _ = loader.define(definition);
            }
            Err(_) => {
                tracing::warn!(
                    "Dropping definition of {:?}: loader is gone",
                    definition.name
                );
            }
        }
    }

    /// Expose the synchronous form as a native function taking a name
    pub fn as_function(&self) -> NativeFunction {
        let require = self.clone();
        NativeFunction::new("require", move |args| {
            let name = args
                .first()
                .and_then(Value::as_str)
                .ok_or_else(|| anyhow::anyhow!("require expects a module name"))?;
            Ok(require.call(name)?)
        })
    }
}

impl fmt::Debug for Require {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Require")
            .field("base", &self.base)
            .field("attached", &(self.loader.strong_count() > 0))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module_system::ModuleLoader;

    #[tokio::test]
    async fn test_detached_require_fails() {
        let require = Require::detached();

        assert!(matches!(require.call("a"), Err(LoaderError::Detached)));
        assert!(matches!(require.load("a").await, Err(LoaderError::Detached)));
        assert!(!require.specified("a"));
    }

    #[test]
    fn test_handle_outliving_loader() {
        let loader = ModuleLoader::builder().build();
        let require = loader.require_handle();
        drop(loader);

        assert!(matches!(require.to_url("a"), Err(LoaderError::Detached)));
    }

    #[test]
    fn test_config_through_handle() {
        let loader = ModuleLoader::builder().build();
        let require = loader.require_handle();

        require
            .config(serde_json::json!({ "baseUrl": "/static" }))
            .unwrap();

        assert_eq!(
            require.config_value("baseUrl").unwrap(),
            Some(serde_json::json!("/static"))
        );
        assert_eq!(require.to_url("app/main").unwrap(), "/static/app/main.js");
    }

    #[test]
    fn test_as_function() {
        let loader = ModuleLoader::builder()
            .host(|name: &str| Ok(Value::from(format!("host {}", name))))
            .build();
        let require = loader.require_handle().as_function();

        assert_eq!(require.call(&[Value::from("fs")]).unwrap(), Value::from("host fs"));
        assert!(require.call(&[Value::Number(1.0)]).is_err());
    }
}
