// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Loading resources through plugin modules

use crate::error::{LoaderError, Result};
use crate::module_system::loader::LoaderInner;
use crate::module_system::resolver::DependencyDescriptor;
use crate::value::{NativeFunction, Value};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Load `resource` through the plugin module `plugin`.
///
/// The plugin is an ordinary module whose exports provide
/// `load(resource, require, onLoad, config)`. The first `onLoad(value)`
/// call settles the load.
pub(crate) async fn load_via_plugin(
    loader: &Arc<LoaderInner>,
    descriptor: &DependencyDescriptor,
    resource: &str,
    plugin: &str,
) -> Result<Value> {
    let plugin_descriptor = loader.describe(plugin, None);
    let exports = loader.load_as(&descriptor.id.name, &plugin_descriptor).await?;

    let load = match &exports {
        Value::Function(load) => load.clone(),
        other => other
            .get("load")
            .and_then(|load| load.as_function().cloned())
            .ok_or_else(|| {
                LoaderError::plugin(
                    plugin,
                    resource,
                    format!("plugin exports {} without load()", other.type_of()),
                )
            })?,
    };

    let (done, settled) = oneshot::channel();
    let on_load = on_load(descriptor.id.name.clone(), done);

    let config = serde_json::to_value(&*loader.config.read())?;
    let require = loader.require_for(Some(descriptor.id.name.clone()));

    tracing::debug!("Handing {} to plugin {}", resource, plugin_descriptor.id);
    load.call(&[
        Value::from(resource),
        Value::Require(require),
        Value::Function(on_load),
        Value::from_json(&config),
    ])
    .map_err(|e| LoaderError::plugin(plugin, resource, e.to_string()))?;

    settled
        .await
        .map_err(|_| LoaderError::plugin(plugin, resource, "onLoad was never called"))
}

fn on_load(name: String, done: oneshot::Sender<Value>) -> NativeFunction {
    let slot = Mutex::new(Some(done));
    NativeFunction::new("onLoad", move |args| {
        let value = args.first().cloned().unwrap_or_default();
        match slot.lock().take() {
            Some(done) => {
                // The requester may already be gone
                let _ = done.send(value);
            }
            None => tracing::warn!("Ignoring repeated onLoad for {}", name),
        }
        Ok(Value::Undefined)
    })
}
