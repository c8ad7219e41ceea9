// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Loader configuration (`require.config`).

use crate::error::{LoaderError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default directory searched for package manifests.
pub const DEFAULT_PACKAGE_ROOT: &str = "node_modules";

/// Configuration for a module loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoaderConfig {
    /// Prefix applied to every non-absolute fetch URL
    pub base_url: String,

    /// Alias table (alias -> target prefix)
    pub paths: BTreeMap<String, String>,

    /// Extra dependencies for legacy packages (package -> shim)
    pub shim: BTreeMap<String, Shim>,

    /// Directory holding package directories with their manifests
    pub package_root: String,

    /// Custom config values
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Shim entry for a package that does not declare its own dependencies.
///
/// Accepts either a bare list (`["jquery"]`) or an object
/// (`{ "deps": ["jquery"] }`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Shim {
    /// Plain dependency list
    Deps(Vec<String>),
    /// Object form
    Config {
        /// Dependencies loaded before the package
        #[serde(default)]
        deps: Vec<String>,
    },
}

impl Shim {
    /// Dependencies listed by this shim
    pub fn deps(&self) -> &[String] {
        match self {
            Shim::Deps(deps) => deps,
            Shim::Config { deps } => deps,
        }
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            paths: BTreeMap::new(),
            shim: BTreeMap::new(),
            package_root: DEFAULT_PACKAGE_ROOT.to_string(),
            extra: BTreeMap::new(),
        }
    }
}

impl LoaderConfig {
    /// Parse configuration from a JSON document, starting from defaults.
    pub fn from_json(options: serde_json::Value) -> Result<Self> {
        let mut config = Self::default();
        config.merge(options)?;
        Ok(config)
    }

    /// Merge options into this configuration.
    ///
    /// New keys overwrite; when both the existing and the new value are
    /// objects they are merged key by key instead of replaced.
    pub fn merge(&mut self, options: serde_json::Value) -> Result<()> {
        let serde_json::Value::Object(patch) = options else {
            return Err(LoaderError::Config(format!(
                "expected an object of options, got {}",
                options
            )));
        };

        let mut current = match serde_json::to_value(&*self)? {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };

        for (key, value) in patch {
            if let (serde_json::Value::Object(incoming), Some(serde_json::Value::Object(existing))) =
                (&value, current.get_mut(&key))
            {
                for (inner_key, inner_value) in incoming {
                    existing.insert(inner_key.clone(), inner_value.clone());
                }
                continue;
            }
            current.insert(key, value);
        }

        *self = serde_json::from_value(serde_json::Value::Object(current))
            .map_err(|e| LoaderError::Config(e.to_string()))?;
        Ok(())
    }

    /// Read a single option back.
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        match serde_json::to_value(self).ok()? {
            serde_json::Value::Object(mut map) => map.remove(key),
            _ => None,
        }
    }

    /// Shim dependencies configured for a package
    pub fn shim_deps(&self, package: &str) -> &[String] {
        self.shim.get(package).map(Shim::deps).unwrap_or(&[])
    }
}
