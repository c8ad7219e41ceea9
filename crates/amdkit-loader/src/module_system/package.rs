// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Package resolution
//!
//! Bare names that are neither aliased nor cached are looked up through a
//! package manifest at `{packageRoot}/{name}/package.json`. Entries that
//! call `define` load as ordinary modules; legacy scripts get their shim
//! and sniffed dependencies loaded first, in order.

use crate::error::{LoaderError, Result};
use crate::fetch::FetchRequest;
use crate::module_system::loader::LoaderInner;
use crate::module_system::resolver::{DependencyDescriptor, DependencyKind, ModuleId, Target};
use crate::module_system::scope::ModuleScope;
use crate::value::Value;
use serde::Deserialize;
use std::sync::Arc;

/// Parsed `package.json` (only the fields the loader uses)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PackageManifest {
    /// Package name
    #[serde(default)]
    pub name: Option<String>,
    /// Entry file
    #[serde(default)]
    pub main: Option<String>,
    /// Package version
    #[serde(default)]
    pub version: Option<String>,
}

impl PackageManifest {
    /// Parse a manifest belonging to `package`
    pub fn parse(package: &str, text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| LoaderError::manifest(package, e.to_string()))
    }

    /// The entry file named by `main`
    pub fn entry(&self, package: &str) -> Result<&str> {
        match self.main.as_deref().map(str::trim) {
            Some(main) if !main.is_empty() => Ok(main),
            _ => Err(LoaderError::manifest(package, "manifest has no \"main\" field")),
        }
    }
}

/// Path of a package's manifest
pub fn manifest_path(root: &str, package: &str) -> String {
    package_dir(root, package) + "/package.json"
}

/// Module path of an entry file inside a package.
///
/// `./` and a `.js` suffix are stripped; a trailing `/` names `index`.
pub fn entry_path(root: &str, package: &str, entry: &str) -> String {
    let entry = entry.trim_start_matches("./");
    let entry = entry.strip_suffix(".js").unwrap_or(entry);
    let entry = if entry.is_empty() || entry.ends_with('/') {
        format!("{}index", entry)
    } else {
        entry.to_string()
    };

    format!("{}/{}", package_dir(root, package), entry)
}

fn package_dir(root: &str, package: &str) -> String {
    let root = root.trim_end_matches('/');
    if root.is_empty() {
        package.to_string()
    } else {
        format!("{}/{}", root, package)
    }
}

pub(crate) async fn load_package(
    loader: &Arc<LoaderInner>,
    descriptor: &DependencyDescriptor,
    package: &str,
    subpath: Option<&str>,
) -> Result<Value> {
    let root = loader.config.read().package_root.clone();
    let manifest = manifest_path(&root, package);
    let request = FetchRequest {
        name: descriptor.requested.clone(),
        url: loader.url_for(&manifest),
        path: manifest,
    };

    let text = match loader.fetcher.read(&request).await {
        Ok(text) => text,
        Err(err) if err.is_not_found() => {
            tracing::debug!("No manifest for {}, fetching {} directly", package, descriptor.id);
            return loader.fetch_module(descriptor, &descriptor.id.path).await;
        }
        Err(err) => return Err(err),
    };

    let manifest = PackageManifest::parse(package, &text)?;
    let entry = match subpath {
        Some(subpath) => subpath,
        None => manifest.entry(package)?,
    };

    let path = entry_path(&root, package, entry);
    tracing::debug!(
        "Package {} {} enters at {}",
        package,
        manifest.version.as_deref().unwrap_or("(unversioned)"),
        path
    );

    let entry = DependencyDescriptor {
        requested: descriptor.requested.clone(),
        id: ModuleId::with_path(descriptor.id.name.clone(), path.clone()),
        kind: DependencyKind::Normal,
        target: Target::Script,
    };
    let entry_request = loader.request_for(&entry);

    let source = loader.fetcher.read(&entry_request).await?;
    if loader.sniffer.declares_module(&source) {
        return loader.fetch_module(&entry, &path).await;
    }

    let shim = loader.config.read().shim_deps(package).to_vec();
    let mut dependencies: Vec<String> = Vec::new();
    for dep in shim.into_iter().chain(loader.sniffer.dependencies(&source)) {
        if !DependencyKind::of(&dep).is_special() && !dependencies.contains(&dep) {
            dependencies.push(dep);
        }
    }

    // Legacy scripts may rely on load-order side effects
    for dep in &dependencies {
        let dependency = loader.describe(dep, Some(&path));
        tracing::debug!("Loading {} before legacy package {}", dependency.id, package);
        loader.load_as(&descriptor.id.name, &dependency).await?;
    }

    let scope = ModuleScope::new(entry.id.clone(), loader.require_for(Some(path.clone())));
    loader.execute_unit(&entry_request, &scope).await?;

    match scope.take_definition() {
        Some(definition) => loader.process_definition(entry.id, definition, path).await,
        None => {
            scope.module().seal();
            Ok(scope.exports())
        }
    }
}
