// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Identifier resolution (aliases, relative names, plugin detection)

use crate::config::LoaderConfig;
use crate::module_system::path;
use std::fmt;

/// A module's logical name plus the physical path it resolves to.
///
/// The two differ only when an alias or package rewrite applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleId {
    /// Logical name (relative segments already joined)
    pub name: String,
    /// Resolved path (after alias rewriting)
    pub path: String,
}

impl ModuleId {
    /// Create an identifier whose name and path are the same
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            path: name.clone(),
            name,
        }
    }

    /// Create an identifier with a distinct path
    pub fn with_path(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name == self.path {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} ({})", self.name, self.path)
        }
    }
}

/// How a dependency is satisfied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyKind {
    /// A module that must be loaded
    Normal,
    /// The `require` function
    SpecialRequire,
    /// A fresh `exports` object
    SpecialExports,
    /// The `module` handle
    SpecialModule,
}

impl DependencyKind {
    /// Returns true for the synthetic injections that are never fetched.
    pub fn is_special(self) -> bool {
        !matches!(self, DependencyKind::Normal)
    }

    /// Classify a requested name
    pub fn of(name: &str) -> Self {
        match name {
            "require" => DependencyKind::SpecialRequire,
            "exports" => DependencyKind::SpecialExports,
            "module" => DependencyKind::SpecialModule,
            _ => DependencyKind::Normal,
        }
    }
}

/// What the scheduler has to do to produce a dependency's exports
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Synthetic injection, never dispatched
    Special,
    /// Fetch and execute a module body
    Script,
    /// Read a `.json` data resource
    Data,
    /// Bare name to look up through a package manifest
    Package {
        /// Package name
        package: String,
        /// Path inside the package, if any
        subpath: Option<String>,
    },
    /// Resource loaded through a plugin module
    Plugin {
        /// Resolved resource path handed to the plugin
        resource: String,
        /// Plugin identifier as requested
        plugin: String,
    },
}

/// A requested dependency after resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyDescriptor {
    /// The name exactly as requested
    pub requested: String,
    /// Resolved identifier
    pub id: ModuleId,
    /// Dependency kind
    pub kind: DependencyKind,
    /// Load strategy
    pub target: Target,
}

/// Applies the alias table and relative-name rules of a configuration.
pub struct IdentifierResolver<'a> {
    config: &'a LoaderConfig,
}

impl<'a> IdentifierResolver<'a> {
    /// Create a resolver over a configuration
    pub fn new(config: &'a LoaderConfig) -> Self {
        Self { config }
    }

    /// Rewrite the longest aliased segment prefix of `name`.
    ///
    /// With `{ foo -> bar/baz }`, `foo/qux` becomes `bar/baz/qux`;
    /// unaliased names are returned unchanged.
    pub fn resolve(&self, name: &str) -> String {
        let segments: Vec<&str> = name.split('/').collect();

        for len in (1..=segments.len()).rev() {
            let prefix = segments[..len].join("/");
            if let Some(target) = self.config.paths.get(&prefix) {
                let rest = &segments[len..];
                return if rest.is_empty() {
                    target.clone()
                } else {
                    format!("{}/{}", target.trim_end_matches('/'), rest.join("/"))
                };
            }
        }

        name.to_string()
    }

    /// Split a plugin-qualified identifier into `(resource, plugin, separator)`.
    ///
    /// `resource!plugin` is always a plugin request. `resource.ext` is one
    /// only when `ext` is itself an alias; otherwise it is an ordinary
    /// extension.
    pub fn plugin_parts<'n>(&self, name: &'n str) -> Option<(&'n str, &'n str, char)> {
        if let Some((resource, plugin)) = name.rsplit_once('!') {
            if !resource.is_empty() && !plugin.is_empty() {
                return Some((resource, plugin, '!'));
            }
        }

        let ext = path::extension(name)?;
        if self.config.paths.contains_key(ext) {
            let resource = &name[..name.len() - ext.len() - 1];
            return Some((resource, ext, '.'));
        }

        None
    }

    /// Resolve a requested name, relative to `base` when it is local.
    pub fn describe(&self, requested: &str, base: Option<&str>) -> DependencyDescriptor {
        let kind = DependencyKind::of(requested);
        if kind.is_special() {
            return DependencyDescriptor {
                requested: requested.to_string(),
                id: ModuleId::new(requested),
                kind,
                target: Target::Special,
            };
        }

        if let Some((resource, plugin, separator)) = self.plugin_parts(requested) {
            let resource_id = self.describe(resource, base).id;
            let name = format!("{}{}{}", resource_id.name, separator, plugin);
            return DependencyDescriptor {
                requested: requested.to_string(),
                id: ModuleId::new(name),
                kind,
                target: Target::Plugin {
                    resource: resource_id.path,
                    plugin: plugin.to_string(),
                },
            };
        }

        // A trailing slash names the directory's index module
        let indexed;
        let request = if requested.ends_with('/') {
            indexed = format!("{}index", requested);
            indexed.as_str()
        } else {
            requested
        };

        let name = match base {
            Some(base) if path::is_local(request) && !path::is_absolute(request) => {
                path::join(base, request)
            }
            _ => path::normalize(request),
        };

        let aliased = self.resolve(&name);
        let was_aliased = aliased != name;
        let resolved_path = if was_aliased {
            path::normalize(&aliased)
        } else {
            name.clone()
        };

        let target = if resolved_path.ends_with(".json") {
            Target::Data
        } else if !was_aliased && !path::is_local(request) {
            let (package, subpath) = path::split_package(&name);
            Target::Package {
                package: package.to_string(),
                subpath: subpath.map(str::to_string),
            }
        } else {
            Target::Script
        };

        DependencyDescriptor {
            requested: requested.to_string(),
            id: ModuleId::with_path(name, resolved_path),
            kind,
            target,
        }
    }

    /// Build the fetch URL for a resolved path
    pub fn to_url(&self, resolved_path: &str) -> String {
        path::to_url(&self.config.base_url, resolved_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(options: serde_json::Value) -> LoaderConfig {
        LoaderConfig::from_json(options).unwrap()
    }

    #[test]
    fn test_alias_resolution() {
        let config = config(json!({ "paths": { "foo": "bar/baz" } }));
        let resolver = IdentifierResolver::new(&config);

        assert_eq!(resolver.resolve("foo/qux"), "bar/baz/qux");
        assert_eq!(resolver.resolve("foo"), "bar/baz");
        assert_eq!(resolver.resolve("other/qux"), "other/qux");
        assert_eq!(resolver.resolve("food"), "food");
    }

    #[test]
    fn test_longest_alias_wins() {
        let config = config(json!({ "paths": { "a": "x", "a/b": "y" } }));
        let resolver = IdentifierResolver::new(&config);

        assert_eq!(resolver.resolve("a/b/c"), "y/c");
        assert_eq!(resolver.resolve("a/c"), "x/c");
    }

    #[test]
    fn test_plugin_detection() {
        let config = config(json!({ "paths": { "html": "./tplPlugin" } }));
        let resolver = IdentifierResolver::new(&config);

        assert_eq!(resolver.plugin_parts("view.html"), Some(("view", "html", '.')));
        assert_eq!(resolver.plugin_parts("view!text"), Some(("view", "text", '!')));
        assert_eq!(resolver.plugin_parts("style.css"), None);
        assert_eq!(resolver.plugin_parts("lib/jquery"), None);
    }

    #[test]
    fn test_describe_relative_dependency() {
        let config = LoaderConfig::default();
        let resolver = IdentifierResolver::new(&config);

        let desc = resolver.describe("./c", Some("a/b"));
        assert_eq!(desc.id, ModuleId::new("a/c"));
        assert_eq!(desc.target, Target::Script);
        assert_eq!(desc.kind, DependencyKind::Normal);
    }

    #[test]
    fn test_describe_special_and_data() {
        let config = LoaderConfig::default();
        let resolver = IdentifierResolver::new(&config);

        assert_eq!(resolver.describe("exports", None).kind, DependencyKind::SpecialExports);
        assert_eq!(resolver.describe("module", None).target, Target::Special);
        assert_eq!(resolver.describe("./config.json", None).target, Target::Data);
        assert_eq!(resolver.describe("./dir/", None).id.path, "dir/index");
    }

    #[test]
    fn test_describe_bare_and_aliased() {
        let config = config(json!({ "paths": { "html": "./tplPlugin", "jq": "vendor/jquery" } }));
        let resolver = IdentifierResolver::new(&config);

        let bare = resolver.describe("lodash/get", None);
        assert_eq!(
            bare.target,
            Target::Package {
                package: "lodash".to_string(),
                subpath: Some("get".to_string())
            }
        );

        let aliased = resolver.describe("jq", None);
        assert_eq!(aliased.id, ModuleId::with_path("jq", "vendor/jquery"));
        assert_eq!(aliased.target, Target::Script);

        let plugin = resolver.describe("view.html", None);
        assert_eq!(plugin.id.name, "view.html");
        assert_eq!(
            plugin.target,
            Target::Plugin {
                resource: "view".to_string(),
                plugin: "html".to_string()
            }
        );
    }
}
