// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module path algebra
//!
//! Identifiers are `/`-delimited strings. Nothing here touches the file
//! system; these are pure string operations.

/// Join a relative identifier onto a base path.
///
/// Empty base segments are ignored. Each `.` or `..` segment of
/// `relative` removes one trailing base segment, any other non-empty
/// segment is appended.
///
/// ```
/// use amdkit_loader::module_system::path::join;
///
/// assert_eq!(join("a/b/c", "../d"), "a/b/d");
/// assert_eq!(join("a/b/", "./c"), "a/c");
/// ```
pub fn join(base: &str, relative: &str) -> String {
    let absolute = base.starts_with('/');
    let mut segments: Vec<&str> = base.split('/').filter(|s| !s.is_empty()).collect();

    for part in relative.split('/') {
        match part {
            "" => continue,
            "." | ".." => {
                segments.pop();
            }
            part => segments.push(part),
        }
    }

    let joined = segments.join("/");
    if absolute {
        format!("/{}", joined)
    } else {
        joined
    }
}

/// Check whether an identifier is local (relative or absolute) rather
/// than a bare, package-style name.
pub fn is_local(name: &str) -> bool {
    name.starts_with('.') || name.starts_with('/')
}

/// Check whether an identifier is an absolute path or a URL.
pub fn is_absolute(name: &str) -> bool {
    name.starts_with('/') || name.contains("://")
}

/// Normalize a top-level identifier: `./x` becomes `x`, absolute paths
/// and bare names are returned unchanged.
pub fn normalize(name: &str) -> String {
    if is_absolute(name) || !is_local(name) {
        name.to_string()
    } else {
        join("", name)
    }
}

/// The trailing `.ext` of the last segment, without the dot.
pub fn extension(path: &str) -> Option<&str> {
    let file = path.rsplit('/').next().unwrap_or(path);
    match file.rfind('.') {
        Some(0) | None => None,
        Some(pos) => Some(&file[pos + 1..]),
    }
}

/// Split a package specifier into its package name and optional subpath.
pub fn split_package(specifier: &str) -> (&str, Option<&str>) {
    if let Some(rest) = specifier.strip_prefix('@') {
        // Scoped package: @scope/name or @scope/name/subpath
        if let Some(slash_pos) = rest.find('/') {
            let after_scope = &rest[slash_pos + 1..];
            if let Some(subpath_pos) = after_scope.find('/') {
                let name_end = slash_pos + 2 + subpath_pos;
                return (&specifier[..name_end], Some(&specifier[name_end + 1..]));
            }
        }
        (specifier, None)
    } else if let Some(slash_pos) = specifier.find('/') {
        (&specifier[..slash_pos], Some(&specifier[slash_pos + 1..]))
    } else {
        (specifier, None)
    }
}

/// Build the fetch URL for a resolved module path.
///
/// `base_url` is prefixed unless the path is absolute, and `.js` is
/// appended unless the path already names a `.js` or `.json` resource.
pub fn to_url(base_url: &str, path: &str) -> String {
    let mut url = if is_absolute(path) || base_url.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", base_url.trim_end_matches('/'), path)
    };

    if !url.ends_with(".js") && !url.ends_with(".json") {
        url.push_str(".js");
    }
    url
}
