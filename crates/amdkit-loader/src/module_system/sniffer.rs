// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Static dependency sniffing
//!
//! CommonJS-style factories and legacy scripts do not list their
//! dependencies; they are recovered from source text. This is a heuristic:
//! names built at runtime, a `require` bound under another name, or calls
//! inside comments and strings are not understood. Embedders that need
//! more can install their own [`DependencySniffer`].

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static REQUIRE_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\brequire\s*\(\s*(?:"([^"\\]+)"|'([^'\\]+)')\s*\)"#)
        .expect("require pattern is valid")
});

static DEFINE_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bdefine\s*\(").expect("define pattern is valid"));

/// Strategy for discovering dependencies in source text.
pub trait DependencySniffer: Send + Sync {
    /// Literal dependency names, in source order, without duplicates.
    fn dependencies(&self, source: &str) -> Vec<String>;

    /// Whether the source declares itself through `define(...)`.
    fn declares_module(&self, source: &str) -> bool;
}

/// Default sniffer: matches `require("x")` / `require('x')` calls.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegexSniffer;

impl DependencySniffer for RegexSniffer {
    fn dependencies(&self, source: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        REQUIRE_CALL
            .captures_iter(source)
            .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
            .map(|m| m.as_str().to_string())
            .filter(|name| seen.insert(name.clone()))
            .collect()
    }

    fn declares_module(&self, source: &str) -> bool {
        DEFINE_CALL.is_match(source)
    }
}
