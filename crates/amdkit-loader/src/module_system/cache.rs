// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Synchronous exports cache and module records

use crate::module_system::definition::DeclarationKind;
use crate::module_system::resolver::ModuleId;
use crate::value::Value;
use dashmap::DashMap;

/// Lifecycle of a module record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    /// Requested, nothing dispatched yet
    Pending,
    /// Handed to the fetcher
    Loading,
    /// Definition seen, waiting for dependencies
    Resolving,
    /// Exports available
    Ready,
    /// Load or factory failed
    Failed,
}

/// Bookkeeping for one module
#[derive(Debug, Clone)]
pub struct ModuleRecord {
    /// Module identifier
    pub id: ModuleId,
    /// The module's exports, set once ready
    pub exports: Option<Value>,
    /// Declaration style, known once a definition was processed
    pub kind: Option<DeclarationKind>,
    /// Current state
    pub state: ModuleState,
}

impl ModuleRecord {
    fn new(id: ModuleId) -> Self {
        Self {
            id,
            exports: None,
            kind: None,
            state: ModuleState::Pending,
        }
    }
}

/// Thread-safe module cache
#[derive(Default)]
pub struct ModuleCache {
    /// Ready exports keyed by resolved path and by requested aliases
    exports: DashMap<String, Value>,
    /// Records keyed by module name
    records: DashMap<String, ModuleRecord>,
}

impl ModuleCache {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Get cached exports by key
    pub fn get(&self, key: &str) -> Option<Value> {
        self.exports.get(key).map(|entry| entry.value().clone())
    }

    /// Look up by resolved path first, then by logical name
    pub fn lookup(&self, id: &ModuleId) -> Option<Value> {
        self.get(&id.path).or_else(|| self.get(&id.name))
    }

    /// Check if exports are cached under a key
    pub fn has(&self, key: &str) -> bool {
        self.exports.contains_key(key)
    }

    /// Cache exports under the identifier's path and name.
    ///
    /// Existing entries are kept: cached exports never change.
    pub fn insert(&self, id: &ModuleId, exports: Value) {
        if id.name != id.path {
            self.alias(&id.name, exports.clone());
        }
        self.alias(&id.path, exports);
    }

    /// Make already-cached exports reachable under another key
    pub fn alias(&self, key: &str, exports: Value) {
        self.exports.entry(key.to_string()).or_insert(exports);
    }

    /// Get all cached keys
    pub fn keys(&self) -> Vec<String> {
        self.exports.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Get the number of cached entries
    pub fn len(&self) -> usize {
        self.exports.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.exports.is_empty()
    }

    /// Get a module record by name
    pub fn record(&self, name: &str) -> Option<ModuleRecord> {
        self.records.get(name).map(|entry| entry.value().clone())
    }

    /// Create the record if missing and move it to `state`.
    ///
    /// A ready record is immutable: later transitions are ignored.
    pub fn transition(&self, id: &ModuleId, state: ModuleState) {
        let mut record = self
            .records
            .entry(id.name.clone())
            .or_insert_with(|| ModuleRecord::new(id.clone()));
        if record.state == ModuleState::Ready {
            return;
        }
        record.id = id.clone();
        record.state = state;
        if state != ModuleState::Ready {
            record.exports = None;
        }
    }

    /// Record the declaration style of a module
    pub fn set_kind(&self, id: &ModuleId, kind: DeclarationKind) {
        let mut record = self
            .records
            .entry(id.name.clone())
            .or_insert_with(|| ModuleRecord::new(id.clone()));
        if record.state != ModuleState::Ready {
            record.kind = Some(kind);
        }
    }

    /// Mark a module ready and cache its exports
    pub fn complete(&self, id: &ModuleId, exports: Value) {
        {
            let mut record = self
                .records
                .entry(id.name.clone())
                .or_insert_with(|| ModuleRecord::new(id.clone()));
            if record.state == ModuleState::Ready {
                let existing = record.exports.clone();
                drop(record);
                if let Some(existing) = existing {
                    self.insert(id, existing);
                }
                return;
            }
            record.state = ModuleState::Ready;
            record.exports = Some(exports.clone());
        }
        self.insert(id, exports);
    }
}
