// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Per-unit evaluation scope
//!
//! Every executed unit receives its own [`ModuleScope`]: the `define`
//! entry point bound to the unit's identifier plus a fresh
//! `exports`/`module` pair. Nothing is exchanged through ambient state.

use crate::error::Result;
use crate::module_system::definition::{DefineArg, Definition};
use crate::module_system::require::Require;
use crate::module_system::resolver::ModuleId;
use crate::value::Value;
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The `module` object handed to CommonJS-style code.
///
/// `module.exports` starts as an empty object and may be reassigned until
/// the module is ready; afterwards writes are ignored.
#[derive(Clone)]
pub struct ModuleHandle {
    id: Arc<ModuleId>,
    exports: Arc<RwLock<Value>>,
    sealed: Arc<AtomicBool>,
}

impl ModuleHandle {
    /// Create a handle with a fresh, empty exports object
    pub fn new(id: ModuleId) -> Self {
        Self {
            id: Arc::new(id),
            exports: Arc::new(RwLock::new(Value::object())),
            sealed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The module's identifier
    pub fn id(&self) -> &ModuleId {
        &self.id
    }

    /// Current value of `module.exports`
    pub fn exports(&self) -> Value {
        self.exports.read().clone()
    }

    /// Assign `module.exports`
    pub fn set_exports(&self, value: impl Into<Value>) {
        if self.is_sealed() {
            tracing::warn!("Ignoring module.exports assignment for ready module {}", self.id);
            return;
        }
        *self.exports.write() = value.into();
    }

    /// Whether the owning module has become ready
    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }

    pub(crate) fn seal(&self) {
        self.sealed.store(true, Ordering::Release);
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &ModuleHandle) -> bool {
        Arc::ptr_eq(&self.exports, &other.exports)
    }
}

impl fmt::Debug for ModuleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleHandle")
            .field("id", &self.id)
            .field("sealed", &self.is_sealed())
            .finish()
    }
}

/// Scope handed to the fetcher for one executed unit.
#[derive(Clone)]
pub struct ModuleScope {
    id: ModuleId,
    module: ModuleHandle,
    require: Require,
    definition: Arc<Mutex<Option<Definition>>>,
}

impl ModuleScope {
    pub(crate) fn new(id: ModuleId, require: Require) -> Self {
        Self {
            module: ModuleHandle::new(id.clone()),
            id,
            require,
            definition: Arc::new(Mutex::new(None)),
        }
    }

    /// Identifier of the unit being executed
    pub fn id(&self) -> &ModuleId {
        &self.id
    }

    /// The unit's `module` handle
    pub fn module(&self) -> &ModuleHandle {
        &self.module
    }

    /// The unit's current `module.exports`
    pub fn exports(&self) -> Value {
        self.module.exports()
    }

    /// `require` bound to the unit's path
    pub fn require(&self) -> &Require {
        &self.require
    }

    /// Declare a module from within this unit.
    ///
    /// An anonymous definition, or one named after this unit, belongs to
    /// the unit. A definition naming some other module is registered
    /// under that name on its own.
    pub fn define(&self, definition: Definition) {
        let foreign = definition
            .name
            .as_deref()
            .is_some_and(|name| name != self.id.name && name != self.id.path);

        if foreign {
            tracing::debug!(
                "Unit {} defines {:?}; registering it separately",
                self.id,
                definition.name
            );
            self.require.define_detached(definition);
            return;
        }

        let mut slot = self.definition.lock();
        if slot.is_some() {
            tracing::warn!("Ignoring repeated define() in {}", self.id);
            return;
        }
        *slot = Some(definition);
    }

    /// Declare a module from variadic `define` arguments
    pub fn define_args(&self, args: impl IntoIterator<Item = DefineArg>) -> Result<()> {
        self.define(Definition::from_args(args)?);
        Ok(())
    }

    /// Whether the unit has declared its own module
    pub fn has_definition(&self) -> bool {
        self.definition.lock().is_some()
    }

    pub(crate) fn take_definition(&self) -> Option<Definition> {
        self.definition.lock().take()
    }
}

impl fmt::Debug for ModuleScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleScope")
            .field("id", &self.id)
            .field("defined", &self.has_definition())
            .finish()
    }
}
