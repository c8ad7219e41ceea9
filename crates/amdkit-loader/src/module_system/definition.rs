// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module definitions (`define`)
//!
//! A [`Definition`] is what a module body hands to `define`: an optional
//! name, an optional explicit dependency list and a [`Factory`]. Planning
//! decides the declaration style and the dependency list; invocation runs
//! the factory once every dependency is ready and extracts the exports.

use crate::error::{LoaderError, Result};
use crate::module_system::resolver::DependencyKind;
use crate::module_system::scope::ModuleHandle;
use crate::module_system::sniffer::DependencySniffer;
use crate::module_system::Require;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Declaration style of a module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    /// Explicit dependency array; the factory's return value is the exports
    Amd,
    /// `require`/`exports`/`module` parameters; exports are mutated
    CommonJs,
    /// Explicit array that names `exports` or `module`; exports are mutated
    Mixed,
}

impl DeclarationKind {
    /// Whether the factory's return value becomes the exports
    pub fn honors_return(self) -> bool {
        matches!(self, DeclarationKind::Amd)
    }
}

type FactoryFn = dyn Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync;

/// A module factory.
///
/// `params` is the number of formal parameters the factory declares;
/// `source` is its source text, used to sniff CommonJS-style `require`
/// calls when no dependency list is given.
#[derive(Clone)]
pub struct Factory {
    params: usize,
    source: Option<Arc<str>>,
    body: Arc<FactoryFn>,
}

impl Factory {
    /// Create a factory declaring `params` formal parameters
    pub fn new<F>(params: usize, body: F) -> Self
    where
        F: Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self {
            params,
            source: None,
            body: Arc::new(body),
        }
    }

    /// A factory that returns a fixed value
    pub fn value(value: Value) -> Self {
        Self::new(0, move |_| Ok(value.clone()))
    }

    /// Attach the factory's source text
    pub fn with_source(mut self, source: impl AsRef<str>) -> Self {
        self.source = Some(Arc::from(source.as_ref()));
        self
    }

    /// Number of declared formal parameters
    pub fn params(&self) -> usize {
        self.params
    }

    /// Source text, if known
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Run the factory
    pub fn call(&self, args: &[Value]) -> anyhow::Result<Value> {
        (self.body)(args)
    }
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Factory")
            .field("params", &self.params)
            .field("has_source", &self.source.is_some())
            .finish()
    }
}

/// One argument of a variadic `define([name,] [dependencies,] factory)` call
#[derive(Debug, Clone)]
pub enum DefineArg {
    /// Module name
    Name(String),
    /// Dependency list
    Dependencies(Vec<String>),
    /// Factory
    Factory(Factory),
}

/// A module declaration
#[derive(Debug, Clone)]
pub struct Definition {
    /// Explicit module name (named `define`)
    pub name: Option<String>,
    /// Explicit dependency list; `None` means CommonJS-style sniffing
    pub dependencies: Option<Vec<String>>,
    /// The factory
    pub factory: Factory,
}

impl Definition {
    /// An anonymous definition without an explicit dependency list
    pub fn new(factory: Factory) -> Self {
        Self {
            name: None,
            dependencies: None,
            factory,
        }
    }

    /// Name the definition
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the explicit dependency list
    pub fn deps<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = Some(deps.into_iter().map(Into::into).collect());
        self
    }

    /// Normalize variadic `define` arguments.
    ///
    /// A leading string is the module name and the remaining arguments
    /// shift left; the factory must come last.
    pub fn from_args(args: impl IntoIterator<Item = DefineArg>) -> Result<Self> {
        let mut args = args.into_iter().peekable();

        let name = match args.peek() {
            Some(DefineArg::Name(_)) => match args.next() {
                Some(DefineArg::Name(name)) => Some(name),
                _ => None,
            },
            _ => None,
        };

        let dependencies = match args.peek() {
            Some(DefineArg::Dependencies(_)) => match args.next() {
                Some(DefineArg::Dependencies(deps)) => Some(deps),
                _ => None,
            },
            _ => None,
        };

        let factory = match args.next() {
            Some(DefineArg::Factory(factory)) => factory,
            other => {
                return Err(LoaderError::Config(format!(
                    "define expects a factory after the name and dependencies, got {:?}",
                    other
                )));
            }
        };

        if let Some(extra) = args.next() {
            return Err(LoaderError::Config(format!(
                "unexpected define argument after the factory: {:?}",
                extra
            )));
        }

        Ok(Self {
            name,
            dependencies,
            factory,
        })
    }

    /// Decide the declaration style and the dependency names to load.
    ///
    /// Without an explicit list the factory source is sniffed and the
    /// module is CommonJS-style, unless the factory takes no parameters,
    /// in which case it is a dependency-less AMD factory.
    pub fn plan(&self, sniffer: &dyn DependencySniffer) -> (DeclarationKind, Vec<String>) {
        match &self.dependencies {
            Some(deps) => {
                let mixed = deps
                    .iter()
                    .any(|dep| dep == "exports" || dep == "module");
                let kind = if mixed {
                    DeclarationKind::Mixed
                } else {
                    DeclarationKind::Amd
                };
                (kind, deps.clone())
            }
            None if self.factory.params() == 0 => (DeclarationKind::Amd, Vec::new()),
            None => {
                let deps = self
                    .factory
                    .source()
                    .map(|source| sniffer.dependencies(source))
                    .unwrap_or_default()
                    .into_iter()
                    .filter(|dep| !DependencyKind::of(dep).is_special())
                    .collect();
                (DeclarationKind::CommonJs, deps)
            }
        }
    }
}

/// A dependency value ready to be handed to a factory
#[derive(Debug, Clone)]
pub(crate) enum Resolved {
    /// Exports of a loaded module (or the `require` function)
    Value(Value),
    /// Placeholder for the module's own `exports` object
    Exports,
    /// Placeholder for the module's own `module` handle
    Module,
}

/// Run a factory and extract the module's exports.
///
/// CommonJS factories get `(require, exports, module)`; AMD and mixed
/// factories get their dependencies positionally with the placeholders
/// substituted. Only pure AMD factories have their return value honoured.
pub(crate) fn invoke(
    module_name: &str,
    kind: DeclarationKind,
    factory: &Factory,
    resolved: Vec<Resolved>,
    require: Require,
    module: &ModuleHandle,
) -> Result<Value> {
    let args: Vec<Value> = match kind {
        DeclarationKind::CommonJs => vec![
            Value::Require(require),
            module.exports(),
            Value::Module(module.clone()),
        ],
        DeclarationKind::Amd | DeclarationKind::Mixed => resolved
            .into_iter()
            .map(|dep| match dep {
                Resolved::Value(value) => value,
                Resolved::Exports => module.exports(),
                Resolved::Module => Value::Module(module.clone()),
            })
            .collect(),
    };

    let returned = factory
        .call(&args)
        .map_err(|e| LoaderError::factory(module_name, e))?;

    if kind.honors_return() {
        Ok(returned)
    } else {
        Ok(module.exports())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module_system::resolver::ModuleId;
    use crate::module_system::sniffer::RegexSniffer;

    fn detached_require() -> Require {
        Require::detached()
    }

    #[test]
    fn test_from_args_shifts_name() {
        let def = Definition::from_args(vec![
            DefineArg::Name("pkg".into()),
            DefineArg::Factory(Factory::value(Value::Number(1.0))),
        ])
        .unwrap();

        assert_eq!(def.name.as_deref(), Some("pkg"));
        assert!(def.dependencies.is_none());
    }

    #[test]
    fn test_from_args_requires_factory() {
        let result = Definition::from_args(vec![DefineArg::Dependencies(vec!["a".into()])]);
        assert!(matches!(result, Err(LoaderError::Config(_))));
    }

    #[test]
    fn test_plan_kinds() {
        let amd = Definition::new(Factory::new(1, |_| Ok(Value::Undefined))).deps(["a"]);
        assert_eq!(amd.plan(&RegexSniffer), (DeclarationKind::Amd, vec!["a".to_string()]));

        let mixed = Definition::new(Factory::new(2, |_| Ok(Value::Undefined))).deps(["a", "exports"]);
        assert_eq!(mixed.plan(&RegexSniffer).0, DeclarationKind::Mixed);

        let cjs = Definition::new(
            Factory::new(3, |_| Ok(Value::Undefined))
                .with_source("function (require, exports) { var a = require('./a'); require('module'); }"),
        );
        assert_eq!(
            cjs.plan(&RegexSniffer),
            (DeclarationKind::CommonJs, vec!["./a".to_string()])
        );

        let zero_arg = Definition::new(Factory::new(0, |_| Ok(Value::Undefined)).with_source("require('x')"));
        assert_eq!(zero_arg.plan(&RegexSniffer), (DeclarationKind::Amd, Vec::new()));
    }

    #[test]
    fn test_invoke_ignores_return_value_in_mixed_mode() {
        let module = ModuleHandle::new(ModuleId::new("m"));
        let factory = Factory::new(1, |args| {
            if let Some(Value::Object(exports)) = args.first() {
                exports.set("v", 3);
            }
            Ok(Value::from("ignored"))
        });

        let exports = invoke(
            "m",
            DeclarationKind::Mixed,
            &factory,
            vec![Resolved::Exports],
            detached_require(),
            &module,
        )
        .unwrap();

        assert_eq!(exports.get("v"), Some(Value::Number(3.0)));
    }

    #[test]
    fn test_invoke_wraps_factory_errors() {
        let module = ModuleHandle::new(ModuleId::new("broken"));
        let factory = Factory::new(0, |_| Err(anyhow::anyhow!("factory exploded")));

        let err = invoke("broken", DeclarationKind::Amd, &factory, Vec::new(), detached_require(), &module)
            .unwrap_err();

        assert!(matches!(err, LoaderError::Factory { ref module, .. } if module == "broken"));
        assert_eq!(err.to_string(), "factory exploded");
    }
}
