//! Loader integration tests: definitions, scheduling and caching

use amdkit_loader::module_system::ModuleState;
use amdkit_loader::{
    DeclarationKind, Definition, Factory, LoaderError, MemoryFetcher, ModuleLoader, Object, Value,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn object(entries: &[(&str, Value)]) -> Value {
    let object = Object::new();
    for (key, value) in entries {
        object.set(*key, value.clone());
    }
    Value::Object(object)
}

fn logging(log: &Arc<Mutex<Vec<String>>>, name: &str) -> Factory {
    let log = Arc::clone(log);
    let name = name.to_string();
    Factory::new(0, move |_| {
        log.lock().unwrap().push(name.clone());
        Ok(Value::from(name.as_str()))
    })
}

#[tokio::test]
async fn test_named_module() {
    let loader = ModuleLoader::new(MemoryFetcher::new());

    let defined = loader
        .define(
            Definition::new(Factory::value(object(&[("v", Value::from(1))])))
                .named("pkg")
                .deps(Vec::<String>::new()),
        )
        .await
        .unwrap();
    assert_eq!(defined.name, "pkg");

    let exports = loader.load("pkg").await.unwrap();
    assert_eq!(exports.get("v"), Some(Value::Number(1.0)));
    assert_eq!(exports, defined.exports);

    let record = loader.record("pkg").unwrap();
    assert_eq!(record.state, ModuleState::Ready);
    assert_eq!(record.kind, Some(DeclarationKind::Amd));
}

#[tokio::test]
async fn test_commonjs_through_module_dependency() {
    let loader = ModuleLoader::new(MemoryFetcher::new());

    let defined = loader
        .define(
            Definition::new(Factory::new(1, |args| {
                if let Some(Value::Module(module)) = args.first() {
                    module.set_exports(object(&[("v", Value::from(2))]));
                }
                Ok(Value::from("ignored"))
            }))
            .named("cjs")
            .deps(["module"]),
        )
        .await
        .unwrap();

    assert_eq!(defined.exports.get("v"), Some(Value::Number(2.0)));
    assert_eq!(loader.load("cjs").await.unwrap(), defined.exports);
    assert_eq!(loader.record("cjs").unwrap().kind, Some(DeclarationKind::Mixed));
}

#[tokio::test]
async fn test_sniffed_commonjs_dependencies_load_first() {
    let fetcher = MemoryFetcher::new();
    fetcher.module("cjs/dep", Definition::new(Factory::value(Value::from("dep"))));

    let loader = ModuleLoader::new(fetcher);
    let factory = Factory::new(3, |args| {
        let dep = match args.first() {
            Some(Value::Require(require)) => require.call("./dep")?,
            _ => anyhow::bail!("require was not injected"),
        };
        if let Some(Value::Object(exports)) = args.get(1) {
            exports.set("dep", dep);
        }
        Ok(Value::from("ignored"))
    })
    .with_source("function (require, exports, module) { exports.dep = require('./dep'); }");

    let defined = loader
        .define(Definition::new(factory).named("cjs/main"))
        .await
        .unwrap();

    assert_eq!(defined.exports.get("dep"), Some(Value::from("dep")));
    assert_eq!(
        loader.record("cjs/main").unwrap().kind,
        Some(DeclarationKind::CommonJs)
    );
}

#[tokio::test]
async fn test_missing_module() {
    let loader = ModuleLoader::new(MemoryFetcher::new());

    let err = loader.load("./absent").await.unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "Module: ./absent failed to load");
    assert_eq!(loader.record("./absent").unwrap().state, ModuleState::Failed);
    assert!(!loader.is_loaded("./absent"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_loads_share_one_fetch() {
    let fetcher = MemoryFetcher::new();
    fetcher.module("shared", Definition::new(Factory::new(0, |_| Ok(Value::object()))));

    let loader = ModuleLoader::new(fetcher.clone());
    let (first, second) = tokio::join!(loader.load("./shared"), loader.load("./shared"));

    let first = first.unwrap();
    assert_eq!(first, second.unwrap());
    assert_eq!(fetcher.executions("shared"), 1);

    let third = loader.load("./shared").await.unwrap();
    assert_eq!(first, third);
    assert_eq!(fetcher.executions("shared"), 1);
}

#[tokio::test]
async fn test_factory_runs_after_dependencies() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let fetcher = MemoryFetcher::new();

    fetcher.module("app/a", Definition::new(logging(&log, "a")));
    {
        let log = Arc::clone(&log);
        fetcher.module(
            "app/b",
            Definition::new(Factory::new(1, move |args| {
                assert_eq!(args.first(), Some(&Value::from("a")));
                log.lock().unwrap().push("b".to_string());
                Ok(Value::from("b"))
            }))
            .deps(["./a"]),
        );
    }
    {
        let log = Arc::clone(&log);
        fetcher.module(
            "app/main",
            Definition::new(Factory::new(2, move |args| {
                log.lock().unwrap().push("main".to_string());
                Ok(Value::Array(args.to_vec()))
            }))
            .deps(["./b", "./a"]),
        );
    }

    let loader = ModuleLoader::new(fetcher.clone());
    let exports = loader.load("./app/main").await.unwrap();

    assert_eq!(
        exports,
        Value::Array(vec![Value::from("b"), Value::from("a")])
    );
    assert_eq!(*log.lock().unwrap(), vec!["a", "b", "main"]);
    assert_eq!(fetcher.executions("app/a"), 1);
}

#[tokio::test]
async fn test_ready_exports_never_change() {
    let fetcher = MemoryFetcher::new();
    fetcher.module("stable", Definition::new(Factory::new(0, |_| Ok(Value::object()))));

    let loader = ModuleLoader::new(fetcher.clone());
    let first = loader.load("./stable").await.unwrap();

    let redefined = loader
        .define(Definition::new(Factory::value(Value::from("replacement"))).named("stable"))
        .await
        .unwrap();
    assert_eq!(redefined.exports, first);

    for _ in 0..3 {
        assert_eq!(loader.require("stable").unwrap(), first);
    }
    assert_eq!(fetcher.executions("stable"), 1);
}

#[tokio::test]
async fn test_circular_dependency_fails() {
    let fetcher = MemoryFetcher::new();
    fetcher.module(
        "cyc/a",
        Definition::new(Factory::new(1, |_| Ok(Value::Null))).deps(["./b"]),
    );
    fetcher.module(
        "cyc/b",
        Definition::new(Factory::new(1, |_| Ok(Value::Null))).deps(["./a"]),
    );

    let loader = ModuleLoader::new(fetcher);
    let err = loader.load("./cyc/a").await.unwrap_err();

    assert!(matches!(err, LoaderError::CircularDependency(_)));
    assert!(!loader.is_loaded("cyc/a"));
    assert!(!loader.is_loaded("cyc/b"));
}

#[tokio::test]
async fn test_failed_module_is_not_cached() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let fetcher = MemoryFetcher::new();
    {
        let attempts = Arc::clone(&attempts);
        fetcher.module(
            "flaky",
            Definition::new(Factory::new(0, move |_| {
                if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                    anyhow::bail!("first attempt fails");
                }
                Ok(Value::from("recovered"))
            })),
        );
    }

    let loader = ModuleLoader::new(fetcher.clone());

    let err = loader.load("./flaky").await.unwrap_err();
    assert!(matches!(err, LoaderError::Factory { ref module, .. } if module == "flaky"));
    assert_eq!(err.to_string(), "first attempt fails");
    assert!(loader.require("flaky").is_err());

    assert_eq!(loader.load("./flaky").await.unwrap(), Value::from("recovered"));
    assert_eq!(fetcher.executions("flaky"), 2);
}

#[tokio::test]
async fn test_dependency_failure_propagates_original_error() {
    let fetcher = MemoryFetcher::new();
    fetcher.module(
        "top",
        Definition::new(Factory::new(1, |_| Ok(Value::Null))).deps(["./missing"]),
    );

    let loader = ModuleLoader::new(fetcher);
    let err = loader.load("./top").await.unwrap_err();

    assert_eq!(err.to_string(), "Module: ./missing failed to load");
    assert_eq!(loader.record("./top").unwrap().state, ModuleState::Failed);
}

#[tokio::test]
async fn test_dependency_failure_reaches_every_dependent() {
    let fetcher = MemoryFetcher::new();
    fetcher.script("bad", |_| Err(anyhow::anyhow!("bad factory")));
    for name in ["a", "b"] {
        fetcher.module(
            name,
            Definition::new(Factory::new(1, |args| Ok(args[0].clone()))).deps(["./bad"]),
        );
    }

    let loader = ModuleLoader::new(fetcher.clone());
    let (a, b) = tokio::join!(loader.load("./a"), loader.load("./b"));

    assert_eq!(a.unwrap_err().to_string(), "bad factory");
    assert_eq!(b.unwrap_err().to_string(), "bad factory");
    assert_eq!(fetcher.executions("bad"), 1);
}

#[tokio::test]
async fn test_anonymous_define() {
    let loader = ModuleLoader::new(MemoryFetcher::new());

    let defined = loader
        .define(Definition::new(Factory::value(Value::from(7))))
        .await
        .unwrap();

    assert!(defined.name.starts_with("__anonymous_"));
    assert_eq!(loader.require(&defined.name).unwrap(), Value::from(7));
}

#[tokio::test]
async fn test_unit_registers_other_named_modules() {
    let fetcher = MemoryFetcher::new();
    fetcher.script("bundle", |scope| {
        scope.define(Definition::new(Factory::value(Value::from("extra"))).named("extra"));
        scope.define(Definition::new(Factory::value(Value::from("bundle"))));
        Ok(())
    });

    let loader = ModuleLoader::new(fetcher);

    assert_eq!(loader.load("./bundle").await.unwrap(), Value::from("bundle"));
    assert_eq!(loader.load("extra").await.unwrap(), Value::from("extra"));
}

#[tokio::test]
async fn test_unit_without_definition() {
    let fetcher = MemoryFetcher::new();
    fetcher.script("silent", |_| Ok(()));
    fetcher.script("assigns", |scope| {
        scope.module().set_exports(Value::from("assigned"));
        Ok(())
    });

    let loader = ModuleLoader::new(fetcher);

    assert!(matches!(
        loader.load("./silent").await,
        Err(LoaderError::NoDefinition(_))
    ));
    assert_eq!(loader.load("./assigns").await.unwrap(), Value::from("assigned"));
}

#[tokio::test]
async fn test_aliased_paths() {
    let fetcher = MemoryFetcher::new();
    fetcher.module("vendor/jquery/dist/jquery", Definition::new(Factory::value(Value::from("$"))));

    let loader = ModuleLoader::new(fetcher);
    loader
        .config(serde_json::json!({ "paths": { "jquery": "vendor/jquery/dist/jquery" } }))
        .unwrap();

    assert_eq!(loader.load("jquery").await.unwrap(), Value::from("$"));
    assert_eq!(loader.require("jquery").unwrap(), Value::from("$"));
    assert_eq!(loader.to_url("jquery"), "vendor/jquery/dist/jquery.js");
}

#[tokio::test]
async fn test_relative_dependencies_of_aliased_module() {
    let fetcher = MemoryFetcher::new();
    fetcher.module(
        "vendor/lib/main",
        Definition::new(Factory::new(1, |args| Ok(args[0].clone()))).deps(["./helper"]),
    );
    fetcher.module("vendor/lib/helper", Definition::new(Factory::value(Value::from("helper"))));

    let loader = ModuleLoader::new(fetcher);
    loader
        .config(serde_json::json!({ "paths": { "lib": "vendor/lib/main" } }))
        .unwrap();

    assert_eq!(loader.load("lib").await.unwrap(), Value::from("helper"));
    assert!(loader.is_loaded("vendor/lib/helper"));
}

#[tokio::test]
async fn test_host_modules_come_first() {
    let fetcher = MemoryFetcher::new();
    fetcher.module("util", Definition::new(Factory::value(Value::from("fetched util"))));

    let loader = ModuleLoader::builder()
        .fetcher(fetcher)
        .host(|name: &str| match name {
            "events" => Ok(Value::from("host events")),
            _ => Err(anyhow::anyhow!("unknown host module {}", name)),
        })
        .build();

    assert_eq!(loader.load("events").await.unwrap(), Value::from("host events"));
    assert_eq!(loader.load("util").await.unwrap(), Value::from("fetched util"));
    assert_eq!(loader.require("events").unwrap(), Value::from("host events"));
}

#[tokio::test]
async fn test_separate_loaders_share_nothing() {
    let fetcher = MemoryFetcher::new();
    fetcher.module("m", Definition::new(Factory::new(0, |_| Ok(Value::object()))));

    let first = ModuleLoader::new(fetcher.clone());
    let second = ModuleLoader::new(fetcher.clone());

    let a = first.load("./m").await.unwrap();
    let b = second.load("./m").await.unwrap();

    assert_ne!(a, b);
    assert_eq!(fetcher.executions("m"), 2);
}
