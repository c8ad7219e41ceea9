// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! amdkit CLI - inspect module identifiers and dependency declarations

use amdkit_loader::module_system::{DependencySniffer, IdentifierResolver, RegexSniffer, Target};
use amdkit_loader::{DataOnlyHost, FsFetcher, LoaderConfig, ModuleLoader, VERSION};
use anyhow::Context;
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "amdkit",
    about = "Inspect AMD/CommonJS module identifiers and dependency declarations",
    version = VERSION,
    author = "Pegasus Heavy Industries"
)]
struct Cli {
    /// Enable verbose logging
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show how an identifier resolves
    Resolve {
        /// Identifier as it would be requested
        id: String,

        /// Module the request is made from
        #[arg(long)]
        from: Option<String>,

        /// Loader configuration (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List the dependencies a script declares
    Scan {
        /// Script to scan
        file: PathBuf,

        /// Module name of the script, for resolving relative dependencies
        #[arg(long)]
        name: Option<String>,

        /// Loader configuration (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Load a data resource or package manifest entry below a directory
    Load {
        /// Identifier to load
        id: String,

        /// Directory modules are fetched from
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// Loader configuration (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("amdkit=debug,amdkit_loader=debug")
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("amdkit_loader=warn")
            .init();
    }

    match cli.command {
        Command::Resolve { id, from, config } => {
            let config = read_config(config.as_deref()).await?;
            resolve(&config, &id, from.as_deref());
        }
        Command::Scan { file, name, config } => {
            let config = read_config(config.as_deref()).await?;
            scan(&config, &file, name.as_deref()).await?;
        }
        Command::Load { id, root, config } => {
            let config = read_config(config.as_deref()).await?;
            load(config, &root, &id).await?;
        }
    }

    Ok(())
}

async fn read_config(path: Option<&Path>) -> anyhow::Result<LoaderConfig> {
    let Some(path) = path else {
        return Ok(LoaderConfig::default());
    };

    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let options: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;

    Ok(LoaderConfig::from_json(options)?)
}

fn resolve(config: &LoaderConfig, id: &str, from: Option<&str>) {
    let resolver = IdentifierResolver::new(config);
    let descriptor = resolver.describe(id, from);

    println!("{:10} {}", "requested".white().bold(), descriptor.requested);
    println!("{:10} {}", "name".white().bold(), descriptor.id.name.green());
    println!("{:10} {}", "path".white().bold(), descriptor.id.path.cyan());

    let target = match &descriptor.target {
        Target::Special => "special injection".to_string(),
        Target::Script => "script".to_string(),
        Target::Data => "data resource".to_string(),
        Target::Package { package, subpath } => match subpath {
            Some(subpath) => format!("package {} ({})", package, subpath),
            None => format!("package {}", package),
        },
        Target::Plugin { resource, plugin } => format!("{} through plugin {}", resource, plugin),
    };
    println!("{:10} {}", "target".white().bold(), target.yellow());

    if descriptor.target != Target::Special {
        println!(
            "{:10} {}",
            "url".white().bold(),
            resolver.to_url(&descriptor.id.path).dimmed()
        );
    }
}

async fn scan(config: &LoaderConfig, file: &Path, name: Option<&str>) -> anyhow::Result<()> {
    let source = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;

    let sniffer = RegexSniffer;
    let resolver = IdentifierResolver::new(config);

    let style = if sniffer.declares_module(&source) {
        "module (calls define)".green().to_string()
    } else {
        "legacy script".yellow().to_string()
    };
    println!("{}: {}", file.display().bold(), style);

    let dependencies = sniffer.dependencies(&source);
    if dependencies.is_empty() {
        println!("  {}", "no require() calls found".dimmed());
    }
    for dependency in dependencies {
        let descriptor = resolver.describe(&dependency, name);
        println!("  {} -> {}", dependency.cyan(), descriptor.id.path);
    }

    Ok(())
}

async fn load(config: LoaderConfig, root: &Path, id: &str) -> anyhow::Result<()> {
    tracing::debug!("Loading {} below {}", id, root.display());
    let loader = ModuleLoader::builder()
        .config(config)
        .fetcher(FsFetcher::new(root, DataOnlyHost))
        .build();

    let exports = loader
        .load(id)
        .await
        .with_context(|| format!("failed to load {}", id))?;

    if exports.is_undefined() {
        println!("{}", "undefined".dimmed());
    } else {
        println!("{}", serde_json::to_string_pretty(&exports.to_json())?);
    }
    Ok(())
}
