use std::path::Path;

use anyhow::{Context, Result};
use clap::Subcommand;

use super::runtime::load_config;
use crate::cli::output::{Formatter, get_formatter};
use crate::models::{Config, OutputFormat};

const REDACTED: &str = "********";

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    #[command(about = "Initialize configuration file")]
    Init {
        #[arg(
            long,
            short = 'g',
            help = "Create global config instead of project config"
        )]
        global: bool,
        #[arg(long, help = "Force overwrite existing config")]
        force: bool,
    },
    #[command(about = "Show effective configuration")]
    Show,
    #[command(about = "Show configuration file paths")]
    Path {
        #[arg(long, help = "Show all possible config paths")]
        all: bool,
    },
}

pub async fn handle_config(
    cmd: ConfigCommand,
    config_path: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let formatter = get_formatter(format);

    match cmd {
        ConfigCommand::Init { global, force } => handle_init(global, force, formatter.as_ref()),
        ConfigCommand::Show => handle_show(config_path, format),
        ConfigCommand::Path { all } => handle_path(config_path, all),
    }
}

fn handle_init(global: bool, force: bool, formatter: &dyn Formatter) -> Result<()> {
    let (scope, path) = if global {
        ("global", Config::global_path())
    } else {
        ("project", Config::project_path())
    };
    let path = path.ok_or_else(|| anyhow::anyhow!("could not determine {scope} config path"))?;

    if path.exists() && !force {
        anyhow::bail!(
            "{} config already exists at: {}\nUse --force to overwrite.",
            scope,
            path.display()
        );
    }

    Config::default()
        .save(&path)
        .with_context(|| format!("failed to create {scope} config"))?;
    println!(
        "{}",
        formatter.format_message(&format!("Created {scope} config at: {}", path.display()))
    );
    Ok(())
}

fn handle_show(config_path: Option<&Path>, format: OutputFormat) -> Result<()> {
    let mut config = load_config(config_path)?;
    if config.generation.api_key.is_some() {
        config.generation.api_key = Some(REDACTED.to_string());
    }
    if config.vector_store.api_key.is_some() {
        config.vector_store.api_key = Some(REDACTED.to_string());
    }

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    if let Some(path) = Config::resolve_path(config_path) {
        println!("# Loaded from: {}", path.display());
    } else {
        println!("# Using built-in defaults");
    }
    println!();
    print!(
        "{}",
        toml::to_string_pretty(&config).context("failed to render configuration")?
    );
    Ok(())
}

fn handle_path(config_path: Option<&Path>, show_all: bool) -> Result<()> {
    println!("Configuration paths:");
    println!();

    if let Some(path) = config_path {
        println!("Explicit config: {}", path.display());
    }

    if let Some(path) = Config::project_path() {
        if path.exists() {
            println!("Project config (active): {}", path.display());
        } else if show_all {
            println!("Project config (would be): {}", path.display());
        }
    }

    if let Some(path) = Config::global_path() {
        if path.exists() {
            println!("Global config (active): {}", path.display());
        } else if show_all {
            println!("Global config (would be): {}", path.display());
        }
    }

    if show_all && let Ok(cwd) = std::env::current_dir() {
        let env_path = cwd.join(".env");
        if env_path.exists() {
            println!(".env file (active): {}", env_path.display());
        } else {
            println!(".env file (would be): {}", env_path.display());
        }
    }

    Ok(())
}
