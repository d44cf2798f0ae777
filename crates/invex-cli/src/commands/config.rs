//! Config command - manage configuration.

use std::fs;
use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::style;

use invex_core::models::config::InvexConfig;

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Show current configuration
    Show,

    /// Initialize a new configuration file
    Init(InitArgs),

    /// Get a specific configuration value
    Get {
        /// Configuration key (e.g., "llm.model")
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// New value
        value: String,
    },

    /// Show configuration file path
    Path,
}

#[derive(Args)]
struct InitArgs {
    /// Output path for configuration file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overwrite existing file
    #[arg(long)]
    force: bool,
}

pub async fn run(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(),
        ConfigCommand::Init(init_args) => init_config(init_args),
        ConfigCommand::Get { key } => get_config(&key),
        ConfigCommand::Set { key, value } => set_config(&key, &value),
        ConfigCommand::Path => show_path(),
    }
}

fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("invex")
        .join("config.json")
}

fn load_or_default() -> anyhow::Result<InvexConfig> {
    let config_path = default_config_path();
    if config_path.exists() {
        Ok(InvexConfig::from_file(&config_path)?)
    } else {
        Ok(InvexConfig::default())
    }
}

fn show_config() -> anyhow::Result<()> {
    if !default_config_path().exists() {
        println!(
            "{} No config file found, showing defaults.",
            style("ℹ").blue()
        );
    }
    let config = load_or_default()?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn init_config(args: InitArgs) -> anyhow::Result<()> {
    let output_path = args.output.unwrap_or_else(default_config_path);

    if output_path.exists() && !args.force {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            output_path.display()
        );
    }

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let config = InvexConfig::default();
    config.save(&output_path)?;

    println!(
        "{} Created configuration file at {}",
        style("✓").green(),
        output_path.display()
    );

    Ok(())
}

fn get_config(key: &str) -> anyhow::Result<()> {
    let config = load_or_default()?;

    let value = config
        .lookup(key)
        .ok_or_else(|| anyhow::anyhow!("Configuration key not found: {}", key))?;

    println!("{}", serde_json::to_string_pretty(&value)?);

    Ok(())
}

fn set_config(key: &str, value: &str) -> anyhow::Result<()> {
    let config_path = default_config_path();
    let mut config = load_or_default()?;

    // Bare words become strings; anything that parses as JSON is kept typed.
    let parsed_value: serde_json::Value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));

    config.set_key(key, parsed_value.clone())?;

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }
    config.save(&config_path)?;

    println!(
        "{} Set {} = {}",
        style("✓").green(),
        key,
        serde_json::to_string(&parsed_value)?
    );

    Ok(())
}

fn show_path() -> anyhow::Result<()> {
    let config_path = default_config_path();

    println!("Configuration file: {}", config_path.display());

    if config_path.exists() {
        println!("Status: {}", style("exists").green());
    } else {
        println!("Status: {}", style("not created").yellow());
        println!();
        println!("Run 'invex config init' to create a configuration file.");
    }

    Ok(())
}
