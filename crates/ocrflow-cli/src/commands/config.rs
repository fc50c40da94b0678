//! Config command - manage configuration.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use console::style;
use tracing::debug;

use ocrflow_core::models::config::OcrflowConfig;

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
        /// Configuration key (e.g., "client.ocr_url")
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

/// Environment variables overriding configuration values.
const ENV_OVERRIDES: &[(&str, fn(&mut OcrflowConfig, String))] = &[
    ("OCR_URL", |c, v| c.client.ocr_url = v),
    ("RESULT_URL", |c, v| c.client.result_url = v),
    ("CLEAR_CACHE_URL", |c, v| c.client.clear_cache_url = v),
    ("LLM_GENERATE_API_URL", |c, v| c.client.llm_generate_url = v),
    ("LLM_PULL_API_URL", |c, v| c.client.llm_pull_url = v),
    ("OLLAMA_HOST", |c, v| c.vision.base_url = v),
    ("LLAMA_VISION_PROMPT", |c, v| c.vision.prompt = v),
];

pub fn run(args: ConfigArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let path = config_path.map(Path::to_path_buf).unwrap_or_else(default_config_path);

    match args.command {
        ConfigCommand::Show => show_config(&path),
        ConfigCommand::Init(init_args) => init_config(init_args, &path),
        ConfigCommand::Get { key } => get_config(&path, &key),
        ConfigCommand::Set { key, value } => set_config(&path, &key, &value),
        ConfigCommand::Path => show_path(&path),
    }
}

fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ocrflow")
        .join("config.json")
}

/// Load the effective configuration for a command.
///
/// An explicit path must exist. Otherwise the default file is used when
/// present. Environment overrides are applied last.
pub fn load_config(config_path: Option<&Path>) -> anyhow::Result<OcrflowConfig> {
    let mut config = match config_path {
        Some(path) => OcrflowConfig::from_file(path)
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {}", path.display(), e))?,
        None => read_or_default(&default_config_path())?,
    };

    apply_env(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

fn apply_env(config: &mut OcrflowConfig, lookup: impl Fn(&str) -> Option<String>) {
    for (key, apply) in ENV_OVERRIDES {
        if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
            debug!("Using {} from environment", key);
            apply(config, value);
        }
    }
}

fn read_or_default(path: &Path) -> anyhow::Result<OcrflowConfig> {
    if path.exists() {
        Ok(OcrflowConfig::from_file(path)?)
    } else {
        Ok(OcrflowConfig::default())
    }
}

fn show_config(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        eprintln!("{} No config file found, showing defaults.", style("ℹ").blue());
    }
    let config = read_or_default(path)?;

    println!("{}", serde_json::to_string_pretty(&config)?);

    Ok(())
}

fn init_config(args: InitArgs, path: &Path) -> anyhow::Result<()> {
    let output_path = args.output.unwrap_or_else(|| path.to_path_buf());

    if output_path.exists() && !args.force {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            output_path.display()
        );
    }

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }

    OcrflowConfig::default().save(&output_path)?;

    println!(
        "{} Created configuration file at {}",
        style("✓").green(),
        output_path.display()
    );

    Ok(())
}

fn get_config(path: &Path, key: &str) -> anyhow::Result<()> {
    let json = serde_json::to_value(read_or_default(path)?)?;

    let value = key
        .split('.')
        .try_fold(&json, |current, part| current.get(part))
        .ok_or_else(|| anyhow::anyhow!("Configuration key not found: {}", key))?;

    println!("{}", serde_json::to_string_pretty(value)?);

    Ok(())
}

fn set_config(path: &Path, key: &str, value: &str) -> anyhow::Result<()> {
    let mut json = serde_json::to_value(read_or_default(path)?)?;

    // Numbers and booleans are taken as JSON, everything else as a string
    let parsed_value: serde_json::Value =
        serde_json::from_str(value).unwrap_or_else(|_| serde_json::Value::String(value.to_string()));

    let (parent, field) = match key.rsplit_once('.') {
        Some((parent, field)) => (Some(parent), field),
        None => (None, key),
    };

    let target = match parent {
        Some(parent) => parent
            .split('.')
            .try_fold(&mut json, |current, part| current.get_mut(part))
            .ok_or_else(|| anyhow::anyhow!("Configuration path not found: {}", key))?,
        None => &mut json,
    };

    let object = target
        .as_object_mut()
        .ok_or_else(|| anyhow::anyhow!("Cannot set value at non-object path"))?;
    if !object.contains_key(field) {
        anyhow::bail!("Configuration key not found: {}", key);
    }
    object.insert(field.to_string(), parsed_value.clone());

    let config: OcrflowConfig = serde_json::from_value(json)
        .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", key, e))?;

    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    config.save(path)?;

    println!(
        "{} Set {} = {}",
        style("✓").green(),
        key,
        serde_json::to_string(&parsed_value)?
    );

    Ok(())
}

fn show_path(path: &Path) -> anyhow::Result<()> {
    println!("Configuration file: {}", path.display());

    if path.exists() {
        println!("Status: {}", style("exists").green());
    } else {
        println!("Status: {}", style("not created").yellow());
        println!();
        println!("Run 'ocrflow config init' to create a configuration file.");
    }

    Ok(())
}
