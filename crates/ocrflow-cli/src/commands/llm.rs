//! Model commands: llm_generate, llm_pull.

use std::path::Path;

use clap::Args;
use console::style;

use ocrflow_core::client::OcrClient;

use super::config::load_config;

/// Arguments for the llm_generate command.
#[derive(Args)]
pub struct GenerateArgs {
    /// Prompt for the model
    #[arg(long)]
    prompt: String,

    /// Model to use
    #[arg(long, default_value = "llama3.2-vision")]
    model: String,
}

/// Arguments for the llm_pull command.
#[derive(Args)]
pub struct PullArgs {
    /// Model to pull
    #[arg(long, default_value = "llama3.2-vision")]
    model: String,
}

pub async fn run_generate(args: GenerateArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let client = OcrClient::new(config.client)?;

    let text = client
        .generate(&args.prompt, &args.model)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to generate text: {}", e))?;

    println!("{}", text);
    Ok(())
}

pub async fn run_pull(args: PullArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let client = OcrClient::new(config.client)?;

    client
        .pull_model(&args.model)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to pull the model: {}", e))?;

    println!("{} Model {} pulled successfully.", style("✓").green(), style(&args.model).cyan());
    Ok(())
}
