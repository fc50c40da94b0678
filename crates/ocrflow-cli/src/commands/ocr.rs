//! Commands talking to the remote OCR service: ocr, result, clear_cache.

use std::path::{Path, PathBuf};

use clap::Args;
use console::style;
use serde_json::Value;
use tracing::debug;

use ocrflow_core::client::{OcrClient, PollReporter};
use ocrflow_core::error::{ClientError, OcrflowError};
use ocrflow_core::formats::FileFormat;
use ocrflow_core::invoice;
use ocrflow_core::models::task::{SubmitOptions, TaskHandle};

use super::config::load_config;
use super::output::{OutputFormat, emit, format_invoice};

/// Arguments for the ocr command.
#[derive(Args)]
pub struct OcrArgs {
    /// Path to the file to upload
    #[arg(long)]
    file: PathBuf,

    /// Enable OCR result caching
    #[arg(long = "ocr_cache", default_value_t = true, action = clap::ArgAction::Set)]
    ocr_cache: bool,

    /// Prompt used by the model to fix or transform the file
    #[arg(long)]
    prompt: Option<String>,

    /// File holding the prompt; replaces --prompt
    #[arg(long = "prompt_file")]
    prompt_file: Option<PathBuf>,

    /// Model to use
    #[arg(long, default_value = "llama3.2-vision")]
    model: String,

    /// OCR strategy to use for the file
    #[arg(long, default_value = "marker")]
    strategy: String,

    /// Print the progress of the OCR task
    #[arg(long = "print_progress", default_value_t = true, action = clap::ArgAction::Set)]
    print_progress: bool,

    #[command(flatten)]
    output: OutputArgs,
}

/// Arguments for the result command.
#[derive(Args)]
pub struct ResultArgs {
    /// Task id returned by the ocr command
    #[arg(long = "task_id")]
    task_id: String,

    /// Print the progress of the OCR task
    #[arg(long = "print_progress", default_value_t = true, action = clap::ArgAction::Set)]
    print_progress: bool,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args)]
struct OutputArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// Prints polling progress to stderr.
struct ConsoleReporter {
    show_progress: bool,
}

impl PollReporter for ConsoleReporter {
    fn submitted(&self, handle: &TaskHandle) {
        eprintln!(
            "{} File uploaded successfully. Task Id: {} Waiting for the result...",
            style("✓").green(),
            style(handle).cyan()
        );
    }

    fn extracted_text(&self, text: &str) {
        if self.show_progress {
            eprintln!("Extracted text:\n{}", text);
        }
    }

    fn snapshot(&self, snapshot: &Value) {
        if self.show_progress {
            eprintln!("{}", snapshot);
        }
    }

    fn failed(&self, reason: Option<&str>) {
        match reason {
            Some(reason) => eprintln!("{} OCR task failed: {}", style("✗").red(), reason),
            None => eprintln!("{} OCR task failed.", style("✗").red()),
        }
    }
}

pub async fn run(args: OcrArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    if !args.file.exists() {
        anyhow::bail!("Input file not found: {}", args.file.display());
    }
    let document = FileFormat::from_path(&args.file)?;

    let mut options = SubmitOptions::default()
        .with_model(args.model)
        .with_strategy(args.strategy)
        .with_cache(args.ocr_cache);
    if let Some(prompt) = args.prompt {
        options = options.with_prompt(prompt);
    }
    if let Some(path) = args.prompt_file {
        options = options.with_prompt_file(path);
    }

    let client = OcrClient::new(config.client)?;
    let reporter = ConsoleReporter {
        show_progress: args.print_progress,
    };

    debug!("Submitting {}", args.file.display());

    match client.process(&document, &options, &reporter).await {
        Ok(Some(record)) => emit(&format_invoice(&record, args.output.format)?, args.output.output.as_deref()),
        Ok(None) => Ok(()),
        Err(OcrflowError::Client(ClientError::LocalIo { path, .. })) => {
            eprintln!("{} Prompt file not found: {}", style("✗").red(), path.display());
            Ok(())
        }
        Err(OcrflowError::Client(e @ ClientError::Transport { .. })) => {
            eprintln!("{} Failed to upload file: {}", style("✗").red(), e);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn run_result(args: ResultArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let client = OcrClient::new(config.client)?;
    let reporter = ConsoleReporter {
        show_progress: args.print_progress,
    };

    let handle = TaskHandle::new(args.task_id);
    let Some(text) = client.poll(&handle, args.print_progress, &reporter).await else {
        return Ok(());
    };
    if text.is_empty() {
        return Ok(());
    }

    let record = invoice::parse(&text)?;
    emit(&format_invoice(&record, args.output.format)?, args.output.output.as_deref())
}

pub async fn run_clear_cache(config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let client = OcrClient::new(config.client)?;

    match client.clear_cache().await {
        Ok(()) => {
            println!("{} OCR cache cleared successfully.", style("✓").green());
            Ok(())
        }
        Err(e) => anyhow::bail!("Failed to clear OCR cache: {}", e),
    }
}
