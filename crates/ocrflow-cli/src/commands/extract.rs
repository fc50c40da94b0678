//! Extract command - run a text extraction strategy locally.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use ocrflow_core::formats::FileFormat;
use ocrflow_core::invoice;
use ocrflow_core::models::config::VisionConfig;
use ocrflow_core::strategy::{
    DEFAULT_LANGUAGE, LlamaVisionStrategy, ProgressEvent, ProgressReporter, StrategyRegistry, TextLayerStrategy,
};
use ocrflow_core::OllamaBackend;

use super::config::load_config;
use super::output::{OutputFormat, emit, format_invoice};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input file (PDF, image or text)
    #[arg(required = true)]
    input: PathBuf,

    /// Strategy to run
    #[arg(short, long, default_value = "llama_vision")]
    strategy: String,

    /// Language hint (ISO 639-1)
    #[arg(short, long, default_value = DEFAULT_LANGUAGE)]
    language: String,

    /// Parse the extracted text into an invoice record
    #[arg(long)]
    parse: bool,

    /// Output format for parsed records
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(short, long)]
    quiet: bool,
}

/// Build the registry of locally available strategies.
pub fn registry(vision: VisionConfig, progress: Arc<dyn ProgressReporter>) -> StrategyRegistry {
    let backend = Arc::new(OllamaBackend::new(vision.base_url.clone()));

    StrategyRegistry::new()
        .register(Arc::new(LlamaVisionStrategy::new(backend, vision).with_progress(progress)))
        .register(Arc::new(TextLayerStrategy))
}

fn progress_bar(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
    );
    pb
}

pub async fn run(args: ExtractArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }
    let document = FileFormat::from_path(&args.input)?;
    info!("Extracting {} with {}", args.input.display(), args.strategy);

    let pb = progress_bar(args.quiet);
    let bar = pb.clone();
    let reporter: Arc<dyn ProgressReporter> = Arc::new(move |event: ProgressEvent| {
        bar.set_position(event.progress as u64);
        bar.set_message(event.status);
    });

    let registry = registry(config.vision, reporter);
    let text = match registry.extract_text(&args.strategy, &document, &args.language).await {
        Ok(text) => text,
        Err(e) => {
            pb.abandon_with_message(format!("{}", style("Failed").red()));
            return Err(e.into());
        }
    };
    pb.finish_with_message("Done");

    let content = if args.parse {
        format_invoice(&invoice::parse(&text)?, args.format)?
    } else {
        text
    };
    emit(&content, args.output.as_deref())?;

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}
