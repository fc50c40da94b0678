//! CLI application for OCR processing and invoice extraction.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{config, extract, llm, ocr, parse};

/// ocrflow - Submit documents for OCR and turn the text into invoice records
#[derive(Parser)]
#[command(name = "ocrflow")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a file to the OCR endpoint and get the result
    Ocr(ocr::OcrArgs),

    /// Get the OCR result by task id
    Result(ocr::ResultArgs),

    /// Clear the OCR result cache
    #[command(name = "clear_cache")]
    ClearCache,

    /// Run a text generation on the service's model
    #[command(name = "llm_generate")]
    LlmGenerate(llm::GenerateArgs),

    /// Pull a model on the service
    #[command(name = "llm_pull")]
    LlmPull(llm::PullArgs),

    /// Extract text locally with a strategy
    Extract(extract::ExtractArgs),

    /// Parse invoice text into a record
    Parse(parse::ParseArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Ocr(args) => ocr::run(args, config_path).await,
        Commands::Result(args) => ocr::run_result(args, config_path).await,
        Commands::ClearCache => ocr::run_clear_cache(config_path).await,
        Commands::LlmGenerate(args) => llm::run_generate(args, config_path).await,
        Commands::LlmPull(args) => llm::run_pull(args, config_path).await,
        Commands::Extract(args) => extract::run(args, config_path).await,
        Commands::Parse(args) => parse::run(args),
        Commands::Config(args) => config::run(args, config_path),
    }
}
