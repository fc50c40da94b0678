//! Parse command - turn invoice text into a record.

use std::fs;
use std::io::Read;
use std::path::PathBuf;

use clap::Args;

use ocrflow_core::invoice;

use super::output::{OutputFormat, emit, format_invoice};

/// Arguments for the parse command.
#[derive(Args)]
pub struct ParseArgs {
    /// Text file to parse ("-" for stdin)
    #[arg(required = true)]
    input: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub fn run(args: ParseArgs) -> anyhow::Result<()> {
    let text = if args.input.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(&args.input)
            .map_err(|e| anyhow::anyhow!("Cannot read {}: {}", args.input.display(), e))?
    };

    let record = invoice::parse(&text)?;
    emit(&format_invoice(&record, args.format)?, args.output.as_deref())
}
