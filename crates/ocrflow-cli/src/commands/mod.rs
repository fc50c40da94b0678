//! Subcommand implementations.

pub mod config;
pub mod extract;
pub mod llm;
pub mod ocr;
pub mod output;
pub mod parse;
