//! Invoice field extraction from model-generated text.

mod parser;

pub use parser::{ITEM_LABELS, ItemField, LINE_LABELS, LabelParser, LineField};

use crate::error::ExtractionError;
use crate::models::invoice::InvoiceRecord;

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Trait for invoice parsers.
pub trait InvoiceParser {
    /// Build an invoice record from free text.
    fn parse(&self, text: &str) -> Result<InvoiceRecord>;
}

/// Parse text with the default label parser.
pub fn parse(text: &str) -> Result<InvoiceRecord> {
    LabelParser.parse(text)
}
