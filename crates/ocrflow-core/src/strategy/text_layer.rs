//! Strategy returning text that is already embedded in the document.

use async_trait::async_trait;
use tracing::debug;

use super::{convert_blocking, Result, Strategy};
use crate::error::StrategyError;
use crate::formats::{FileFormat, FormatKind};

/// Reads the text layer of PDFs and the body of text documents.
///
/// No model is involved, so this is useful for born-digital invoices and as
/// a baseline when comparing vision output.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextLayerStrategy;

#[async_trait]
impl Strategy for TextLayerStrategy {
    fn name(&self) -> &str {
        "text_layer"
    }

    async fn extract_text(&self, format: &FileFormat, language: &str) -> Result<String> {
        if !format.can_convert_to(FormatKind::Text) {
            return Err(StrategyError::UnsupportedFormat {
                strategy: self.name().to_string(),
                mime_type: format.mime_type().to_string(),
            });
        }

        debug!(language, mime_type = format.mime_type(), "Reading text layer");

        let texts: Vec<String> = convert_blocking(format, FormatKind::Text)
            .await?
            .iter()
            .map(FileFormat::text)
            .collect();

        Ok(texts.join("\n\n"))
    }
}
