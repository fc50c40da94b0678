//! Text extraction strategies.
//!
//! A [`Strategy`] turns a document into text. Callers look strategies up by
//! name in a [`StrategyRegistry`] and never depend on concrete types, so new
//! strategies only need to implement the trait and be registered.

mod llama_vision;
mod temp_image;
mod text_layer;

pub use llama_vision::LlamaVisionStrategy;
pub use temp_image::ScopedImageFile;
pub use text_layer::TextLayerStrategy;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{FormatError, StrategyError};
use crate::formats::{FileFormat, FormatKind};

/// Language hint used when the caller has none.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Result type for strategy operations.
pub type Result<T> = std::result::Result<T, StrategyError>;

/// Trait for text extraction strategies.
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Registry name (e.g. "llama_vision").
    fn name(&self) -> &str;

    /// Extract the text of the whole document.
    ///
    /// # Arguments
    /// * `format` - The document to read
    /// * `language` - Language hint (ISO 639-1 code)
    async fn extract_text(&self, format: &FileFormat, language: &str) -> Result<String>;
}

/// Run a format conversion on the blocking pool.
///
/// PDF parsing, page rendering and PNG encoding are CPU bound.
pub(crate) async fn convert_blocking(format: &FileFormat, target: FormatKind) -> Result<Vec<FileFormat>> {
    let format = format.clone();
    let pages = tokio::task::spawn_blocking(move || format.convert_to(target))
        .await
        .map_err(|e| FormatError::Render(format!("conversion task failed: {}", e)))??;
    Ok(pages)
}

/// Progress of a running extraction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressEvent {
    /// Overall completion percentage (0 - 100).
    pub progress: u8,

    /// Human-readable status line.
    pub status: String,

    /// When the extraction started.
    pub start_time: DateTime<Utc>,

    /// Seconds since the extraction started.
    pub elapsed_time: f64,

    /// Page being processed (1-indexed).
    pub page: usize,

    /// Number of pages in the document.
    pub total_pages: usize,

    /// Text generated so far for the current page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_text: Option<String>,
}

/// Receives progress events from strategies.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

impl<F> ProgressReporter for F
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn report(&self, event: ProgressEvent) {
        self(event)
    }
}

/// Reporter that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Strategies indexed by name.
#[derive(Clone, Default)]
pub struct StrategyRegistry {
    strategies: BTreeMap<String, Arc<dyn Strategy>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a strategy, replacing any previous one with the same name.
    pub fn register(mut self, strategy: Arc<dyn Strategy>) -> Self {
        self.strategies.insert(strategy.name().to_string(), strategy);
        self
    }

    /// Look up a strategy by name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Strategy>> {
        self.strategies
            .get(name)
            .cloned()
            .ok_or_else(|| StrategyError::UnknownStrategy(name.to_string()))
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.strategies.keys().map(String::as_str).collect()
    }

    /// Run the named strategy on a document.
    pub async fn extract_text(&self, name: &str, format: &FileFormat, language: &str) -> Result<String> {
        self.get(name)?.extract_text(format, language).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Upper;

    #[async_trait]
    impl Strategy for Upper {
        fn name(&self) -> &str {
            "upper"
        }

        async fn extract_text(&self, format: &FileFormat, _language: &str) -> Result<String> {
            Ok(format.text().to_uppercase())
        }
    }

    #[tokio::test]
    async fn test_registry_dispatch_by_name() {
        let registry = StrategyRegistry::new()
            .register(Arc::new(Upper))
            .register(Arc::new(TextLayerStrategy));

        assert_eq!(registry.names(), vec!["text_layer", "upper"]);

        let doc = FileFormat::from_binary("invoice", "text/plain");
        let text = registry.extract_text("upper", &doc, DEFAULT_LANGUAGE).await.unwrap();
        assert_eq!(text, "INVOICE");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_convert_blocking() {
        let pdf = crate::formats::pdf::fixtures::text_pdf(&["Invoice 1", "Invoice 2", "Invoice 3"]);
        let doc = FileFormat::from_binary(pdf, "application/pdf");
        let pages = convert_blocking(&doc, FormatKind::Image).await.unwrap();

        assert_eq!(pages.len(), 3);

        let text = FileFormat::from_binary("x", "text/plain");
        assert!(matches!(
            convert_blocking(&text, FormatKind::Image).await,
            Err(StrategyError::Conversion(FormatError::UnsupportedConversion { .. }))
        ));
    }

    #[tokio::test]
    async fn test_registry_unknown_name() {
        let registry = StrategyRegistry::new();
        let doc = FileFormat::from_binary("x", "text/plain");

        match registry.extract_text("tesseract", &doc, DEFAULT_LANGUAGE).await {
            Err(StrategyError::UnknownStrategy(name)) => assert_eq!(name, "tesseract"),
            other => panic!("expected unknown strategy, got {:?}", other),
        }
    }
}
