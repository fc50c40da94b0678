//! Page-by-page OCR through a vision chat model.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use ocrflow_vision::{ChatRequest, VisionBackend};
use tracing::{debug, info, info_span, Instrument};

use super::{convert_blocking, NoopProgress, ProgressEvent, ProgressReporter, Result, ScopedImageFile, Strategy};
use crate::error::StrategyError;
use crate::formats::{FileFormat, FormatKind};
use crate::models::config::VisionConfig;

/// Strategy that sends every page image to a vision model and collects the
/// streamed markdown.
pub struct LlamaVisionStrategy {
    backend: Arc<dyn VisionBackend>,
    config: VisionConfig,
    progress: Arc<dyn ProgressReporter>,
}

/// Timing shared by all events of one extraction.
struct Clock {
    started_at: DateTime<Utc>,
    started: Instant,
}

impl LlamaVisionStrategy {
    pub fn new(backend: Arc<dyn VisionBackend>, config: VisionConfig) -> Self {
        Self {
            backend,
            config,
            progress: Arc::new(NoopProgress),
        }
    }

    /// Send progress events to `reporter`.
    pub fn with_progress(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress = reporter;
        self
    }

    /// Overall percentage once `done` of `total` pages are finished.
    fn band_progress(&self, done: usize, total: usize) -> u8 {
        let start = self.config.progress_start as usize;
        let width = self.config.progress_width as usize;
        let value = start + width * done / total.max(1);
        value.min(100) as u8
    }

    fn emit(&self, clock: &Clock, progress: u8, page: usize, total: usize, chunk: usize, text: Option<&str>) {
        self.progress.report(ProgressEvent {
            progress,
            status: format!("OCR Processing (page {} of {}) chunk no: {}", page, total, chunk),
            start_time: clock.started_at,
            elapsed_time: clock.started.elapsed().as_secs_f64(),
            page,
            total_pages: total,
            extracted_text: text.map(str::to_string),
        });
    }

    async fn process_page(&self, image: &FileFormat, page: usize, total: usize, clock: &Clock) -> Result<String> {
        self.emit(clock, self.band_progress(page - 1, total), page, total, 0, None);

        let scratch = ScopedImageFile::create(image.binary(), image.extension()).map_err(StrategyError::TempFile)?;
        let request = ChatRequest::new(&self.config.model, &self.config.prompt, scratch.path());

        let mut chunks = self
            .backend
            .chat_stream(&request)
            .await
            .map_err(|source| StrategyError::PageProcessing { page, source })?;

        let progress = self.band_progress(page, total);
        let mut text = String::new();
        let mut chunk_no = 0;

        while let Some(chunk) = chunks.next().await {
            let chunk = chunk.map_err(|source| StrategyError::PageProcessing { page, source })?;
            chunk_no += 1;
            text.push_str(&chunk);
            self.emit(clock, progress, page, total, chunk_no, Some(&text));
        }

        debug!(page, chunks = chunk_no, chars = text.len(), "Page done");
        Ok(text)
    }
}

#[async_trait]
impl Strategy for LlamaVisionStrategy {
    fn name(&self) -> &str {
        "llama_vision"
    }

    async fn extract_text(&self, format: &FileFormat, language: &str) -> Result<String> {
        if !format.can_convert_to(FormatKind::Image) {
            return Err(StrategyError::UnsupportedFormat {
                strategy: self.name().to_string(),
                mime_type: format.mime_type().to_string(),
            });
        }

        let span = info_span!("llama_vision", language, backend = self.backend.name(), model = %self.config.model);

        async {
            let pages = convert_blocking(format, FormatKind::Image).await?;
            let total = pages.len();
            info!("Running OCR on {} page(s)", total);

            let clock = Clock {
                started_at: Utc::now(),
                started: Instant::now(),
            };

            let mut texts = Vec::with_capacity(total);
            for (i, page) in pages.iter().enumerate() {
                let text = self.process_page(page, i + 1, total, &clock).await?;
                if !text.is_empty() {
                    texts.push(text);
                }
            }

            info!("OCR finished in {:.2}s", clock.started.elapsed().as_secs_f64());
            Ok::<_, StrategyError>(texts.join("\n\n"))
        }
        .instrument(span)
        .await
    }
}
