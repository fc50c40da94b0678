//! Core library for OCR document processing.
//!
//! This crate provides:
//! - Document formats and conversions (PDF to page images or text)
//! - Text extraction strategies, including page-by-page vision model OCR
//! - A client for submitting documents to a remote OCR service and polling
//!   its tasks
//! - Invoice field extraction from model-generated text

pub mod client;
pub mod error;
pub mod formats;
pub mod invoice;
pub mod models;
pub mod strategy;

pub use client::{OcrClient, PollReporter, QuietPoll, RawResponse, SnapshotFilter, Transport};
#[cfg(feature = "http")]
pub use client::HttpTransport;
pub use error::{ClientError, ExtractionError, FormatError, OcrflowError, Result, StrategyError};
pub use formats::{FileFormat, FormatKind};
pub use invoice::{InvoiceParser, LabelParser};
pub use models::config::{ClientConfig, OcrflowConfig, VisionConfig};
pub use models::invoice::{InvoiceInfo, InvoiceRecord, LineItem, Party, QrCodeFields};
pub use models::task::{ProgressInfo, Submission, SubmitOptions, TaskHandle, TaskStatus};
pub use strategy::{
    DEFAULT_LANGUAGE, LlamaVisionStrategy, NoopProgress, ProgressEvent, ProgressReporter, Strategy,
    StrategyRegistry, TextLayerStrategy,
};

/// Re-export vision types.
pub use ocrflow_vision::{ChatRequest, VisionBackend, VisionError};

#[cfg(feature = "http")]
pub use ocrflow_vision::OllamaBackend;
