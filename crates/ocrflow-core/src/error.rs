//! Error types for the ocrflow-core library.

use std::path::PathBuf;

use thiserror::Error;

use crate::formats::FormatKind;

/// Main error type for the ocrflow library.
#[derive(Error, Debug)]
pub enum OcrflowError {
    /// Document format error.
    #[error("format error: {0}")]
    Format(#[from] FormatError),

    /// Text extraction strategy error.
    #[error("strategy error: {0}")]
    Strategy(#[from] StrategyError),

    /// OCR service client error.
    #[error("client error: {0}")]
    Client(#[from] ClientError),

    /// Invoice extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to documents and format conversion.
#[derive(Error, Debug)]
pub enum FormatError {
    /// No conversion path exists between the two kinds.
    #[error("cannot convert {mime_type} ({from:?}) to {to:?}")]
    UnsupportedConversion {
        mime_type: String,
        from: FormatKind,
        to: FormatKind,
    },

    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Pdf(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// A page could not be rendered to an image.
    #[error("failed to render PDF page: {0}")]
    Render(String),

    /// Image decoding or encoding failed.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Errors raised by extraction strategies.
#[derive(Error, Debug)]
pub enum StrategyError {
    /// The document cannot be handled by this strategy.
    #[error("format {mime_type} is not supported by {strategy}")]
    UnsupportedFormat { strategy: String, mime_type: String },

    /// The vision model failed on one page; the whole document is aborted.
    #[error("failed to process page {page}: {source}")]
    PageProcessing {
        page: usize,
        #[source]
        source: ocrflow_vision::VisionError,
    },

    /// No strategy registered under this name.
    #[error("unknown strategy: {0}")]
    UnknownStrategy(String),

    /// Converting the document into pages failed.
    #[error(transparent)]
    Conversion(#[from] FormatError),

    /// The scratch file for a page image could not be written.
    #[error("failed to write page image: {0}")]
    TempFile(#[source] std::io::Error),
}

/// Errors related to the remote OCR service.
#[derive(Error, Debug)]
pub enum ClientError {
    /// A local file needed for the request could not be read.
    #[error("cannot read {}: {source}", path.display())]
    LocalIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The service answered with a non-success status.
    #[error("request failed with status {status}: {body}")]
    Transport { status: u16, body: String },

    /// The request could not be sent.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The response body did not have the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Errors related to invoice field extraction.
#[derive(Error, Debug, PartialEq)]
pub enum ExtractionError {
    /// A numeric field held something that is not a number.
    #[error("expected a number for {field}, got {value:?}")]
    FieldType { field: String, value: String },
}

/// Result type for the ocrflow library.
pub type Result<T> = std::result::Result<T, OcrflowError>;
