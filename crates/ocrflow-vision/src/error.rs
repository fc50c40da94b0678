//! Error types for the vision layer.

use thiserror::Error;

/// Errors that can occur while talking to a vision model.
#[derive(Error, Debug)]
pub enum VisionError {
    /// The request could not be sent or the connection dropped.
    #[error("request failed: {0}")]
    Request(String),

    /// The model server answered with an error.
    #[error("model error: {0}")]
    Remote(String),

    /// A streamed chunk could not be decoded.
    #[error("failed to decode chunk: {0}")]
    Decode(String),

    /// I/O error when reading the image file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(feature = "ollama")]
impl From<reqwest::Error> for VisionError {
    fn from(err: reqwest::Error) -> Self {
        VisionError::Request(err.to_string())
    }
}
