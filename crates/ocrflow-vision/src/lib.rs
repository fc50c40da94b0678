//! Vision model abstraction layer for ocrflow.
//!
//! This crate provides a unified interface for asking a vision-capable
//! chat model to describe a page image, streaming the answer back in
//! chunks:
//! - [`VisionBackend`] is the capability seam used by extraction strategies
//! - `OllamaBackend` talks to an Ollama server over HTTP (`ollama` feature)

mod backend;
mod chat;
mod error;

pub use backend::{ChunkStream, VisionBackend, decode_ndjson_stream};
pub use chat::{ChatChunk, ChatRequest, ChunkMessage, NdjsonLines};
pub use error::VisionError;

#[cfg(feature = "ollama")]
pub use backend::ollama::OllamaBackend;

/// Result type for vision operations.
pub type Result<T> = std::result::Result<T, VisionError>;
