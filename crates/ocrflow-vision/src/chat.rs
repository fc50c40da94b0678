//! Chat request and streamed chunk types.

use std::path::PathBuf;

use serde::Deserialize;

use crate::{Result, VisionError};

/// A single-turn chat request carrying one or more images.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// Model name (e.g. "llama3.2-vision").
    pub model: String,
    /// Instruction given to the model.
    pub prompt: String,
    /// Image files attached to the user message.
    pub images: Vec<PathBuf>,
}

impl ChatRequest {
    /// Create a request for a single image file.
    pub fn new(model: impl Into<String>, prompt: impl Into<String>, image: impl Into<PathBuf>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            images: vec![image.into()],
        }
    }
}

/// Message body of a streamed chunk.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: String,
}

/// One line of a streamed chat response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatChunk {
    #[serde(default)]
    pub message: Option<ChunkMessage>,

    /// Set on the final chunk of the stream.
    #[serde(default)]
    pub done: bool,

    /// Set when the server aborts generation.
    #[serde(default)]
    pub error: Option<String>,
}

impl ChatChunk {
    /// Decode a chunk from a single NDJSON line.
    pub fn decode(line: &str) -> Result<Self> {
        serde_json::from_str(line).map_err(|e| VisionError::Decode(format!("{}: {}", e, line)))
    }

    /// Take the text content, turning an error chunk into an error.
    pub fn into_content(self) -> Result<String> {
        if let Some(error) = self.error {
            return Err(VisionError::Remote(error));
        }
        Ok(self.message.map(|m| m.content).unwrap_or_default())
    }
}

/// Splits a byte stream into newline-delimited records.
///
/// Bytes are buffered until a `\n` arrives, so records (and multi-byte
/// characters) split across network chunks are reassembled.
#[derive(Debug, Default)]
pub struct NdjsonLines {
    buffer: Vec<u8>,
}

impl NdjsonLines {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes and return every complete, non-blank line.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&line).trim().to_string();
            if !text.is_empty() {
                lines.push(text);
            }
        }
        lines
    }

    /// Return the trailing record if the stream ended without a newline.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        let text = String::from_utf8_lossy(&rest).trim().to_string();
        (!text.is_empty()).then_some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_lines_split_across_pushes() {
        let mut lines = NdjsonLines::new();
        assert!(lines.push(b"{\"done\":fa").is_empty());
        assert_eq!(lines.push(b"lse}\n{\"done\":true}\n"), vec![
            "{\"done\":false}".to_string(),
            "{\"done\":true}".to_string(),
        ]);
        assert_eq!(lines.finish(), None);
    }

    #[test]
    fn test_multibyte_character_across_pushes() {
        let mut lines = NdjsonLines::new();
        let text = "Fatura nº 1\n".as_bytes();
        let (head, tail) = text.split_at(9);
        assert!(lines.push(head).is_empty());
        assert_eq!(lines.push(tail), vec!["Fatura nº 1".to_string()]);
    }

    #[test]
    fn test_finish_returns_unterminated_line() {
        let mut lines = NdjsonLines::new();
        assert!(lines.push(b"\n\n{\"done\":true}").is_empty());
        assert_eq!(lines.finish(), Some("{\"done\":true}".to_string()));
    }

    #[test]
    fn test_decode_content_chunk() {
        let chunk = ChatChunk::decode(
            r#"{"model":"llama3.2-vision","message":{"role":"assistant","content":"Invoice"},"done":false}"#,
        )
        .unwrap();
        assert!(!chunk.done);
        assert_eq!(chunk.into_content().unwrap(), "Invoice");
    }

    #[test]
    fn test_decode_error_chunk() {
        let chunk = ChatChunk::decode(r#"{"error":"model not found"}"#).unwrap();
        match chunk.into_content() {
            Err(VisionError::Remote(msg)) => assert_eq!(msg, "model not found"),
            other => panic!("expected remote error, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(ChatChunk::decode("not json"), Err(VisionError::Decode(_))));
    }
}
