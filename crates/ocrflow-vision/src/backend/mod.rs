//! Vision backend implementations.

#[cfg(feature = "ollama")]
pub mod ollama;

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream, Stream, StreamExt};

use crate::{ChatChunk, ChatRequest, NdjsonLines, Result, VisionError};

/// Incrementally generated text, one item per model chunk.
///
/// The stream ends when the model signals completion. An `Err` item means
/// generation failed part-way through.
pub type ChunkStream = BoxStream<'static, Result<String>>;

/// Trait for vision-capable chat models.
///
/// Implementations take an instruction and image files and stream back the
/// generated text. Strategies only depend on this trait, so a local model
/// server, a hosted API or a test double can be swapped in freely.
#[async_trait]
pub trait VisionBackend: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Start a streamed chat completion for the given request.
    ///
    /// # Arguments
    /// * `request` - Model, instruction and image paths
    ///
    /// # Returns
    /// A stream of text chunks, or an error if generation could not start
    async fn chat_stream(&self, request: &ChatRequest) -> Result<ChunkStream>;
}

/// Decode a newline-delimited JSON byte stream into text chunks.
pub fn decode_ndjson_stream<S, B, E>(bytes: S) -> ChunkStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<VisionError> + Send + 'static,
{
    let mut lines = NdjsonLines::new();

    bytes
        .map(Some)
        .chain(stream::once(async { None }))
        .flat_map(move |item| {
            let records = match item {
                Some(Ok(chunk)) => lines.push(chunk.as_ref()),
                Some(Err(e)) => return stream::iter(vec![Err(e.into())]),
                None => lines.finish().into_iter().collect(),
            };
            let decoded: Vec<Result<String>> = records
                .iter()
                .map(|line| ChatChunk::decode(line).and_then(ChatChunk::into_content))
                .collect();
            stream::iter(decoded)
        })
        .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_decode_stream_yields_every_chunk() {
        let parts: Vec<std::result::Result<Vec<u8>, VisionError>> = vec![
            Ok(br#"{"message":{"role":"assistant","content":"Invoice "},"done":false}"#.to_vec()),
            Ok(b"\n{\"message\":{\"role\":\"assistant\",\"content\":\"Num".to_vec()),
            Ok(b"ber\"},\"done\":false}\n".to_vec()),
            Ok(br#"{"message":{"role":"assistant","content":""},"done":true}"#.to_vec()),
        ];

        let chunks: Vec<String> = decode_ndjson_stream(stream::iter(parts))
            .map(|c| c.unwrap())
            .collect()
            .await;

        assert_eq!(chunks, vec!["Invoice ", "Number", ""]);
    }

    #[tokio::test]
    async fn test_decode_stream_surfaces_remote_error() {
        let parts: Vec<std::result::Result<Vec<u8>, VisionError>> = vec![
            Ok(b"{\"message\":{\"content\":\"a\"}}\n".to_vec()),
            Ok(b"{\"error\":\"out of memory\"}\n".to_vec()),
        ];

        let items: Vec<Result<String>> = decode_ndjson_stream(stream::iter(parts)).collect().await;

        assert_eq!(items.len(), 2);
        assert!(matches!(&items[1], Err(VisionError::Remote(msg)) if msg == "out of memory"));
    }

    #[tokio::test]
    async fn test_decode_stream_passes_transport_error() {
        let parts: Vec<std::result::Result<Vec<u8>, VisionError>> =
            vec![Err(VisionError::Request("connection reset".to_string()))];

        let items: Vec<Result<String>> = decode_ndjson_stream(stream::iter(parts)).collect().await;

        assert!(matches!(&items[0], Err(VisionError::Request(_))));
    }
}
