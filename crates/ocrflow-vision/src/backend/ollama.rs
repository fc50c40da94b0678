//! Ollama backend using the streaming `/api/chat` endpoint.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::debug;

use super::{ChunkStream, VisionBackend, decode_ndjson_stream};
use crate::{ChatRequest, Result, VisionError};

/// Backend talking to an Ollama server.
pub struct OllamaBackend {
    client: reqwest::Client,
    base_url: String,
}

impl OllamaBackend {
    /// Create a backend for the server at `base_url` (e.g. `http://localhost:11434`).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a backend reusing an existing HTTP client.
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url.trim_end_matches('/'))
    }

    fn request_body(&self, request: &ChatRequest) -> Result<serde_json::Value> {
        let images = request
            .images
            .iter()
            .map(|path| std::fs::read(path).map(|bytes| STANDARD.encode(bytes)))
            .collect::<std::io::Result<Vec<String>>>()?;

        Ok(serde_json::json!({
            "model": request.model,
            "messages": [{
                "role": "user",
                "content": request.prompt,
                "images": images,
            }],
            "stream": true,
        }))
    }
}

#[async_trait]
impl VisionBackend for OllamaBackend {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn chat_stream(&self, request: &ChatRequest) -> Result<ChunkStream> {
        let body = self.request_body(request)?;
        let url = self.chat_url();

        debug!("POST {} (model={}, images={})", url, request.model, request.images.len());

        let response = self.client.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(VisionError::Remote(format!("Ollama returned {}: {}", status, body)));
        }

        Ok(decode_ndjson_stream(response.bytes_stream()))
    }
}
