//! Configuration structures for the OCR client and local strategies.

use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Main configuration for ocrflow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrflowConfig {
    /// Remote OCR service endpoints.
    pub client: ClientConfig,

    /// Vision model settings for local extraction.
    pub vision: VisionConfig,
}

/// Endpoints and polling behaviour of the remote OCR service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Document submission endpoint.
    pub ocr_url: String,

    /// Task status endpoint. `{task_id}` is replaced with the task id.
    pub result_url: String,

    /// Result cache clearing endpoint.
    pub clear_cache_url: String,

    /// Text generation endpoint.
    pub llm_generate_url: String,

    /// Model pull endpoint.
    pub llm_pull_url: String,

    /// Seconds between two status checks.
    pub poll_interval_secs: f64,

    /// Request timeout in seconds (0 = none).
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            ocr_url: "http://localhost:8000/ocr".to_string(),
            result_url: "http://localhost:8000/ocr/result/{task_id}".to_string(),
            clear_cache_url: "http://localhost:8000/ocr/clear_cache".to_string(),
            llm_generate_url: "http://localhost:8000/llm_generate".to_string(),
            llm_pull_url: "http://localhost:8000/llm_pull".to_string(),
            poll_interval_secs: 2.0,
            request_timeout_secs: 0,
        }
    }
}

impl ClientConfig {
    /// Status URL for a given task.
    pub fn result_url_for(&self, task_id: &str) -> String {
        self.result_url.replace("{task_id}", task_id)
    }

    /// Interval between two status checks.
    ///
    /// Values that are not a valid duration (negative, NaN, too large) fall
    /// back to 2 seconds.
    pub fn poll_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.poll_interval_secs).unwrap_or(DEFAULT_POLL_INTERVAL)
    }
}

/// Vision model configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// Model server base URL.
    pub base_url: String,

    /// Model name.
    pub model: String,

    /// Instruction sent along with every page image.
    pub prompt: String,

    /// Lower bound of the progress band reserved for OCR (0 - 100).
    pub progress_start: u8,

    /// Width of the progress band reserved for OCR.
    pub progress_width: u8,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.2-vision".to_string(),
            prompt: "You are OCR. Convert image to markdown.".to_string(),
            progress_start: 30,
            progress_width: 20,
        }
    }
}

impl OcrflowConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}
