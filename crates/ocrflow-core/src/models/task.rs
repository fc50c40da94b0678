//! Task submission and status models for the remote OCR service.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ClientError;

/// Server-issued identifier of an asynchronous OCR job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskHandle(String);

impl TaskHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of a document submission.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// The service processed the document synchronously.
    Immediate(String),
    /// The service queued the document; poll the handle for the result.
    Deferred(TaskHandle),
}

/// Raw submission response body.
#[derive(Debug, Default, Deserialize)]
struct SubmitResponse {
    #[serde(default)]
    task_id: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

impl Submission {
    /// Decode a submission response body.
    ///
    /// A non-empty `task_id` wins over `text`; a body with neither is invalid.
    pub fn from_json(body: &str) -> Result<Self, ClientError> {
        let response: SubmitResponse = serde_json::from_str(body)
            .map_err(|e| ClientError::InvalidResponse(format!("{}: {}", e, body)))?;

        match response {
            SubmitResponse { task_id: Some(id), .. } if !id.is_empty() => {
                Ok(Submission::Deferred(TaskHandle(id)))
            }
            SubmitResponse { text: Some(text), .. } => Ok(Submission::Immediate(text)),
            _ => Err(ClientError::InvalidResponse(format!(
                "neither task_id nor text in response: {}",
                body
            ))),
        }
    }
}

/// Options sent along with a document.
#[derive(Debug, Clone)]
pub struct SubmitOptions {
    /// Let the service reuse cached OCR output.
    pub ocr_cache: bool,

    /// Model used by the service to post-process the text.
    pub model: String,

    /// Server-side extraction strategy.
    pub strategy: String,

    /// Instruction for the post-processing model.
    pub prompt: Option<String>,

    /// File whose content replaces `prompt`.
    pub prompt_file: Option<PathBuf>,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            ocr_cache: true,
            model: "llama3.2-vision".to_string(),
            strategy: "marker".to_string(),
            prompt: None,
            prompt_file: None,
        }
    }
}

impl SubmitOptions {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.strategy = strategy.into();
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn with_prompt_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.prompt_file = Some(path.into());
        self
    }

    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.ocr_cache = enabled;
        self
    }

    /// Resolve the prompt to send, reading `prompt_file` when set.
    ///
    /// An empty prompt, from either source, is not sent.
    pub fn resolve_prompt(&self) -> Result<Option<String>, ClientError> {
        if let Some(path) = &self.prompt_file {
            let content = std::fs::read_to_string(path).map_err(|source| ClientError::LocalIo {
                path: path.clone(),
                source,
            })?;
            return Ok(Some(content).filter(|p| !p.is_empty()));
        }
        Ok(self.prompt.clone().filter(|p| !p.is_empty()))
    }
}

/// Progress details reported while a task runs.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProgressInfo {
    /// Completion percentage (0 - 100).
    #[serde(default, deserialize_with = "lenient_percent")]
    pub progress: Option<u8>,

    /// Human-readable status line.
    #[serde(default)]
    pub status: Option<String>,

    /// Task start as a Unix timestamp.
    #[serde(default)]
    pub start_time: Option<f64>,

    /// Seconds since the task started.
    #[serde(default)]
    pub elapsed_time: Option<f64>,

    /// Text accumulated for the page being processed.
    #[serde(default)]
    pub extracted_text: Option<String>,
}

/// Accepts `30`, `30.0` or `"30"`.
fn lenient_percent<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let number = match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(number.map(|n| n.clamp(0.0, 100.0) as u8))
}

/// Raw status response body.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    pub state: String,
    #[serde(default)]
    pub info: Option<serde_json::Value>,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
}

/// State of a remote task.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskStatus {
    /// Queued, not started.
    Pending,
    /// Running.
    Progress(ProgressInfo),
    /// Finished with the extracted text.
    Success(String),
    /// Failed, with the reason when the service sent one.
    Failure(Option<String>),
}

impl From<&StatusResponse> for TaskStatus {
    fn from(response: &StatusResponse) -> Self {
        match response.state.as_str() {
            "SUCCESS" => TaskStatus::Success(value_to_text(response.result.as_ref())),
            "FAILURE" => {
                let reason = response
                    .result
                    .as_ref()
                    .or(response.info.as_ref())
                    .filter(|v| !v.is_null())
                    .map(|v| value_to_text(Some(v)));
                TaskStatus::Failure(reason)
            }
            "PROGRESS" => {
                let info = response
                    .info
                    .clone()
                    .and_then(|v| serde_json::from_value(v).ok())
                    .unwrap_or_default();
                TaskStatus::Progress(info)
            }
            // PENDING and any intermediate state the queue reports
            _ => TaskStatus::Pending,
        }
    }
}

fn value_to_text(value: Option<&serde_json::Value>) -> String {
    match value {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn status(body: &str) -> TaskStatus {
        let response: StatusResponse = serde_json::from_str(body).unwrap();
        TaskStatus::from(&response)
    }

    #[test]
    fn test_submission_deferred() {
        assert_eq!(
            Submission::from_json(r#"{"task_id": "42"}"#).unwrap(),
            Submission::Deferred(TaskHandle::new("42"))
        );
    }

    #[test]
    fn test_submission_immediate() {
        assert_eq!(
            Submission::from_json(r#"{"text": "Invoice Number: 1"}"#).unwrap(),
            Submission::Immediate("Invoice Number: 1".to_string())
        );
    }

    #[test]
    fn test_submission_empty_task_id_falls_back_to_text() {
        assert_eq!(
            Submission::from_json(r#"{"task_id": "", "text": "x"}"#).unwrap(),
            Submission::Immediate("x".to_string())
        );
    }

    #[test]
    fn test_submission_invalid() {
        assert!(matches!(
            Submission::from_json("{}"),
            Err(ClientError::InvalidResponse(_))
        ));
        assert!(matches!(
            Submission::from_json("<html>"),
            Err(ClientError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_status_states() {
        assert_eq!(status(r#"{"state": "PENDING"}"#), TaskStatus::Pending);
        assert_eq!(
            status(r#"{"state": "SUCCESS", "result": "done"}"#),
            TaskStatus::Success("done".to_string())
        );
        assert_eq!(
            status(r#"{"state": "FAILURE", "result": null}"#),
            TaskStatus::Failure(None)
        );
        assert_eq!(
            status(r#"{"state": "FAILURE", "info": "boom"}"#),
            TaskStatus::Failure(Some("boom".to_string()))
        );
    }

    #[test]
    fn test_progress_info_with_string_percent() {
        let parsed = status(
            r#"{"state": "PROGRESS", "info": {"progress": "30", "status": "OCR Processing (page 1 of 2) chunk no: 3", "start_time": 1700000000.5, "elapsed_time": 1.5}}"#,
        );
        let TaskStatus::Progress(info) = parsed else {
            panic!("expected progress");
        };
        assert_eq!(info.progress, Some(30));
        assert_eq!(info.extracted_text, None);
        assert_eq!(info.start_time, Some(1700000000.5));
    }

    #[test]
    fn test_progress_without_info() {
        assert_eq!(
            status(r#"{"state": "PROGRESS"}"#),
            TaskStatus::Progress(ProgressInfo::default())
        );
    }

    #[test]
    fn test_prompt_file_replaces_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prompt.txt");
        std::fs::write(&path, "Extract the invoice.").unwrap();

        let options = SubmitOptions::default()
            .with_prompt("ignored")
            .with_prompt_file(&path);

        assert_eq!(options.resolve_prompt().unwrap(), Some("Extract the invoice.".to_string()));
    }

    #[test]
    fn test_missing_prompt_file() {
        let options = SubmitOptions::default().with_prompt_file("/nonexistent/prompt.txt");
        assert!(matches!(options.resolve_prompt(), Err(ClientError::LocalIo { .. })));
    }

    #[test]
    fn test_empty_prompt_file_sends_no_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prompt.txt");
        std::fs::write(&path, "").unwrap();

        let options = SubmitOptions::default().with_prompt_file(&path);
        assert_eq!(options.resolve_prompt().unwrap(), None);
        assert_eq!(SubmitOptions::default().with_prompt("").resolve_prompt().unwrap(), None);
    }
}
