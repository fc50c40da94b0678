//! Client for the remote OCR service.
//!
//! Documents are submitted to the service, which either answers right away
//! or hands back a task id. Tasks are then polled until they reach
//! `SUCCESS` or `FAILURE`:
//!
//! ```text
//! SUBMITTED -> PENDING -> PROGRESS* -> SUCCESS | FAILURE
//! ```

mod snapshot;
mod transport;

pub use snapshot::{FilteredSnapshot, PollReporter, QuietPoll, SnapshotFilter};
#[cfg(feature = "http")]
pub use transport::HttpTransport;
pub use transport::{RawResponse, Transport, Upload};

use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::error::ClientError;
use crate::formats::FileFormat;
use crate::invoice;
use crate::models::config::ClientConfig;
use crate::models::invoice::InvoiceRecord;
use crate::models::task::{StatusResponse, Submission, SubmitOptions, TaskHandle, TaskStatus};

/// OCR service client.
pub struct OcrClient<T: Transport> {
    config: ClientConfig,
    transport: T,
}

#[cfg(feature = "http")]
impl OcrClient<HttpTransport> {
    /// Create a client talking HTTP to the configured endpoints.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> OcrClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Upload a document for OCR.
    ///
    /// The prompt file, when set, is read before anything is sent.
    pub async fn submit(&self, document: &FileFormat, options: &SubmitOptions) -> Result<Submission, ClientError> {
        let prompt = options.resolve_prompt()?;

        let mut fields = vec![
            ("ocr_cache".to_string(), options.ocr_cache.to_string()),
            ("model".to_string(), options.model.clone()),
            ("strategy".to_string(), options.strategy.clone()),
        ];
        if let Some(prompt) = prompt {
            fields.push(("prompt".to_string(), prompt));
        }

        let upload = Upload {
            fields,
            file_name: document.file_name(),
            mime_type: document.mime_type().to_string(),
            bytes: document.binary().to_vec(),
        };

        debug!(
            url = %self.config.ocr_url,
            file = %upload.file_name,
            strategy = %options.strategy,
            "Submitting document"
        );

        let response = self
            .transport
            .post_multipart(&self.config.ocr_url, upload)
            .await?
            .error_for_status()?;

        let submission = Submission::from_json(&response.body)?;
        if let Submission::Deferred(handle) = &submission {
            info!("Document queued as task {}", handle);
        }
        Ok(submission)
    }

    /// Fetch the current state of a task once.
    pub async fn status(&self, handle: &TaskHandle) -> Result<(TaskStatus, Value), ClientError> {
        let url = self.config.result_url_for(handle.as_str());
        let response = self.transport.get(&url).await?.error_for_status()?;

        let raw: Value = serde_json::from_str(&response.body)
            .map_err(|e| ClientError::InvalidResponse(format!("{}: {}", e, response.body)))?;
        let decoded: StatusResponse =
            serde_json::from_value(raw.clone()).map_err(|e| ClientError::InvalidResponse(e.to_string()))?;

        Ok((TaskStatus::from(&decoded), raw))
    }

    /// Poll a task until it succeeds or fails.
    ///
    /// Returns the result text on `SUCCESS` and `None` on `FAILURE`. Failed
    /// status checks are logged and retried on the next tick. There is no
    /// deadline; wrap the call in `tokio::time::timeout` to impose one.
    pub async fn poll(&self, handle: &TaskHandle, report_progress: bool, reporter: &dyn PollReporter) -> Option<String> {
        let interval = self.config.poll_interval();
        let mut filter = SnapshotFilter::new();

        loop {
            match self.status(handle).await {
                Ok((TaskStatus::Success(text), _)) => {
                    info!("Task {} finished", handle);
                    return Some(text);
                }
                Ok((TaskStatus::Failure(reason), _)) => {
                    warn!("Task {} failed: {}", handle, reason.as_deref().unwrap_or("no reason given"));
                    reporter.failed(reason.as_deref());
                    return None;
                }
                Ok((status, raw)) => {
                    if let TaskStatus::Progress(info) = &status {
                        debug!(
                            progress = ?info.progress,
                            elapsed = ?info.elapsed_time,
                            "Task {}: {}",
                            handle,
                            info.status.as_deref().unwrap_or("running")
                        );
                    }
                    if report_progress {
                        let filtered = filter.filter(raw);
                        if let Some(text) = &filtered.first_text {
                            reporter.extracted_text(text);
                        }
                        reporter.snapshot(&filtered.snapshot);
                    }
                }
                Err(e) => warn!("Status check for task {} failed: {}", handle, e),
            }

            tokio::time::sleep(interval).await;
        }
    }

    /// Drop all cached OCR results on the service.
    pub async fn clear_cache(&self) -> Result<(), ClientError> {
        self.transport
            .post_json(&self.config.clear_cache_url, None)
            .await?
            .error_for_status()?;
        info!("OCR cache cleared");
        Ok(())
    }

    /// Run a plain text generation on the service's model.
    pub async fn generate(&self, prompt: &str, model: &str) -> Result<String, ClientError> {
        let body = json!({ "model": model, "prompt": prompt });
        let response = self
            .transport
            .post_json(&self.config.llm_generate_url, Some(body))
            .await?
            .error_for_status()?;

        let value: Value = serde_json::from_str(&response.body)
            .map_err(|e| ClientError::InvalidResponse(format!("{}: {}", e, response.body)))?;

        value
            .get("generated_text")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ClientError::InvalidResponse(format!("no generated_text in response: {}", response.body)))
    }

    /// Ask the service to download a model.
    pub async fn pull_model(&self, model: &str) -> Result<(), ClientError> {
        self.transport
            .post_json(&self.config.llm_pull_url, Some(json!({ "model": model })))
            .await?
            .error_for_status()?;
        info!("Model {} pulled", model);
        Ok(())
    }

    /// Submit a document, wait for its text and parse it into an invoice.
    ///
    /// Returns `None` when the task failed or produced no text.
    pub async fn process(
        &self,
        document: &FileFormat,
        options: &SubmitOptions,
        reporter: &dyn PollReporter,
    ) -> crate::Result<Option<InvoiceRecord>> {
        let text = match self.submit(document, options).await? {
            Submission::Immediate(text) => Some(text),
            Submission::Deferred(handle) => {
                reporter.submitted(&handle);
                self.poll(&handle, true, reporter).await
            }
        };

        match text.filter(|t| !t.is_empty()) {
            Some(text) => Ok(Some(invoice::parse(&text)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    enum Sent {
        Multipart { url: String, fields: Vec<(String, String)>, file_name: String },
        Json { url: String, body: Option<Value> },
        Get { url: String },
    }

    /// Transport replaying canned responses in order.
    #[derive(Default)]
    struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<RawResponse, ClientError>>>,
        sent: Mutex<Vec<Sent>>,
    }

    impl ScriptedTransport {
        fn new(responses: Vec<Result<RawResponse, ClientError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                sent: Mutex::default(),
            }
        }

        fn ok(body: &str) -> Result<RawResponse, ClientError> {
            Ok(RawResponse::new(200, body))
        }

        fn next(&self, sent: Sent) -> Result<RawResponse, ClientError> {
            self.sent.lock().unwrap().push(sent);
            self.responses.lock().unwrap().pop_front().expect("no scripted response left")
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn post_multipart(&self, url: &str, upload: Upload) -> Result<RawResponse, ClientError> {
            self.next(Sent::Multipart {
                url: url.to_string(),
                fields: upload.fields,
                file_name: upload.file_name,
            })
        }

        async fn post_json(&self, url: &str, body: Option<Value>) -> Result<RawResponse, ClientError> {
            self.next(Sent::Json { url: url.to_string(), body })
        }

        async fn get(&self, url: &str) -> Result<RawResponse, ClientError> {
            self.next(Sent::Get { url: url.to_string() })
        }
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl PollReporter for Recorder {
        fn submitted(&self, handle: &TaskHandle) {
            self.events.lock().unwrap().push(format!("submitted {}", handle));
        }

        fn extracted_text(&self, text: &str) {
            self.events.lock().unwrap().push(format!("text {}", text));
        }

        fn snapshot(&self, snapshot: &Value) {
            self.events.lock().unwrap().push(format!("snapshot {}", snapshot));
        }

        fn failed(&self, reason: Option<&str>) {
            self.events.lock().unwrap().push(format!("failed {:?}", reason));
        }
    }

    fn client(responses: Vec<Result<RawResponse, ClientError>>) -> OcrClient<ScriptedTransport> {
        OcrClient::with_transport(ClientConfig::default(), ScriptedTransport::new(responses))
    }

    fn sent(client: &OcrClient<ScriptedTransport>) -> Vec<Sent> {
        client.transport.sent.lock().unwrap().clone()
    }

    fn invoice_pdf() -> FileFormat {
        FileFormat::from_binary(b"%PDF-1.5".to_vec(), "application/pdf")
    }

    #[tokio::test]
    async fn test_submit_deferred() {
        let client = client(vec![ScriptedTransport::ok(r#"{"task_id": "abc"}"#)]);
        let options = SubmitOptions::default().with_prompt("Extract the invoice");

        let submission = client.submit(&invoice_pdf(), &options).await.unwrap();
        assert_eq!(submission, Submission::Deferred(TaskHandle::new("abc")));

        assert_eq!(
            sent(&client),
            vec![Sent::Multipart {
                url: "http://localhost:8000/ocr".to_string(),
                fields: vec![
                    ("ocr_cache".to_string(), "true".to_string()),
                    ("model".to_string(), "llama3.2-vision".to_string()),
                    ("strategy".to_string(), "marker".to_string()),
                    ("prompt".to_string(), "Extract the invoice".to_string()),
                ],
                file_name: "document.pdf".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_submit_immediate_without_prompt_field() {
        let client = client(vec![ScriptedTransport::ok(r#"{"text": "Invoice Number: 9"}"#)]);

        let submission = client.submit(&invoice_pdf(), &SubmitOptions::default()).await.unwrap();
        assert_eq!(submission, Submission::Immediate("Invoice Number: 9".to_string()));

        match &sent(&client)[0] {
            Sent::Multipart { fields, .. } => assert!(fields.iter().all(|(name, _)| name != "prompt")),
            other => panic!("unexpected request {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_prompt_file_sends_nothing() {
        let client = client(vec![]);
        let options = SubmitOptions::default().with_prompt_file("/nonexistent/prompt.txt");

        match client.submit(&invoice_pdf(), &options).await {
            Err(ClientError::LocalIo { path, .. }) => assert_eq!(path.to_str(), Some("/nonexistent/prompt.txt")),
            other => panic!("expected local I/O error, got {:?}", other),
        }
        assert!(sent(&client).is_empty());
    }

    #[tokio::test]
    async fn test_submit_rejected() {
        let client = client(vec![Ok(RawResponse::new(500, "boom"))]);

        match client.submit(&invoice_pdf(), &SubmitOptions::default()).await {
            Err(ClientError::Transport { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("expected transport error, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_waits_one_interval_per_pending_response() {
        let client = client(vec![
            ScriptedTransport::ok(r#"{"state": "PENDING"}"#),
            ScriptedTransport::ok(r#"{"state": "PROGRESS", "info": {"progress": 30, "status": "OCR Processing (page 1 of 1) chunk no: 1", "start_time": 1.5, "extracted_text": "Invoice"}}"#),
            ScriptedTransport::ok(r#"{"state": "PROGRESS", "info": {"progress": 50, "start_time": 1.5, "extracted_text": "Invoice Number: 1"}}"#),
            ScriptedTransport::ok(r#"{"state": "SUCCESS", "result": "Invoice Number: 1"}"#),
        ]);
        let recorder = Recorder::default();

        let start = tokio::time::Instant::now();
        let result = client.poll(&TaskHandle::new("t1"), true, &recorder).await;

        assert_eq!(result.as_deref(), Some("Invoice Number: 1"));
        assert_eq!(start.elapsed(), Duration::from_secs(6));

        let events = recorder.events();
        assert_eq!(events.iter().filter(|e| e.starts_with("text ")).count(), 1);
        assert_eq!(events[1], "text Invoice");
        assert!(events.iter().all(|e| !e.contains("start_time") && !e.contains("extracted_text")));
        assert_eq!(events.iter().filter(|e| e.starts_with("snapshot ")).count(), 3);

        let urls: Vec<Sent> = sent(&client);
        assert_eq!(urls.len(), 4);
        assert!(urls.iter().all(|s| *s == Sent::Get { url: "http://localhost:8000/ocr/result/t1".to_string() }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_failure_returns_none() {
        let client = client(vec![
            ScriptedTransport::ok(r#"{"state": "PROGRESS", "info": {"progress": 40}}"#),
            ScriptedTransport::ok(r#"{"state": "FAILURE", "result": "model crashed"}"#),
        ]);
        let recorder = Recorder::default();

        let start = tokio::time::Instant::now();
        assert_eq!(client.poll(&TaskHandle::new("t2"), false, &recorder).await, None);
        assert_eq!(start.elapsed(), Duration::from_secs(2));
        assert_eq!(recorder.events(), vec![r#"failed Some("model crashed")"#.to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_retries_after_errors() {
        let client = client(vec![
            Err(ClientError::Http("connection refused".to_string())),
            Ok(RawResponse::new(502, "bad gateway")),
            ScriptedTransport::ok("not json"),
            ScriptedTransport::ok(r#"{"state": "SUCCESS", "result": "done"}"#),
        ]);

        let start = tokio::time::Instant::now();
        let result = client.poll(&TaskHandle::new("t3"), true, &QuietPoll).await;

        assert_eq!(result.as_deref(), Some("done"));
        assert_eq!(start.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test]
    async fn test_clear_cache() {
        let client = client(vec![ScriptedTransport::ok("{}"), Ok(RawResponse::new(404, "no"))]);

        client.clear_cache().await.unwrap();
        assert!(client.clear_cache().await.is_err());
        assert_eq!(
            sent(&client)[0],
            Sent::Json {
                url: "http://localhost:8000/ocr/clear_cache".to_string(),
                body: None
            }
        );
    }

    #[tokio::test]
    async fn test_generate_and_pull() {
        let client = client(vec![
            ScriptedTransport::ok(r#"{"generated_text": "Hello"}"#),
            ScriptedTransport::ok(r#"{"unexpected": true}"#),
            ScriptedTransport::ok(r#"{"status": "success"}"#),
        ]);

        assert_eq!(client.generate("Say hello", "llama3.1").await.unwrap(), "Hello");
        assert!(matches!(
            client.generate("Say hello", "llama3.1").await,
            Err(ClientError::InvalidResponse(_))
        ));
        client.pull_model("llama3.1").await.unwrap();

        let sent = sent(&client);
        assert_eq!(
            sent[0],
            Sent::Json {
                url: "http://localhost:8000/llm_generate".to_string(),
                body: Some(json!({"model": "llama3.1", "prompt": "Say hello"}))
            }
        );
        assert_eq!(
            sent[2],
            Sent::Json {
                url: "http://localhost:8000/llm_pull".to_string(),
                body: Some(json!({"model": "llama3.1"}))
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_process_deferred_to_invoice() {
        let client = client(vec![
            ScriptedTransport::ok(r#"{"task_id": "t4"}"#),
            ScriptedTransport::ok(r#"{"state": "SUCCESS", "result": "Invoice Number: FT 2024/17\nSubtotal: 120.50"}"#),
        ]);
        let recorder = Recorder::default();

        let record = client
            .process(&invoice_pdf(), &SubmitOptions::default(), &recorder)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(record.invoice.invoice_number.as_deref(), Some("FT 2024/17"));
        assert_eq!(record.subtotal, Some(120.5));
        assert_eq!(recorder.events(), vec!["submitted t4".to_string()]);
    }

    #[tokio::test]
    async fn test_process_immediate_empty_text() {
        let client = client(vec![ScriptedTransport::ok(r#"{"text": ""}"#)]);

        let record = client.process(&invoice_pdf(), &SubmitOptions::default(), &QuietPoll).await.unwrap();
        assert_eq!(record, None);
    }
}
