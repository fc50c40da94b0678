//! Shaping of progress snapshots shown while a task runs.

use serde_json::Value;

use crate::models::task::TaskHandle;

/// Receives what a polling session has to show.
pub trait PollReporter: Send + Sync {
    /// The document was queued under `handle`.
    fn submitted(&self, _handle: &TaskHandle) {}

    /// Partial text of the running task. Called at most once per session.
    fn extracted_text(&self, _text: &str) {}

    /// A filtered non-terminal status response.
    fn snapshot(&self, _snapshot: &Value) {}

    /// The task ended in `FAILURE`.
    fn failed(&self, _reason: Option<&str>) {}
}

/// Reporter that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuietPoll;

impl PollReporter for QuietPoll {}

/// A snapshot after filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredSnapshot {
    /// The status response without `start_time` and `extracted_text`.
    pub snapshot: Value,

    /// Partial text to surface, present only the first time one is seen.
    pub first_text: Option<String>,
}

/// Strips churn and repeated text from successive status responses.
///
/// One filter covers one polling session.
#[derive(Debug, Default)]
pub struct SnapshotFilter {
    text_surfaced: bool,
}

impl SnapshotFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(&mut self, mut response: Value) -> FilteredSnapshot {
        let mut first_text = None;

        if let Some(info) = response.get_mut("info").and_then(Value::as_object_mut) {
            info.remove("start_time");

            if let Some(text) = info.remove("extracted_text") {
                let text = match text {
                    Value::String(s) => s,
                    Value::Null => String::new(),
                    other => other.to_string(),
                };
                if !text.is_empty() && !self.text_surfaced {
                    self.text_surfaced = true;
                    first_text = Some(text);
                }
            }
        }

        FilteredSnapshot {
            snapshot: response,
            first_text,
        }
    }
}
