#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use archreview::{LlmClient, LlmError};

/// Marker that only the summary template contains.
const SUMMARY_MARKER: &str = "\"topics\"";

/// Answers review and evaluation prompts with a fixed text and summary
/// prompts with `summary_reply`. Prompts containing `fail_marker` fail.
pub struct ScriptedLlm {
    pub analysis_reply: String,
    pub summary_reply: String,
    pub fail_marker: Option<String>,
    pub fail_summary: bool,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl Default for ScriptedLlm {
    fn default() -> Self {
        Self {
            analysis_reply: "analysis".to_string(),
            summary_reply: r#"{"title": "Scripted", "summary": "A scripted summary", "topics": ["test"]}"#
                .to_string(),
            fail_marker: None,
            fail_summary: false,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedLlm {
    pub fn with_summary_reply(reply: &str) -> Self {
        Self {
            summary_reply: reply.to_string(),
            ..Self::default()
        }
    }

    pub fn failing_on(marker: &str) -> Self {
        Self {
            fail_marker: Some(marker.to_string()),
            ..Self::default()
        }
    }

    pub fn failing_summary() -> Self {
        Self {
            fail_summary: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl LlmClient for ScriptedLlm {
    fn complete(&self, prompt: &str, _system_prompt: Option<&str>) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());

        if prompt.contains(SUMMARY_MARKER) {
            if self.fail_summary {
                return Err(LlmError::Status {
                    status: 503,
                    body: "summary backend unavailable".to_string(),
                });
            }
            return Ok(self.summary_reply.clone());
        }

        if let Some(marker) = &self.fail_marker {
            if prompt.contains(marker.as_str()) {
                return Err(LlmError::Request("connection reset".to_string()));
            }
        }

        Ok(self.analysis_reply.clone())
    }
}
