//! The three LLM-backed tools: architecture review, Well-Architected
//! evaluation, and document metadata.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ArchReviewError;
use crate::llm::LlmClient;
use crate::prompts::{
    render_document_prompt, PromptRenderer, EVALUATOR_TEMPLATE, REVIEWER_TEMPLATE,
    SUMMARY_TEMPLATE,
};

pub const FALLBACK_TITLE: &str = "Architecture Document";
const FALLBACK_TOPICS: [&str; 2] = ["architecture", "design"];
const FALLBACK_SUMMARY_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: String,
    pub summary: String,
    pub topics: Vec<String>,
}

impl DocumentMetadata {
    /// Metadata derived from a reply that was not the expected JSON.
    pub fn fallback(response: &str) -> Self {
        let summary = if response.chars().count() > FALLBACK_SUMMARY_CHARS {
            let head: String = response.chars().take(FALLBACK_SUMMARY_CHARS).collect();
            format!("{}...", head)
        } else {
            response.to_string()
        };

        Self {
            title: FALLBACK_TITLE.to_string(),
            summary,
            topics: FALLBACK_TOPICS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// Parses a summarizer reply, falling back to [`DocumentMetadata::fallback`].
///
/// A reply wrapped in a fenced code block is unwrapped first.
pub fn parse_metadata(response: &str) -> DocumentMetadata {
    let candidate = strip_code_fence(response.trim());
    match serde_json::from_str::<DocumentMetadata>(candidate) {
        Ok(metadata) => metadata,
        Err(e) => {
            debug!(error = %e, "Summary reply is not metadata JSON, using fallback");
            DocumentMetadata::fallback(response)
        }
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return text;
    };
    // Drop an info string such as `json` on the opening fence line
    match body.split_once('\n') {
        Some((info, inner)) if !info.trim().contains(' ') => inner.trim(),
        _ => body.trim(),
    }
}

/// Shared shape of the reviewer and evaluator: render one template over the
/// text, send it, return the reply.
#[derive(Clone)]
struct PromptTool {
    template: &'static str,
    renderer: PromptRenderer,
    llm: Arc<dyn LlmClient>,
}

impl PromptTool {
    fn run(&self, text: &str) -> Result<String, ArchReviewError> {
        let prompt = render_document_prompt(&self.renderer, self.template, text)?;
        Ok(self.llm.complete(&prompt, None)?)
    }
}

#[derive(Clone)]
pub struct ArchitectureReviewer(PromptTool);

impl ArchitectureReviewer {
    pub fn new(renderer: PromptRenderer, llm: Arc<dyn LlmClient>) -> Self {
        Self(PromptTool {
            template: REVIEWER_TEMPLATE,
            renderer,
            llm,
        })
    }

    pub fn review(&self, chunk: &str) -> Result<String, ArchReviewError> {
        self.0.run(chunk)
    }
}

#[derive(Clone)]
pub struct ArchitectureEvaluator(PromptTool);

impl ArchitectureEvaluator {
    pub fn new(renderer: PromptRenderer, llm: Arc<dyn LlmClient>) -> Self {
        Self(PromptTool {
            template: EVALUATOR_TEMPLATE,
            renderer,
            llm,
        })
    }

    pub fn evaluate(&self, chunk: &str) -> Result<String, ArchReviewError> {
        self.0.run(chunk)
    }
}

/// Summarizes the whole document. Only the LLM call (or prompt rendering)
/// can fail; an unparseable reply yields fallback metadata.
pub fn summarize_metadata(
    renderer: &PromptRenderer,
    llm: &dyn LlmClient,
    doc: &str,
) -> Result<DocumentMetadata, ArchReviewError> {
    let prompt = render_document_prompt(renderer, SUMMARY_TEMPLATE, doc)?;
    let response = llm.complete(&prompt, None)?;
    Ok(parse_metadata(&response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use std::sync::Mutex;

    struct CannedLlm {
        reply: Result<String, String>,
        prompts: Mutex<Vec<String>>,
    }

    impl CannedLlm {
        fn ok(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    impl LlmClient for CannedLlm {
        fn complete(&self, prompt: &str, _system: Option<&str>) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply.clone().map_err(LlmError::Request)
        }
    }

    #[test]
    fn test_parse_metadata_valid_json() {
        let metadata = parse_metadata(
            r#"{"title": "Payments", "summary": "Queue based", "topics": ["kafka"]}"#,
        );
        assert_eq!(metadata.title, "Payments");
        assert_eq!(metadata.summary, "Queue based");
        assert_eq!(metadata.topics, vec!["kafka"]);
    }

    #[test]
    fn test_parse_metadata_plain_text_falls_back() {
        let metadata = parse_metadata("Hello world");
        assert_eq!(metadata.title, "Architecture Document");
        assert_eq!(metadata.summary, "Hello world");
        assert_eq!(metadata.topics, vec!["architecture", "design"]);
    }

    #[test]
    fn test_fallback_summary_truncates_long_replies() {
        let long = "a".repeat(250);
        let metadata = parse_metadata(&long);
        assert_eq!(metadata.summary, format!("{}...", "a".repeat(200)));

        let exact = "b".repeat(200);
        assert_eq!(parse_metadata(&exact).summary, exact);
    }

    #[test]
    fn test_fallback_truncation_respects_char_boundaries() {
        let long = "é".repeat(201);
        let metadata = DocumentMetadata::fallback(&long);
        assert_eq!(metadata.summary.chars().count(), 203);
    }

    #[test]
    fn test_parse_metadata_incomplete_object_falls_back() {
        let metadata = parse_metadata(r#"{"title": "Only a title"}"#);
        assert_eq!(metadata.title, FALLBACK_TITLE);
    }

    #[test]
    fn test_parse_metadata_unwraps_code_fence() {
        let reply = "```json\n{\"title\": \"T\", \"summary\": \"S\", \"topics\": []}\n```";
        let metadata = parse_metadata(reply);
        assert_eq!(metadata.title, "T");
        assert!(metadata.topics.is_empty());
    }

    #[test]
    fn test_summarize_metadata_renders_document_into_prompt() {
        let llm = CannedLlm::ok("Hello world");
        let metadata =
            summarize_metadata(&PromptRenderer::new(), &llm, "Three tier web app").unwrap();

        assert_eq!(metadata.summary, "Hello world");
        let prompts = llm.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Three tier web app"));
    }

    #[test]
    fn test_summarize_metadata_propagates_llm_failure() {
        let llm = CannedLlm::failing("connection refused");
        let result = summarize_metadata(&PromptRenderer::new(), &llm, "doc");
        assert!(matches!(result, Err(ArchReviewError::Llm(_))));
    }

    #[test]
    fn test_reviewer_and_evaluator_use_their_templates() {
        let llm = Arc::new(CannedLlm::ok("looks fine"));
        let reviewer = ArchitectureReviewer::new(PromptRenderer::new(), llm.clone());
        let evaluator = ArchitectureEvaluator::new(PromptRenderer::new(), llm.clone());

        assert_eq!(reviewer.review("chunk one").unwrap(), "looks fine");
        assert_eq!(evaluator.evaluate("chunk two").unwrap(), "looks fine");

        let prompts = llm.prompts.lock().unwrap();
        assert!(prompts[0].contains("chunk one"));
        assert!(prompts[1].contains("chunk two"));
        assert_ne!(prompts[0], prompts[1]);
    }
}
