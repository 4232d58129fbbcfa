//! LLM provider boundary.
//!
//! The pipeline depends only on [`LlmClient`]. [`ChatCompletionsClient`] is
//! the production implementation for OpenAI-compatible chat-completion APIs.

pub mod chat;

pub use chat::ChatCompletionsClient;

use crate::error::LlmError;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

pub trait LlmClient: Send + Sync {
    /// Sends `prompt` as the user message. `None` uses
    /// [`DEFAULT_SYSTEM_PROMPT`]. Timeouts and retries are the
    /// implementation's concern.
    fn complete(&self, prompt: &str, system_prompt: Option<&str>) -> Result<String, LlmError>;
}
