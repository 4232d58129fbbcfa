pub mod analysis;
pub mod chunker;
pub mod config;
pub mod error;
pub mod feedback;
pub mod llm;
pub mod pipeline;
pub mod processor;
pub mod prompts;
pub mod sanitize;
pub mod secrets;

pub use analysis::{parse_metadata, summarize_metadata, DocumentMetadata};
pub use chunker::{chunk_text, count_tokens, Tokenizer};
pub use config::{load_config, load_config_or_default, Config};
pub use error::{
    ArchReviewError, ConfigError, FeedbackError, LlmError, ProcessError, PromptError, Result,
};
pub use feedback::{FeedbackEntry, FeedbackLog};
pub use llm::{ChatCompletionsClient, LlmClient, DEFAULT_SYSTEM_PROMPT};
pub use pipeline::{Pipeline, PipelineConfig, PipelineError, PipelineRun, PipelineState, Stage};
pub use processor::{DocumentFormat, ProcessorRegistry, TextExtractor};
pub use prompts::PromptRenderer;
pub use secrets::{resolve_secret, SecretError};
