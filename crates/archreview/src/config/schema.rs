use serde::{Deserialize, Serialize};

/// Token count above which a document is split into chunks; also the
/// per-chunk budget.
pub const DEFAULT_MAX_TOKENS: usize = 1500;

pub const DEFAULT_MODEL_NAME: &str = "mistralai/Mixtral-8x7B-Instruct-v0.1";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Model whose tokenizer budgets chunks; also the default LLM model.
    #[serde(default = "default_model_name")]
    pub model_name: String,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub prompts: PromptsConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_name: default_model_name(),
            chunking: ChunkingConfig::default(),
            llm: LlmConfig::default(),
            prompts: PromptsConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

fn default_model_name() -> String {
    DEFAULT_MODEL_NAME.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    /// Number of chunks analysed in parallel.
    #[serde(default = "default_chunk_workers")]
    pub chunk_workers: usize,
}

fn default_max_tokens() -> usize {
    DEFAULT_MAX_TOKENS
}

fn default_chunk_workers() -> usize {
    num_cpus::get().clamp(1, 4)
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            chunk_workers: default_chunk_workers(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API (`/chat/completions` is appended).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Overrides `model_name` for completions when set.
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_key_file: Option<String>,
    #[serde(default = "default_api_key_env_var")]
    pub api_key_env_var: Option<String>,
    #[serde(default = "default_completion_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_base_url() -> String {
    "https://api.together.xyz/v1".to_string()
}

fn default_api_key_env_var() -> Option<String> {
    Some("TOGETHER_API_KEY".to_string())
}

fn default_completion_tokens() -> u32 {
    2048
}

fn default_temperature() -> f32 {
    0.4
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    2000
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: None,
            api_key: None,
            api_key_file: None,
            api_key_env_var: default_api_key_env_var(),
            max_tokens: default_completion_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptsConfig {
    /// Directory whose `*.txt` files override the built-in templates by name.
    #[serde(default)]
    pub directory: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    #[serde(default = "default_feedback_file")]
    pub feedback_file: String,
}

fn default_bind() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_upload_dir() -> String {
    "uploads".to_string()
}

fn default_max_upload_bytes() -> usize {
    16 * 1024 * 1024
}

fn default_feedback_file() -> String {
    "uploads/feedback.json".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            upload_dir: default_upload_dir(),
            max_upload_bytes: default_max_upload_bytes(),
            feedback_file: default_feedback_file(),
        }
    }
}
