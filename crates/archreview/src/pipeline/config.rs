use std::path::PathBuf;

use crate::config::Config;

pub struct PipelineConfig {
    pub model_name: String,
    /// Chunking threshold and per-chunk budget.
    pub max_tokens: usize,
    pub chunk_workers: usize,
    pub prompts_directory: Option<PathBuf>,
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            model_name: config.model_name.clone(),
            max_tokens: config.chunking.max_tokens,
            chunk_workers: config.chunking.chunk_workers,
            prompts_directory: config.prompts.directory.as_ref().map(PathBuf::from),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
