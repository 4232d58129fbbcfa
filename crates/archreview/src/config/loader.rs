use std::path::{Path, PathBuf};

use crate::config::schema::Config;
use crate::error::ConfigError;

pub const MODEL_NAME_ENV_VAR: &str = "ARCHREVIEW_MODEL_NAME";
pub const BIND_ENV_VAR: &str = "ARCHREVIEW_BIND";

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let mut config: Config = if content.trim().is_empty() {
        Config::default()
    } else {
        serde_yaml::from_str(content)?
    };

    apply_env_overrides(&mut config);
    validate_config(&config)?;

    Ok(config)
}

/// Loads the given file, or the per-user default file when present, or the
/// built-in defaults.
pub fn load_config_or_default(path: Option<&Path>) -> Result<Config, ConfigError> {
    if let Some(path) = path {
        return load_config(path);
    }

    match default_config_path() {
        Some(default_path) if default_path.exists() => load_config(default_path),
        _ => load_config_from_str(""),
    }
}

/// `<config dir>/archreview/config.yaml`, e.g. `~/.config/archreview/config.yaml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("archreview").join("config.yaml"))
}

fn apply_env_overrides(config: &mut Config) {
    if let Some(model) = env_non_empty(MODEL_NAME_ENV_VAR) {
        config.model_name = model;
    }
    if let Some(bind) = env_non_empty(BIND_ENV_VAR) {
        config.server.bind = bind;
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.model_name.trim().is_empty() {
        return Err(ConfigError::Validation {
            message: "model_name must not be empty".to_string(),
        });
    }

    if config.chunking.max_tokens == 0 {
        return Err(ConfigError::Validation {
            message: "chunking.max_tokens must be greater than 0".to_string(),
        });
    }

    if config.chunking.chunk_workers == 0 {
        return Err(ConfigError::Validation {
            message: "chunking.chunk_workers must be greater than 0".to_string(),
        });
    }

    if !(0.0..=2.0).contains(&config.llm.temperature) {
        return Err(ConfigError::Validation {
            message: format!(
                "llm.temperature must be within 0.0..=2.0, got {}",
                config.llm.temperature
            ),
        });
    }

    if config.llm.base_url.trim().is_empty() {
        return Err(ConfigError::Validation {
            message: "llm.base_url must not be empty".to_string(),
        });
    }

    if config.server.max_upload_bytes == 0 {
        return Err(ConfigError::Validation {
            message: "server.max_upload_bytes must be greater than 0".to_string(),
        });
    }

    Ok(())
}
