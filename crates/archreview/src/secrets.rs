//! API key resolution for the LLM provider.
//!
//! Keys are looked up in priority order so the same config file works for
//! local runs and container deployments:
//!
//! 1. **Direct value** (`api_key: "..."`), handy for quick local testing
//! 2. **File reference** (`api_key_file: /run/secrets/together`), Docker secrets
//! 3. **Env var reference** (`api_key_env_var: TOGETHER_API_KEY`)

use secrecy::SecretString;
use std::fs;

#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("No API key source provided (need one of: direct value, file path, or env var name)")]
    NoSourceProvided,

    #[error("Failed to read API key from file '{path}': {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Environment variable '{name}' not set")]
    EnvVarNotSet { name: String },

    #[error("Environment variable '{name}' contains invalid UTF-8")]
    EnvVarNotUnicode { name: String },
}

pub type Result<T> = std::result::Result<T, SecretError>;

/// Resolves a secret from the first non-empty source.
///
/// Values read from files or the environment are trimmed, since both tend to
/// carry a trailing newline.
pub fn resolve_secret(
    direct: Option<&str>,
    file_path: Option<&str>,
    env_var: Option<&str>,
) -> Result<SecretString> {
    if let Some(value) = direct.filter(|v| !v.is_empty()) {
        return Ok(SecretString::from(value.to_string()));
    }

    if let Some(path) = file_path.filter(|p| !p.is_empty()) {
        let expanded = expand_home(path);
        return fs::read_to_string(&expanded)
            .map(|content| SecretString::from(content.trim().to_string()))
            .map_err(|source| SecretError::FileRead {
                path: expanded,
                source,
            });
    }

    if let Some(name) = env_var.filter(|n| !n.is_empty()) {
        return match std::env::var(name) {
            Ok(value) => Ok(SecretString::from(value.trim().to_string())),
            Err(std::env::VarError::NotPresent) => Err(SecretError::EnvVarNotSet {
                name: name.to_string(),
            }),
            Err(std::env::VarError::NotUnicode(_)) => Err(SecretError::EnvVarNotUnicode {
                name: name.to_string(),
            }),
        };
    }

    Err(SecretError::NoSourceProvided)
}

/// Expands a leading `~` to the current user's home directory.
fn expand_home(path: &str) -> String {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_direct_value_takes_priority() {
        let secret = resolve_secret(Some("direct"), Some("/nonexistent"), Some("NOPE")).unwrap();
        assert_eq!(secret.expose_secret(), "direct");
    }

    #[test]
    fn test_file_takes_priority_over_env() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "from-file").unwrap();
        let path = file.path().to_str().unwrap();

        let secret = resolve_secret(None, Some(path), Some("ARCHREVIEW_TEST_UNUSED")).unwrap();
        assert_eq!(secret.expose_secret(), "from-file");
    }

    #[test]
    #[serial]
    fn test_env_var_fallback() {
        std::env::set_var("ARCHREVIEW_TEST_API_KEY", "  from-env\n");
        let secret = resolve_secret(None, None, Some("ARCHREVIEW_TEST_API_KEY")).unwrap();
        assert_eq!(secret.expose_secret(), "from-env");
        std::env::remove_var("ARCHREVIEW_TEST_API_KEY");
    }

    #[test]
    #[serial]
    fn test_env_var_not_set_error() {
        std::env::remove_var("ARCHREVIEW_TEST_MISSING_KEY");
        let err = resolve_secret(None, None, Some("ARCHREVIEW_TEST_MISSING_KEY")).unwrap_err();
        assert!(matches!(err, SecretError::EnvVarNotSet { .. }));
    }

    #[test]
    fn test_empty_strings_ignored() {
        let err = resolve_secret(Some(""), Some(""), Some("")).unwrap_err();
        assert!(matches!(err, SecretError::NoSourceProvided));
    }

    #[test]
    fn test_file_not_found_error() {
        let err = resolve_secret(None, Some("/nonexistent/archreview/key"), None).unwrap_err();
        assert!(matches!(err, SecretError::FileRead { .. }));
    }

    #[test]
    fn test_expand_home_leaves_plain_paths() {
        assert_eq!(expand_home("/run/secrets/key"), "/run/secrets/key");
        assert_eq!(expand_home("relative/~/key"), "relative/~/key");
    }
}
