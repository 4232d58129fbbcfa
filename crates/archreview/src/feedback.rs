//! Append-only log of user feedback on reviews, one JSON object per line.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FeedbackError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub review_id: String,
    pub comment: String,
    pub timestamp: DateTime<Utc>,
}

impl FeedbackEntry {
    pub fn new(
        kind: impl Into<String>,
        review_id: impl Into<String>,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            review_id: review_id.into(),
            comment: comment.into(),
            timestamp: Utc::now(),
        }
    }
}

pub struct FeedbackLog {
    path: PathBuf,
    // Serializes appends so concurrent writers never interleave lines
    write_lock: Mutex<()>,
}

impl FeedbackLog {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, entry: &FeedbackEntry) -> Result<(), FeedbackError> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| FeedbackError::Write {
                path: self.path.clone(),
                source,
            })?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| FeedbackError::Write {
                path: self.path.clone(),
                source,
            })?;
        file.write_all(line.as_bytes())
            .map_err(|source| FeedbackError::Write {
                path: self.path.clone(),
                source,
            })?;

        tracing::debug!(review_id = %entry.review_id, "Feedback recorded");
        Ok(())
    }
}
