use std::path::Path;

use crate::error::ProcessError;
use crate::processor::{DocumentFormat, DocumentProcessor};

pub struct TextProcessor;

impl TextProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TextProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentProcessor for TextProcessor {
    /// Reads the file as UTF-8, unchanged.
    fn extract(&self, path: &Path) -> Result<String, ProcessError> {
        std::fs::read_to_string(path).map_err(|source| ProcessError::ReadDocument {
            path: path.to_path_buf(),
            source,
        })
    }

    fn supports(&self, format: DocumentFormat) -> bool {
        matches!(format, DocumentFormat::Text)
    }
}
