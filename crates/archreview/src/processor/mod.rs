//! Plain-text extraction from uploaded documents.
//!
//! [`ProcessorRegistry`] routes a path to the processor for its extension.
//! The pipeline only sees the [`TextExtractor`] trait, so tests can swap in
//! canned text.

pub mod markdown;
pub mod pdf;
pub mod text;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ProcessError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Markdown,
    Text,
}

impl DocumentFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "md" | "markdown" => Some(Self::Markdown),
            "txt" => Some(Self::Text),
            _ => None,
        }
    }
}

pub trait DocumentProcessor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<String, ProcessError>;
    fn supports(&self, format: DocumentFormat) -> bool;
}

/// Path → plain text. The pipeline's view of document extraction.
pub trait TextExtractor: Send + Sync {
    fn extract_text(&self, path: &Path) -> Result<String, ProcessError>;
}

pub struct ProcessorRegistry {
    processors: Vec<Box<dyn DocumentProcessor>>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        let processors: Vec<Box<dyn DocumentProcessor>> = vec![
            Box::new(pdf::PdfProcessor::new()),
            Box::new(markdown::MarkdownProcessor::new()),
            Box::new(text::TextProcessor::new()),
        ];

        Self { processors }
    }

    pub fn process(&self, path: &Path) -> Result<String, ProcessError> {
        if !path.exists() {
            return Err(ProcessError::NotFound(path.to_path_buf()));
        }

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let format = DocumentFormat::from_extension(extension)
            .ok_or_else(|| ProcessError::UnsupportedFormat(extension.to_string()))?;

        for processor in &self.processors {
            if processor.supports(format) {
                return processor.extract(path);
            }
        }

        Err(ProcessError::UnsupportedFormat(extension.to_string()))
    }
}

impl Default for ProcessorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TextExtractor for ProcessorRegistry {
    fn extract_text(&self, path: &Path) -> Result<String, ProcessError> {
        self.process(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_registry_routes_text_format() {
        let registry = ProcessorRegistry::new();

        let mut temp_file = NamedTempFile::with_suffix(".txt").unwrap();
        writeln!(temp_file, "Service A talks to service B").unwrap();

        let text = registry.process(temp_file.path()).unwrap();
        assert!(text.contains("Service A talks to service B"));
    }

    #[test]
    fn test_registry_routes_md_format() {
        let registry = ProcessorRegistry::new();

        let mut temp_file = NamedTempFile::with_suffix(".md").unwrap();
        writeln!(temp_file, "# Overview\n\nThe **gateway** fronts all traffic.").unwrap();

        let text = registry.process(temp_file.path()).unwrap();
        assert_eq!(text, "Overview\nThe gateway fronts all traffic.");
    }

    #[test]
    fn test_unsupported_format_error() {
        let registry = ProcessorRegistry::new();

        let temp_file = NamedTempFile::with_suffix(".docx").unwrap();
        std::fs::write(temp_file.path(), b"binary").unwrap();

        match registry.process(temp_file.path()) {
            Err(ProcessError::UnsupportedFormat(ext)) => assert_eq!(ext, "docx"),
            other => panic!("Expected UnsupportedFormat error, got {:?}", other),
        }
    }

    #[test]
    fn test_no_extension_error() {
        let registry = ProcessorRegistry::new();

        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("noextension");
        std::fs::write(&file_path, b"some content").unwrap();

        match registry.process(&file_path) {
            Err(ProcessError::UnsupportedFormat(ext)) => assert_eq!(ext, ""),
            other => panic!("Expected UnsupportedFormat error, got {:?}", other),
        }
    }

    #[test]
    fn test_file_not_found_error() {
        let registry = ProcessorRegistry::new();

        let result = registry.process(Path::new("/nonexistent/path/design.md"));
        assert!(matches!(result, Err(ProcessError::NotFound(_))));
    }

    #[test]
    fn test_format_from_extension_is_case_insensitive() {
        assert_eq!(DocumentFormat::from_extension("PDF"), Some(DocumentFormat::Pdf));
        assert_eq!(DocumentFormat::from_extension("Md"), Some(DocumentFormat::Markdown));
        assert_eq!(DocumentFormat::from_extension("docx"), None);
    }
}
