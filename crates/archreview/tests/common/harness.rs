//! Test harness for isolated pipeline runs.
//!
//! Each harness owns a temp directory with `input/` and `config/`
//! subdirectories and builds pipelines around the real document processors
//! and a scripted LLM.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use archreview::pipeline::{Pipeline, PipelineConfig};
use archreview::processor::ProcessorRegistry;

use super::llm::ScriptedLlm;

pub struct TestHarness {
    temp_dir: TempDir,
    pub input_dir: PathBuf,
    pub config_dir: PathBuf,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let input_dir = temp_dir.path().join("input");
        let config_dir = temp_dir.path().join("config");

        std::fs::create_dir_all(&input_dir).expect("Failed to create input dir");
        std::fs::create_dir_all(&config_dir).expect("Failed to create config dir");

        Self {
            temp_dir,
            input_dir,
            config_dir,
        }
    }

    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn write_input(&self, filename: &str, content: &[u8]) -> PathBuf {
        let path = self.input_dir.join(filename);
        std::fs::write(&path, content).expect("Failed to write input file");
        path
    }

    pub fn write_text_input(&self, filename: &str, content: &str) -> PathBuf {
        self.write_input(filename, content.as_bytes())
    }

    pub fn write_config(&self, filename: &str, yaml: &str) -> PathBuf {
        let path = self.config_dir.join(filename);
        std::fs::write(&path, yaml).expect("Failed to write config file");
        path
    }

    /// Pipeline over the real processors with the given chunk budget.
    pub fn pipeline(&self, llm: Arc<ScriptedLlm>, max_tokens: usize) -> Pipeline {
        self.pipeline_with_config(
            llm,
            PipelineConfig {
                max_tokens,
                chunk_workers: 3,
                ..PipelineConfig::default()
            },
        )
    }

    pub fn pipeline_with_config(&self, llm: Arc<ScriptedLlm>, config: PipelineConfig) -> Pipeline {
        Pipeline::new(Arc::new(config), Arc::new(ProcessorRegistry::new()), llm)
    }
}

/// Absolute path of a file under `tests/fixtures/`.
pub fn fixture_path(relative: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(relative)
}

/// An architecture document of roughly `paragraphs * 120` tokens, one
/// labelled paragraph per section.
pub fn long_document(paragraphs: usize) -> String {
    (0..paragraphs)
        .map(|i| {
            format!(
                "Section {}: {}",
                i + 1,
                "Each service owns its data store and exposes it only through a versioned API. "
                    .repeat(8)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
