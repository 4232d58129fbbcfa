//! Shared test utilities for archreview integration tests.
//!
//! - `TestHarness` for isolated runs in a temp directory
//! - `ScriptedLlm`, an in-process stand-in for the chat-completions API

pub mod harness;
pub mod llm;

pub use harness::{fixture_path, long_document, TestHarness};
pub use llm::ScriptedLlm;
