use std::path::PathBuf;
use std::sync::Arc;

use archreview::config::ServerConfig;
use archreview::{FeedbackLog, Pipeline};

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub feedback: Arc<FeedbackLog>,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(pipeline: Arc<Pipeline>, server: &ServerConfig) -> Self {
        Self {
            pipeline,
            feedback: Arc::new(FeedbackLog::new(&server.feedback_file)),
            upload_dir: PathBuf::from(&server.upload_dir),
            max_upload_bytes: server.max_upload_bytes,
        }
    }
}
