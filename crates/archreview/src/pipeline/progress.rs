use tracing::{info, warn};

use super::stage::Stage;

/// Events emitted by the pipeline during a run.
/// `ChunkFinished` arrives from worker threads in completion order.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    StageStarted {
        stage: Stage,
    },
    ChunkFinished {
        stage: Stage,
        index: usize,
        total: usize,
        succeeded: bool,
    },
    Completed {
        chunks: usize,
    },
    Failed {
        stage: Stage,
        error: String,
    },
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// No-op reporter for tests and library callers.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Writes each event to the log.
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::StageStarted { stage } => info!("Starting {} stage", stage),
            ProgressEvent::ChunkFinished {
                stage,
                index,
                total,
                succeeded,
            } => {
                if succeeded {
                    info!("{}: chunk {}/{} done", stage, index + 1, total);
                } else {
                    warn!("{}: chunk {}/{} failed", stage, index + 1, total);
                }
            }
            ProgressEvent::Completed { chunks } => {
                info!("Review complete ({} chunks)", chunks)
            }
            ProgressEvent::Failed { stage, error } => warn!("Run failed at {}: {}", stage, error),
        }
    }
}
