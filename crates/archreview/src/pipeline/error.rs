use thiserror::Error;

use super::stage::Stage;
use crate::error::ArchReviewError;

/// Run-level failure. Per-chunk failures never become a `PipelineError`;
/// they are reported inline in the aggregated results.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Error in {stage} stage: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: ArchReviewError,
    },

    #[error("Error in {stage} stage: no chunks to analyse")]
    NoChunks { stage: Stage },

    #[error("Error in metadata stage: document is empty or missing")]
    MissingDocument,
}

impl PipelineError {
    pub fn at(stage: Stage, source: impl Into<ArchReviewError>) -> Self {
        Self::Stage {
            stage,
            source: source.into(),
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            Self::Stage { stage, .. } | Self::NoChunks { stage } => *stage,
            Self::MissingDocument => Stage::Metadata,
        }
    }
}
