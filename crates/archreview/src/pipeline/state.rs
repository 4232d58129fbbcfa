use serde::Serialize;

use super::error::PipelineError;
use crate::analysis::DocumentMetadata;

/// Everything one run has produced so far.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineState {
    pub file_path: String,

    // Set by ingest
    pub doc: String,
    pub chunks: Vec<String>,

    // Set by the analysis stages
    pub metadata: Option<DocumentMetadata>,
    pub review_result: Option<String>,
    pub evaluation_result: Option<String>,
}

impl PipelineState {
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            ..Self::default()
        }
    }
}

/// A run is either still going or has failed at some stage. A failed run
/// keeps the state collected before the failure and is never advanced.
#[derive(Debug)]
pub enum PipelineRun {
    Active(PipelineState),
    Failed {
        state: PipelineState,
        error: PipelineError,
    },
}

impl PipelineRun {
    pub fn start(file_path: impl Into<String>) -> Self {
        Self::Active(PipelineState::new(file_path))
    }

    /// Applies `step` to an active run. A step error moves the run to
    /// `Failed` with whatever the step had already written; a failed run
    /// passes through untouched.
    pub fn advance<F>(self, step: F) -> Self
    where
        F: FnOnce(&mut PipelineState) -> Result<(), PipelineError>,
    {
        match self {
            Self::Active(mut state) => match step(&mut state) {
                Ok(()) => Self::Active(state),
                Err(error) => Self::Failed { state, error },
            },
            failed @ Self::Failed { .. } => failed,
        }
    }

    pub fn state(&self) -> &PipelineState {
        match self {
            Self::Active(state) | Self::Failed { state, .. } => state,
        }
    }

    pub fn into_state(self) -> PipelineState {
        match self {
            Self::Active(state) | Self::Failed { state, .. } => state,
        }
    }

    pub fn error(&self) -> Option<&PipelineError> {
        match self {
            Self::Active(_) => None,
            Self::Failed { error, .. } => Some(error),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn into_result(self) -> Result<PipelineState, (PipelineState, PipelineError)> {
        match self {
            Self::Active(state) => Ok(state),
            Self::Failed { state, error } => Err((state, error)),
        }
    }
}
