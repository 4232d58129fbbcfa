pub mod config;
pub mod error;
pub mod fanout;
pub mod progress;
pub mod runner;
pub mod stage;
pub mod state;

pub use config::PipelineConfig;
pub use error::PipelineError;
pub use fanout::{aggregate, analyze_chunks, AnalysisKind, ChunkError, ChunkResult};
pub use progress::{LogProgress, NoopProgress, ProgressEvent, ProgressReporter};
pub use runner::Pipeline;
pub use stage::Stage;
pub use state::{PipelineRun, PipelineState};
