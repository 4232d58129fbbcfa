use std::path::Path;
use std::sync::Arc;

use tracing::{info, info_span, warn};

use crate::analysis::{summarize_metadata, ArchitectureEvaluator, ArchitectureReviewer};
use crate::chunker::Tokenizer;
use crate::config::Config;
use crate::error::{ArchReviewError, ProcessError};
use crate::llm::{ChatCompletionsClient, LlmClient};
use crate::processor::{ProcessorRegistry, TextExtractor};
use crate::prompts::PromptRenderer;
use crate::sanitize;

use super::config::PipelineConfig;
use super::error::PipelineError;
use super::fanout::{aggregate, analyze_chunks, AnalysisKind, ChunkResult};
use super::progress::{NoopProgress, ProgressEvent, ProgressReporter};
use super::stage::Stage;
use super::state::{PipelineRun, PipelineState};

pub struct Pipeline {
    config: Arc<PipelineConfig>,
    extractor: Arc<dyn TextExtractor>,
    llm: Arc<dyn LlmClient>,
    renderer: PromptRenderer,
    tokenizer: Tokenizer,
    reviewer: ArchitectureReviewer,
    evaluator: ArchitectureEvaluator,
}

impl Pipeline {
    /// Production constructor: document processors plus the chat-completions
    /// client described by `config`.
    pub fn from_config(config: &Config) -> Result<Self, ArchReviewError> {
        let llm = Arc::new(ChatCompletionsClient::from_config(config)?);
        Ok(Self::new(
            Arc::new(PipelineConfig::from_config(config)),
            Arc::new(ProcessorRegistry::new()),
            llm,
        ))
    }

    /// Builds a pipeline around the given collaborators.
    pub fn new(
        config: Arc<PipelineConfig>,
        extractor: Arc<dyn TextExtractor>,
        llm: Arc<dyn LlmClient>,
    ) -> Self {
        let renderer = match &config.prompts_directory {
            Some(dir) => PromptRenderer::with_override_dir(dir),
            None => PromptRenderer::new(),
        };
        let tokenizer = Tokenizer::for_model(&config.model_name);
        let reviewer = ArchitectureReviewer::new(renderer.clone(), Arc::clone(&llm));
        let evaluator = ArchitectureEvaluator::new(renderer.clone(), Arc::clone(&llm));

        Self {
            config,
            extractor,
            llm,
            renderer,
            tokenizer,
            reviewer,
            evaluator,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs every stage for one document with no progress reporting.
    pub fn run_pipeline(&self, file_path: &str) -> PipelineRun {
        self.run(file_path, &NoopProgress)
    }

    /// Runs Ingest, Metadata, Review and Evaluate in order. Once a stage
    /// fails the remaining stages leave the run untouched.
    pub fn run(&self, file_path: &str, progress: &dyn ProgressReporter) -> PipelineRun {
        let filename = sanitize::redact_path(Path::new(file_path));
        let _pipeline_span = info_span!("pipeline", filename = %filename).entered();

        let run = PipelineRun::start(file_path);
        let run = self.stage(run, Stage::Ingest, progress, |state| self.ingest(state));
        let run = self.stage(run, Stage::Metadata, progress, |state| self.metadata(state));
        let run = self.stage(run, Stage::Review, progress, |state| {
            self.review(state, progress)
        });
        let run = self.stage(run, Stage::Evaluate, progress, |state| {
            self.evaluate(state, progress)
        });

        match &run {
            PipelineRun::Active(state) => {
                info!("Pipeline finished ({} chunks)", state.chunks.len());
                progress.report(ProgressEvent::Completed {
                    chunks: state.chunks.len(),
                });
            }
            PipelineRun::Failed { error, .. } => {
                warn!("Pipeline failed: {}", error);
                progress.report(ProgressEvent::Failed {
                    stage: error.stage(),
                    error: error.to_string(),
                });
            }
        }

        run
    }

    /// Wraps one step in its span and progress event. Failed runs skip the
    /// step entirely.
    fn stage<F>(
        &self,
        run: PipelineRun,
        stage: Stage,
        progress: &dyn ProgressReporter,
        step: F,
    ) -> PipelineRun
    where
        F: FnOnce(&mut PipelineState) -> Result<(), PipelineError>,
    {
        if run.is_failed() {
            warn!("Skipping {} stage due to upstream error", stage);
            return run;
        }

        let _span = info_span!("stage", stage = %stage).entered();
        progress.report(ProgressEvent::StageStarted { stage });
        run.advance(step)
    }

    fn ingest(&self, state: &mut PipelineState) -> Result<(), PipelineError> {
        if state.file_path.trim().is_empty() {
            return Err(PipelineError::at(Stage::Ingest, ProcessError::MissingPath));
        }

        let doc = self
            .extractor
            .extract_text(Path::new(&state.file_path))
            .map_err(|e| PipelineError::at(Stage::Ingest, e))?;
        if doc.trim().is_empty() {
            return Err(PipelineError::at(Stage::Ingest, ProcessError::EmptyDocument));
        }

        let max_tokens = self.config.max_tokens;
        let token_count = self.tokenizer.count_tokens(&doc);
        info!("Ingesting document ({} tokens)", token_count);

        let chunks = if token_count > max_tokens {
            let chunks = self.tokenizer.chunk_text(&doc, max_tokens);
            info!(
                "Document exceeds {} tokens, split into {} chunks",
                max_tokens,
                chunks.len()
            );
            chunks
        } else {
            vec![doc.clone()]
        };

        if chunks.is_empty() {
            return Err(PipelineError::NoChunks {
                stage: Stage::Ingest,
            });
        }

        state.doc = doc;
        state.chunks = chunks;
        Ok(())
    }

    fn metadata(&self, state: &mut PipelineState) -> Result<(), PipelineError> {
        if state.doc.trim().is_empty() {
            return Err(PipelineError::MissingDocument);
        }

        info!("Generating metadata and summary");
        let metadata = summarize_metadata(&self.renderer, self.llm.as_ref(), &state.doc)
            .map_err(|e| PipelineError::at(Stage::Metadata, e))?;

        state.metadata = Some(metadata);
        Ok(())
    }

    fn review(
        &self,
        state: &mut PipelineState,
        progress: &dyn ProgressReporter,
    ) -> Result<(), PipelineError> {
        let results = self.fan_out(state, Stage::Review, progress, |chunk| {
            self.reviewer.review(chunk)
        })?;
        state.review_result = Some(aggregate(AnalysisKind::Review, &results));
        Ok(())
    }

    fn evaluate(
        &self,
        state: &mut PipelineState,
        progress: &dyn ProgressReporter,
    ) -> Result<(), PipelineError> {
        let results = self.fan_out(state, Stage::Evaluate, progress, |chunk| {
            self.evaluator.evaluate(chunk)
        })?;
        state.evaluation_result = Some(aggregate(AnalysisKind::Evaluation, &results));
        Ok(())
    }

    fn fan_out<F>(
        &self,
        state: &PipelineState,
        stage: Stage,
        progress: &dyn ProgressReporter,
        analyze: F,
    ) -> Result<Vec<ChunkResult>, PipelineError>
    where
        F: Fn(&str) -> Result<String, ArchReviewError> + Sync,
    {
        if state.chunks.is_empty() {
            return Err(PipelineError::NoChunks { stage });
        }

        let total = state.chunks.len();
        let results = analyze_chunks(
            &state.chunks,
            self.config.chunk_workers,
            analyze,
            |index, succeeded| {
                progress.report(ProgressEvent::ChunkFinished {
                    stage,
                    index,
                    total,
                    succeeded,
                })
            },
        );

        let failed = results.iter().filter(|r| r.is_err()).count();
        if failed > 0 {
            warn!("{} of {} chunks failed in {} stage", failed, total, stage);
        }

        Ok(results)
    }
}
