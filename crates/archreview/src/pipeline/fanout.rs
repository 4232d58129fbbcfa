//! Per-chunk analysis on a bounded worker pool, with results joined back in
//! chunk order.

use std::any::Any;
use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};
use std::thread;

use crossbeam_channel::bounded;
use log::{debug, error};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisKind {
    Review,
    Evaluation,
}

impl AnalysisKind {
    fn heading(self) -> &'static str {
        match self {
            Self::Review => "Review",
            Self::Evaluation => "Evaluation",
        }
    }

    fn verb(self) -> &'static str {
        match self {
            Self::Review => "reviewing",
            Self::Evaluation => "evaluating",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChunkError {
    #[error("{0}")]
    Failed(String),

    #[error("analysis panicked: {0}")]
    Panicked(String),

    #[error("no result was produced")]
    Missing,
}

pub type ChunkResult = Result<String, ChunkError>;

/// Runs `analyze` over every chunk on up to `workers` threads.
///
/// The returned vector is in chunk order regardless of completion order.
/// An error or panic in one analysis becomes that chunk's `Err` and does not
/// affect the others. `on_finished(index, succeeded)` is called from the
/// worker thread as each chunk completes.
pub fn analyze_chunks<F, E, P>(
    chunks: &[String],
    workers: usize,
    analyze: F,
    on_finished: P,
) -> Vec<ChunkResult>
where
    F: Fn(&str) -> Result<String, E> + Sync,
    E: Display,
    P: Fn(usize, bool) + Sync,
{
    if chunks.is_empty() {
        return Vec::new();
    }

    let worker_count = workers.clamp(1, chunks.len());
    let (job_sender, job_receiver) = bounded::<usize>(chunks.len());
    let (result_sender, result_receiver) = bounded::<(usize, ChunkResult)>(chunks.len());

    for index in 0..chunks.len() {
        if job_sender.send(index).is_err() {
            break;
        }
    }
    drop(job_sender);

    thread::scope(|scope| {
        for worker_id in 0..worker_count {
            let job_rx = job_receiver.clone();
            let result_tx = result_sender.clone();
            let analyze = &analyze;
            let on_finished = &on_finished;

            scope.spawn(move || {
                debug!("Chunk worker {} started", worker_id);
                for index in job_rx.iter() {
                    let outcome = run_isolated(|| analyze(chunks[index].as_str()));
                    on_finished(index, outcome.is_ok());
                    if let Err(e) = result_tx.send((index, outcome)) {
                        error!("Chunk worker {} failed to send result: {}", worker_id, e);
                        break;
                    }
                }
                debug!("Chunk worker {} stopped", worker_id);
            });
        }
    });
    drop(result_sender);

    let mut slots: Vec<Option<ChunkResult>> = vec![None; chunks.len()];
    for (index, outcome) in result_receiver.try_iter() {
        slots[index] = Some(outcome);
    }

    slots
        .into_iter()
        .map(|slot| slot.unwrap_or(Err(ChunkError::Missing)))
        .collect()
}

fn run_isolated<F, E>(analyze: F) -> ChunkResult
where
    F: FnOnce() -> Result<String, E>,
    E: Display,
{
    match panic::catch_unwind(AssertUnwindSafe(analyze)) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(ChunkError::Failed(e.to_string())),
        Err(payload) => Err(ChunkError::Panicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Joins per-chunk results into one report, 1-indexed, blank line between
/// sections.
pub fn aggregate(kind: AnalysisKind, results: &[ChunkResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, result)| match result {
            Ok(text) => format!("Chunk {} {}:\n{}", i + 1, kind.heading(), text),
            Err(e) => format!("Error {} chunk {}: {}", kind.verb(), i + 1, e),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
