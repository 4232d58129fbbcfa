//! archreview command line
//!
//! Reviews a single architecture document from the terminal, or serves the
//! review pipeline over HTTP.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::net::TcpListener;

use archreview::pipeline::LogProgress;
use archreview::{load_config_or_default, Config, DocumentMetadata, Pipeline};
use archreview_server::logging::{init_logging, LogFormat};
use archreview_server::{build_router, AppState};

#[derive(Parser)]
#[command(name = "archreview")]
#[command(about = "LLM review of software architecture documents", long_about = None)]
struct Cli {
    /// Path to configuration file (defaults to the per-user config, if any)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Review one document and print the result
    Review {
        /// PDF, Markdown or plain text document
        file: PathBuf,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Serve the HTTP API
    Serve {
        /// Address to listen on, overrides `server.bind`
        #[arg(short, long)]
        bind: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.log_format) {
        eprintln!("Failed to initialize logging: {:#}", e);
        return ExitCode::FAILURE;
    }

    let result = match cli.command {
        Commands::Review { file, json } => review_command(cli.config, file, json),
        Commands::Serve { bind } => serve_command(cli.config, bind),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<PathBuf>) -> Result<Config> {
    load_config_or_default(path.as_deref()).context("Failed to load configuration")
}

#[derive(Serialize)]
struct ReviewReport<'a> {
    file: String,
    review: &'a str,
    evaluation: &'a str,
    metadata: Option<&'a DocumentMetadata>,
    chunks_processed: usize,
}

fn review_command(config_path: Option<PathBuf>, file: PathBuf, json: bool) -> Result<ExitCode> {
    let config = load_config(config_path)?;
    let pipeline = Pipeline::from_config(&config).context("Failed to build pipeline")?;

    let file_path = file.to_string_lossy().into_owned();
    let state = match pipeline.run(&file_path, &LogProgress).into_result() {
        Ok(state) => state,
        Err((_, e)) => {
            tracing::error!(file = %file_path, "{}", e);
            eprintln!("Error: {}", e);
            return Ok(ExitCode::FAILURE);
        }
    };

    let report = ReviewReport {
        file: file_path,
        review: state.review_result.as_deref().unwrap_or_default(),
        evaluation: state.evaluation_result.as_deref().unwrap_or_default(),
        metadata: state.metadata.as_ref(),
        chunks_processed: state.chunks.len(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(ExitCode::SUCCESS);
    }

    if let Some(metadata) = report.metadata {
        println!("=== {} ===", metadata.title);
        println!("{}", metadata.summary);
        if !metadata.topics.is_empty() {
            println!("Topics: {}", metadata.topics.join(", "));
        }
        println!();
    }
    println!("=== Review ({} chunks) ===", report.chunks_processed);
    println!("{}", report.review);
    println!();
    println!("=== Evaluation ===");
    println!("{}", report.evaluation);

    Ok(ExitCode::SUCCESS)
}

fn serve_command(config_path: Option<PathBuf>, bind: Option<String>) -> Result<ExitCode> {
    let mut config = load_config(config_path)?;
    if let Some(bind) = bind {
        config.server.bind = bind;
    }

    // The LLM client is blocking; build it and drop the last handle outside
    // the async runtime.
    let pipeline = Arc::new(Pipeline::from_config(&config).context("Failed to build pipeline")?);
    let state = AppState::new(pipeline.clone(), &config.server);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;
    runtime.block_on(serve(state, &config.server.bind))?;
    drop(runtime);
    drop(pipeline);

    Ok(ExitCode::SUCCESS)
}

async fn serve(state: AppState, bind: &str) -> Result<()> {
    std::fs::create_dir_all(&state.upload_dir).with_context(|| {
        format!(
            "Failed to create upload directory {}",
            state.upload_dir.display()
        )
    })?;

    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    tracing::info!("archreview listening on {}", listener.local_addr()?);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutting down");
        })
        .await
        .context("Server failed")
}
