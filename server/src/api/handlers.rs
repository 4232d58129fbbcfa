use std::path::{Path, PathBuf};

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::Json;
use serde::Deserialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use archreview::sanitize::{extension_of, secure_filename};
use archreview::FeedbackEntry;

use super::responses::{
    ApiError, FeedbackResponse, HealthResponse, ReviewResponse, HEALTH_MESSAGE,
};
use crate::state::AppState;

pub const ALLOWED_EXTENSIONS: [&str; 3] = ["pdf", "md", "txt"];

const UNSUPPORTED_TYPE_MESSAGE: &str = "Unsupported file type. Please upload PDF, MD, or TXT files";

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        message: HEALTH_MESSAGE,
    })
}

struct Upload {
    filename: String,
    data: Vec<u8>,
}

async fn read_upload(multipart: &mut Multipart) -> Result<Upload, ApiError> {
    loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::new(e.status(), e.body_text()))?;
        let Some(field) = field else {
            return Err(ApiError::bad_request("No file provided"));
        };
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::new(e.status(), e.body_text()))?;
        return Ok(Upload {
            filename,
            data: data.to_vec(),
        });
    }
}

fn allowed_file(filename: &str) -> bool {
    extension_of(filename).is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
}

/// `<uuid>_<sanitized name>` inside the upload directory.
fn stored_upload_path(upload_dir: &Path, filename: &str) -> PathBuf {
    let mut safe_name = secure_filename(filename);
    if extension_of(&safe_name).is_none() {
        // Sanitizing can strip everything but the extension
        let ext = extension_of(filename).unwrap_or_default();
        safe_name = format!("document.{}", ext);
    }
    upload_dir.join(format!("{}_{}", Uuid::new_v4(), safe_name))
}

pub async fn review_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ReviewResponse>, ApiError> {
    // A request that is not multipart carries no file at all
    let mut multipart = multipart.map_err(|_| ApiError::bad_request("No file provided"))?;
    let upload = read_upload(&mut multipart).await?;
    if upload.filename.is_empty() {
        return Err(ApiError::bad_request("No file selected"));
    }
    if !allowed_file(&upload.filename) {
        return Err(ApiError::bad_request(UNSUPPORTED_TYPE_MESSAGE));
    }

    let filename = secure_filename(&upload.filename);
    let stored_path = stored_upload_path(&state.upload_dir, &upload.filename);

    tokio::fs::create_dir_all(&state.upload_dir)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to prepare upload directory: {}", e)))?;
    tokio::fs::write(&stored_path, &upload.data)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to store upload: {}", e)))?;
    info!(filename = %filename, bytes = upload.data.len(), "File uploaded");

    let pipeline = state.pipeline.clone();
    let run_path = stored_path.to_string_lossy().into_owned();
    let joined = tokio::task::spawn_blocking(move || pipeline.run_pipeline(&run_path)).await;

    if let Err(e) = tokio::fs::remove_file(&stored_path).await {
        warn!(error = %e, "Failed to remove uploaded file");
    }

    let run = joined.map_err(|e| {
        error!(error = %e, "Review task failed");
        ApiError::internal(format!("Review processing failed: {}", e))
    })?;

    match run.into_result() {
        Ok(result) => {
            info!(chunks = result.chunks.len(), "Architecture review completed");
            Ok(Json(ReviewResponse {
                status: "success",
                filename,
                review: result.review_result.unwrap_or_default(),
                evaluation: result.evaluation_result.unwrap_or_default(),
                metadata: result.metadata,
                chunks_processed: result.chunks.len(),
                timestamp: chrono::Utc::now().to_rfc3339(),
            }))
        }
        Err((_, e)) => {
            error!(error = %e, "Review failed");
            Err(ApiError::internal(e.to_string()))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub review_id: String,
    #[serde(default)]
    pub comment: String,
}

pub async fn feedback_handler(
    State(state): State<AppState>,
    payload: Result<Json<FeedbackRequest>, JsonRejection>,
) -> Result<Json<FeedbackResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    info!(kind = %request.kind, review_id = %request.review_id, "Feedback received");

    let entry = FeedbackEntry::new(request.kind, request.review_id, request.comment);
    let log = state.feedback.clone();
    let written = tokio::task::spawn_blocking(move || log.append(&entry)).await;

    match written {
        Ok(Ok(())) => Ok(Json(FeedbackResponse {
            status: "success",
            message: "Feedback submitted successfully",
        })),
        Ok(Err(e)) => {
            error!(error = %e, "Could not save feedback");
            Err(ApiError::internal("Failed to submit feedback"))
        }
        Err(e) => {
            error!(error = %e, "Feedback task failed");
            Err(ApiError::internal("Failed to submit feedback"))
        }
    }
}
