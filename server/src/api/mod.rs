pub mod handlers;
pub mod responses;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;
    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/review", post(handlers::review_handler))
        .route("/feedback", post(handlers::feedback_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
