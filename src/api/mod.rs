pub mod documents;
pub mod query;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;

use crate::error::PipelineError;
use crate::state::AppState;

const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(documents::health))
        .route("/api/stats", get(documents::stats))
        .route("/api/upload", post(documents::upload))
        .route("/api/query", post(query::query))
        .route("/api/retrieve", post(query::retrieve))
        // Unprefixed aliases for older clients
        .route("/stats", get(documents::stats))
        .route("/upload", post(documents::upload))
        .route("/query", post(query::query))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

/// Map a pipeline rejection onto an HTTP error pair.
pub fn pipeline_error(e: PipelineError) -> (StatusCode, String) {
    let status = if e.is_input_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, e.to_string())
}
