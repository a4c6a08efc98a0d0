use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;

use crate::api::pipeline_error;
use crate::models::{StatsResponse, UploadResponse};
use crate::state::AppState;

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "llm_provider": state.config.llm.provider_name(),
        "documents_loaded": state.knowledge.passage_count(),
    }))
}

/// GET /api/stats (also /stats)
pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.knowledge.stats())
}

/// POST /api/upload (also /upload): replace the corpus with the uploaded files.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, (StatusCode, String)> {
    let mut files: Vec<(String, Vec<u8>)> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("Invalid upload: {e}")))?
    {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field.bytes().await.map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                format!("Failed to read {filename}: {e}"),
            )
        })?;
        files.push((filename, bytes.to_vec()));
    }

    let names: Vec<String> = files.iter().map(|(name, _)| name.clone()).collect();
    tracing::info!("Upload of {} files: {}", names.len(), names.join(", "));

    let report = state
        .knowledge
        .ingest_uploads(files)
        .await
        .map_err(pipeline_error)?;

    Ok(Json(UploadResponse {
        message: format!("Successfully processed {} documents", report.documents),
        chunks_created: report.passages,
        files: names,
        report,
    }))
}
