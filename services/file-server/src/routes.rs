use axum::extract::{DefaultBodyLimit, Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use merkle::wire::{CheckpointBody, DownloadResponse, UploadRequest, UploadResponse};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::ServiceError;
use crate::state::SharedState;

pub fn router(state: SharedState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/files", post(upload_file))
        .route("/files/:name", get(download_file))
        .route("/checkpoint", get(get_checkpoint))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

pub async fn upload_file(
    State(st): State<SharedState>,
    Json(req): Json<UploadRequest>,
) -> Result<Json<UploadResponse>, ServiceError> {
    if req.name.trim().is_empty() {
        return Err(ServiceError::BadRequest("file name must not be empty".into()));
    }
    info!(name = %req.name, bytes = req.content.len(), "UploadFile");

    let receipt = st.service.upload(&req.name, req.content).await?;
    let checkpoint = CheckpointBody::new(&receipt.checkpoint, &st.service.verifying_key());

    Ok(Json(UploadResponse {
        success: true,
        position: receipt.position as u64,
        checkpoint,
    }))
}

pub async fn download_file(
    State(st): State<SharedState>,
    Path(name): Path<String>,
) -> Result<Json<DownloadResponse>, ServiceError> {
    info!(name = %name, "DownloadFile");

    let download = st.service.download(&name).await?;
    Ok(Json(DownloadResponse::new(name, download.content, &download.proof)))
}

pub async fn get_checkpoint(
    State(st): State<SharedState>,
) -> Result<Json<CheckpointBody>, ServiceError> {
    let signed = st.service.checkpoint().await?;
    Ok(Json(CheckpointBody::new(&signed, &st.service.verifying_key())))
}
