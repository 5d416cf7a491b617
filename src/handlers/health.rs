use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use tracing::info;

use crate::models::HealthResponse;
use crate::state::AppState;

/// Health check endpoint
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let (submits_total, submits_rejected) = state.gate.metrics();
    let result_files = state.store.snapshot().await.len();
    let pending_files = state.intake.lock().await.len();
    let extraction_in_progress = state.gate.in_progress();

    info!(
        result_files,
        pending_files,
        extraction_in_progress,
        "Health check completed"
    );

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        extraction_api_url: state.client.base_url().to_string(),
        extraction_in_progress,
        result_files,
        pending_files,
        submits_total,
        submits_rejected,
    })
}

/// Readiness check endpoint
pub async fn ready_handler() -> StatusCode {
    StatusCode::OK
}
