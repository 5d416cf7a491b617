use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Json},
};
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::CopyResponse;
use crate::services::export::{
    self, SPREADSHEET_FILE_NAME, SPREADSHEET_MIME, TEXT_FILE_NAME,
};
use crate::state::AppState;

fn attachment(file_name: &str) -> String {
    format!("attachment; filename=\"{}\"", file_name)
}

pub async fn export_spreadsheet_handler(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let results = state.store.snapshot().await;
    let bytes = export::spreadsheet_bytes(&results)?;
    Ok((
        [
            (header::CONTENT_TYPE, SPREADSHEET_MIME.to_string()),
            (header::CONTENT_DISPOSITION, attachment(SPREADSHEET_FILE_NAME)),
        ],
        bytes,
    ))
}

pub async fn export_text_handler(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let results = state.store.snapshot().await;
    if results.is_empty() {
        return Err(AppError::NoResults);
    }
    let text = export::plain_text(&results);
    info!(files = results.len(), bytes = text.len(), "Text export built");
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, attachment(TEXT_FILE_NAME)),
        ],
        text,
    ))
}

pub async fn copy_all_handler(State(state): State<AppState>) -> AppResult<Json<CopyResponse>> {
    let results = state.store.snapshot().await;
    if results.is_empty() {
        return Err(AppError::NoResults);
    }
    let (copied, characters) =
        export::copy_all_text(&results, state.clipboard.clone(), &state.acknowledgments).await;
    Ok(Json(CopyResponse::new(copied, characters)))
}
