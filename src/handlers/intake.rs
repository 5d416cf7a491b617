use axum::{
    extract::{Multipart, Path, State},
    http::header,
    response::{IntoResponse, Json},
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{SelectionResponse, UploadedFile};
use crate::state::AppState;

pub async fn get_selection_handler(State(state): State<AppState>) -> Json<SelectionResponse> {
    let intake = state.intake.lock().await;
    Json(SelectionResponse::new(intake.views()))
}

/// Drag-drop and picker both land here with a multipart body of repeated
/// `files` fields.
pub async fn replace_selection_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<SelectionResponse>> {
    let files = read_files(&mut multipart).await?;
    info!(
        files = files.len(),
        bytes = files.iter().map(|f| f.size).sum::<usize>(),
        "Selection received"
    );

    let mut intake = state.intake.lock().await;
    intake.accept_selection(Some(files));
    Ok(Json(SelectionResponse::new(intake.views())))
}

pub async fn clear_selection_handler(State(state): State<AppState>) -> Json<SelectionResponse> {
    let mut intake = state.intake.lock().await;
    intake.clear();
    Json(SelectionResponse::new(intake.views()))
}

pub async fn preview_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let preview = state
        .intake
        .lock()
        .await
        .preview(&id)
        .ok_or_else(|| AppError::not_found("Preview"))?;
    Ok((
        [(header::CONTENT_TYPE, preview.mime_type.clone())],
        preview.data.clone(),
    ))
}

async fn read_files(multipart: &mut Multipart) -> AppResult<Vec<UploadedFile>> {
    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or("");
        if field_name != "files" && field_name != "file" {
            debug!(field = field_name, "Ignoring multipart field");
            continue;
        }

        let file_name = field.file_name().unwrap_or("").to_string();
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await?;

        // An empty picker submits one nameless, empty part.
        if file_name.is_empty() && data.is_empty() {
            continue;
        }

        let file = UploadedFile::from_upload(
            if file_name.is_empty() { "unnamed".to_string() } else { file_name },
            content_type.as_deref(),
            data,
        );
        debug!(
            file_name = %file.name,
            mime_type = %file.mime_type,
            size = file.size,
            "Read selected file"
        );
        files.push(file);
    }
    Ok(files)
}
