use std::time::Instant;

use axum::{
    extract::{Path, State},
    response::{Html, Json},
};

use crate::error::AppResult;
use crate::models::CopyResponse;
use crate::services::viewer::{self, IndexPage, ResultsView};
use crate::state::AppState;

async fn current_view(state: &AppState) -> ResultsView {
    let results = state.store.snapshot().await;
    let active = state.acknowledgments.active_targets(Instant::now()).await;
    viewer::results_view(&results, &active)
}

pub async fn index_handler(State(state): State<AppState>) -> Html<String> {
    let results = current_view(&state).await;
    let selection = state.intake.lock().await.views();
    let notifications = state.notifications.latest().await;

    Html(viewer::render_index(&IndexPage {
        selection: &selection,
        notifications: &notifications,
        results: &results,
        busy: state.gate.in_progress(),
    }))
}

pub async fn results_handler(State(state): State<AppState>) -> Json<ResultsView> {
    Json(current_view(&state).await)
}

pub async fn copy_page_handler(
    State(state): State<AppState>,
    Path((file_index, page_index)): Path<(usize, usize)>,
) -> AppResult<Json<CopyResponse>> {
    let results = state.store.snapshot().await;
    let (copied, characters) = viewer::copy_page_text(
        &results,
        file_index,
        page_index,
        state.clipboard.clone(),
        &state.acknowledgments,
    )
    .await?;
    Ok(Json(CopyResponse::new(copied, characters)))
}
