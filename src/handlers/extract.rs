use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use std::time::Instant;
use tracing::{error, info};

use crate::error::AppResult;
use crate::models::{Notification, SubmitResponse};
use crate::state::AppState;

/// Runs one upload cycle over the held selection. Results are committed only
/// when every request of the cycle succeeded; otherwise the previous results
/// stay and a single error notification is published.
pub async fn submit_handler(
    State(state): State<AppState>,
) -> AppResult<(StatusCode, Json<SubmitResponse>)> {
    let start = Instant::now();
    let request_id = uuid::Uuid::new_v4().to_string()[..8].to_string();

    let selection = state.intake.lock().await.submit();
    let Some(files) = selection else {
        info!(request_id = %request_id, "Submit without a selection, nothing to do");
        return Ok((StatusCode::OK, Json(SubmitResponse::skipped())));
    };

    info!(request_id = %request_id, files = files.len(), "Starting upload cycle");

    match state.client.extract(&files).await {
        Ok(outcome) => {
            let file_count = outcome.results.len();
            let page_count = outcome.page_count();
            state.store.replace(outcome.results).await;
            state.notifications.publish(outcome.notifications.clone()).await;

            let total_time = start.elapsed().as_millis() as u64;
            info!(
                request_id = %request_id,
                files = file_count,
                pages = page_count,
                total_time_ms = total_time,
                "Upload cycle completed"
            );
            Ok((
                StatusCode::OK,
                Json(SubmitResponse::completed(
                    file_count,
                    page_count,
                    outcome.notifications,
                    total_time,
                )),
            ))
        }
        Err(e) if e.is_transport() => {
            error!(
                request_id = %request_id,
                error_code = e.error_code(),
                error = %e,
                "Upload cycle failed, keeping previous results"
            );
            let notification = Notification::error(e.user_message());
            state.notifications.publish(vec![notification.clone()]).await;
            Ok((
                e.status_code(),
                Json(SubmitResponse::failed(
                    notification,
                    start.elapsed().as_millis() as u64,
                )),
            ))
        }
        Err(e) => {
            state
                .notifications
                .publish(vec![Notification::error(e.user_message())])
                .await;
            Err(e)
        }
    }
}
