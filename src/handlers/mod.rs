pub mod export;
pub mod extract;
pub mod health;
pub mod intake;
pub mod results;

pub use export::*;
pub use extract::*;
pub use health::*;
pub use intake::*;
pub use results::*;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{extraction_gate_middleware, logging_middleware};
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let submit = Router::new()
        .route("/api/submit", post(submit_handler))
        .route_layer(axum::middleware::from_fn_with_state(
            state.gate.clone(),
            extraction_gate_middleware,
        ));

    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .route(
            "/api/selection",
            get(get_selection_handler)
                .post(replace_selection_handler)
                .delete(clear_selection_handler),
        )
        .route("/previews/:id", get(preview_handler))
        .route("/api/results", get(results_handler))
        .route("/api/results/copy", post(copy_all_handler))
        .route("/api/results/:file/:page/copy", post(copy_page_handler))
        .route("/export/xlsx", get(export_spreadsheet_handler))
        .route("/export/txt", get(export_text_handler))
        .merge(submit)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(state.config.max_upload_bytes()))
                .layer(axum::middleware::from_fn(logging_middleware)),
        )
        .with_state(state)
}
