//! Extract Desk
//!
//! A local web front end for an external text-extraction API: select images
//! or PDFs, send them off for extraction, read the text next to page
//! previews, and export it as a spreadsheet, a transcript or to the
//! clipboard.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;
pub mod telemetry;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use handlers::create_router;
pub use state::AppState;
