use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Could not read uploaded files: {message}")]
    InvalidUpload { message: String },

    #[error("An extraction is already running")]
    ExtractionInProgress,

    #[error("Extraction API request failed: {message}")]
    Transport { message: String },

    #[error("Extraction API answered {status} for {endpoint}")]
    UpstreamStatus { endpoint: String, status: u16 },

    #[error("Extraction API returned a malformed payload from {endpoint}: {message}")]
    MalformedResponse { endpoint: String, message: String },

    #[error("Extraction API request timed out")]
    Timeout,

    #[error("No extracted text to export")]
    NoResults,

    #[error("Not found: {what}")]
    NotFound { what: String },

    #[error("Clipboard unavailable: {message}")]
    Clipboard { message: String },

    #[error("Spreadsheet export failed: {message}")]
    Spreadsheet { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl AppError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidUpload { .. } => "INVALID_UPLOAD",
            AppError::ExtractionInProgress => "EXTRACTION_IN_PROGRESS",
            AppError::Transport { .. } => "TRANSPORT_ERROR",
            AppError::UpstreamStatus { .. } => "UPSTREAM_STATUS",
            AppError::MalformedResponse { .. } => "MALFORMED_RESPONSE",
            AppError::Timeout => "UPSTREAM_TIMEOUT",
            AppError::NoResults => "NO_RESULTS",
            AppError::NotFound { .. } => "NOT_FOUND",
            AppError::Clipboard { .. } => "CLIPBOARD_ERROR",
            AppError::Spreadsheet { .. } => "SPREADSHEET_ERROR",
            AppError::ConfigError { .. } => "CONFIG_ERROR",
            AppError::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidUpload { .. } => StatusCode::BAD_REQUEST,
            AppError::ExtractionInProgress => StatusCode::CONFLICT,
            AppError::Transport { .. } => StatusCode::BAD_GATEWAY,
            AppError::UpstreamStatus { .. } => StatusCode::BAD_GATEWAY,
            AppError::MalformedResponse { .. } => StatusCode::BAD_GATEWAY,
            AppError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            AppError::NoResults => StatusCode::CONFLICT,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Clipboard { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Spreadsheet { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ConfigError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short, non-technical text shown to the user. The technical detail only
    /// goes to the log.
    pub fn user_message(&self) -> String {
        match self {
            AppError::InvalidUpload { .. } => "The selected files could not be read".to_string(),
            AppError::ExtractionInProgress => {
                "Please wait for the current extraction to finish".to_string()
            }
            e if e.is_transport() => "Failed to extract text from the uploaded files".to_string(),
            AppError::NoResults => "There is no extracted text yet".to_string(),
            AppError::NotFound { what } => format!("{} not found", what),
            AppError::Clipboard { .. } => "Could not access the clipboard".to_string(),
            AppError::Spreadsheet { .. } => "Could not build the spreadsheet".to_string(),
            _ => "Something went wrong".to_string(),
        }
    }

    /// Failures talking to the Extraction API. These abort an upload cycle
    /// and never reach the result store.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            AppError::Transport { .. }
                | AppError::UpstreamStatus { .. }
                | AppError::MalformedResponse { .. }
                | AppError::Timeout
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let detail = self.to_string();
        let request_id = Uuid::new_v4().to_string();
        let timestamp = chrono::Utc::now().to_rfc3339();

        if status.is_server_error() {
            tracing::error!(
                error_code = error_code,
                status_code = %status,
                request_id = %request_id,
                error_message = %detail,
                "Request failed"
            );
        } else {
            tracing::warn!(
                error_code = error_code,
                status_code = %status,
                request_id = %request_id,
                error_message = %detail,
                "Request rejected"
            );
        }

        let body = Json(json!({
            "success": false,
            "error": {
                "code": error_code,
                "message": self.user_message(),
                "request_id": request_id,
                "timestamp": timestamp
            },
            "data": null
        }));

        (status, body).into_response()
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Timeout
        } else {
            AppError::Transport {
                message: err.to_string(),
            }
        }
    }
}

impl From<rust_xlsxwriter::XlsxError> for AppError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        AppError::Spreadsheet {
            message: err.to_string(),
        }
    }
}

impl From<axum::extract::multipart::MultipartError> for AppError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        AppError::InvalidUpload {
            message: err.to_string(),
        }
    }
}

impl AppError {
    pub fn malformed(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::MalformedResponse {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::NotFound { what: what.into() }
    }

    pub fn clipboard(message: impl Into<String>) -> Self {
        AppError::Clipboard {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        AppError::ConfigError {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        AppError::Internal {
            message: message.into(),
        }
    }
}
