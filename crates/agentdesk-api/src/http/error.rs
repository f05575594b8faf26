//! Application error type mapping to HTTP status codes.
//!
//! Body shape: `{ "error": { "kind": "...", "message": "..." } }`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use agentdesk_types::error::{ErrorKind, HistoryError};

/// Application-level error for the non-streaming endpoints.
#[derive(Debug)]
pub enum AppError {
    History(HistoryError),
    /// Malformed request body or parameters.
    Validation(String),
    Internal(String),
}

impl From<HistoryError> for AppError {
    fn from(e: HistoryError) -> Self {
        AppError::History(e)
    }
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::History(e) => e.kind(),
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::Internal(_) => ErrorKind::Adapter,
        }
    }

    fn status(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::History(e) => e.to_string(),
            AppError::Validation(msg) | AppError::Internal(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.message(), "request failed");
        }

        let body = json!({
            "error": {
                "kind": self.kind(),
                "message": self.message(),
            }
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}
