use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::services::ScannerError;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

impl IntoResponse for ScannerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ScannerError::UrlRequired => StatusCode::BAD_REQUEST,
            ScannerError::NoActiveConfig
            | ScannerError::Lock(_)
            | ScannerError::Repository(_)
            | ScannerError::Queue(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        error_response(status, self.to_string())
    }
}
