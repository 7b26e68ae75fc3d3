use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use uuid::Uuid;

use super::error_response::error_response;
use crate::domain::JobId;
use crate::presentation::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    #[serde(default)]
    pub url: Option<String>,
}

#[tracing::instrument(skip(state, payload))]
pub async fn create_job_handler(
    State(state): State<AppState>,
    payload: Result<Json<CreateJobRequest>, JsonRejection>,
) -> Response {
    let url = match payload {
        Ok(Json(request)) => request.url.unwrap_or_default(),
        Err(rejection) => {
            tracing::warn!(error = %rejection, "Malformed job request");
            return error_response(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    match state.scanner_service.create_job(&url).await {
        Ok(job) => (StatusCode::OK, Json(job)).into_response(),
        Err(e) => e.into_response(),
    }
}

#[tracing::instrument(skip(state))]
pub async fn job_status_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Response {
    let Ok(uuid) = Uuid::parse_str(&job_id) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("Invalid job ID: {}", job_id),
        );
    };

    match state
        .scanner_service
        .get_job_status(JobId::from_uuid(uuid))
        .await
    {
        Ok(Some(job)) => (StatusCode::OK, Json(job)).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, format!("Job not found: {}", job_id)),
        Err(e) => e.into_response(),
    }
}
