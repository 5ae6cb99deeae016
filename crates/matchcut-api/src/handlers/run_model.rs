//! Synchronous analyzer endpoint
//!
//! Runs the analyzer on an already staged video and blocks until it finishes.
//! The async path (`POST /api/videos/{id}/process`) is preferred for large
//! inputs; this endpoint exists for clients that want a single round trip.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RunModelRequest {
    /// Staged file name returned by the upload endpoint
    pub file_name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RunModelResponse {
    pub success: bool,
    /// Public URL of the processed video
    #[serde(rename = "videoURL")]
    pub video_url: String,
    /// Analyzer stdout, passed through as-is
    pub message: String,
}

/// Run the analyzer on a staged video and wait for the result
#[utoipa::path(
    post,
    path = "/api/run-model",
    tag = "videos",
    request_body = RunModelRequest,
    responses(
        (status = 200, description = "Analyzer finished, processed video published", body = RunModelResponse),
        (status = 400, description = "Invalid file name", body = ErrorResponse),
        (status = 404, description = "No staged video with that name", body = ErrorResponse),
        (status = 409, description = "That video is already being processed", body = ErrorResponse),
        (status = 500, description = "Analyzer failed", body = ErrorResponse),
        (status = 504, description = "Analyzer timed out", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all, fields(file_name = %request.file_name))]
pub async fn run_model(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RunModelRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let processed = state.orchestrator.process(&request.file_name).await?;

    Ok(Json(RunModelResponse {
        success: true,
        video_url: processed.video_url,
        message: processed.message,
    }))
}
