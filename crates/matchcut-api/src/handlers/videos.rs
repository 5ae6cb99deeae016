//! Video record endpoints
//!
//! Records tie a staged upload to a user and track it through the async
//! processing lifecycle: created -> processing -> completed | failed.
//! Clients poll `GET /api/videos/{id}` until the status settles.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use matchcut_core::models::VideoRecordResponse;
use matchcut_core::AppError;
use matchcut_storage::keys;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::job_queue::VideoJob;
use crate::state::AppState;
use crate::utils::upload::validate_staged_name;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateVideoRequest {
    pub user_id: Uuid,
    /// Staged file name returned by the upload endpoint
    pub file_name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VideoListResponse {
    pub videos: Vec<VideoRecordResponse>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ListVideosQuery {
    /// Restrict the listing to one user's videos
    pub user_id: Option<Uuid>,
}

/// Register a staged upload as a video record
#[utoipa::path(
    post,
    path = "/api/videos",
    tag = "videos",
    request_body = CreateVideoRequest,
    responses(
        (status = 201, description = "Video record created", body = VideoRecordResponse),
        (status = 400, description = "Invalid file name", body = ErrorResponse),
        (status = 404, description = "No staged video with that name", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all, fields(user_id = %request.user_id, file_name = %request.file_name))]
pub async fn create_video(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateVideoRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    validate_staged_name(&request.file_name)?;

    let staged_path = std::path::Path::new(&state.config.upload_dir).join(&request.file_name);
    let bytes = tokio::fs::read(&staged_path).await.map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            AppError::NotFound(format!("No uploaded video named {}", request.file_name))
        } else {
            AppError::from(err)
        }
    })?;

    let original_url = state
        .storage
        .upload(&keys::raw_key(&request.file_name), bytes, "video/mp4")
        .await
        .map_err(HttpAppError::from)?;

    let record = state
        .videos
        .create(request.user_id, &request.file_name, &original_url)
        .await?;

    tracing::info!(video_id = %record.id, "Video record created");

    Ok((StatusCode::CREATED, Json(VideoRecordResponse::from(record))))
}

/// Queue a video record for background processing
#[utoipa::path(
    post,
    path = "/api/videos/{id}/process",
    tag = "videos",
    params(("id" = Uuid, Path, description = "Video record id")),
    responses(
        (status = 202, description = "Video queued for processing", body = VideoRecordResponse),
        (status = 404, description = "No video record with that id", body = ErrorResponse),
        (status = 409, description = "That video is already being processed", body = ErrorResponse),
        (status = 503, description = "Processing queue is full", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn process_video(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let record = state
        .videos
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Video {} not found", id)))?;

    let prior_status = record.status;

    let updated = state
        .videos
        .begin_processing(id)
        .await?
        .ok_or_else(|| AppError::AlreadyProcessing(record.file_name.clone()))?;

    if let Err(err) = state
        .video_job_queue
        .submit(VideoJob::ProcessVideo { video_id: id })
    {
        // The status was already flipped to processing; put it back so the
        // record stays retryable.
        if let Err(revert_err) = state.videos.set_status(id, prior_status).await {
            tracing::error!(
                error = %revert_err,
                video_id = %id,
                "Failed to revert video status after enqueue failure"
            );
        }
        return Err(err.into());
    }

    tracing::info!(video_id = %id, "Video queued for processing");

    Ok((StatusCode::ACCEPTED, Json(VideoRecordResponse::from(updated))))
}

/// Fetch a single video record
#[utoipa::path(
    get,
    path = "/api/videos/{id}",
    tag = "videos",
    params(("id" = Uuid, Path, description = "Video record id")),
    responses(
        (status = 200, description = "Video record", body = VideoRecordResponse),
        (status = 404, description = "No video record with that id", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn get_video(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let record = state
        .videos
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Video {} not found", id)))?;

    Ok(Json(VideoRecordResponse::from(record)))
}

/// List video records, optionally filtered by user
#[utoipa::path(
    get,
    path = "/api/videos",
    tag = "videos",
    params(ListVideosQuery),
    responses(
        (status = 200, description = "Video records, newest first", body = VideoListResponse)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn list_videos(
    State(state): State<AppState>,
    Query(query): Query<ListVideosQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let records = state.videos.list(query.user_id).await?;

    Ok(Json(VideoListResponse {
        videos: records.into_iter().map(VideoRecordResponse::from).collect(),
    }))
}
