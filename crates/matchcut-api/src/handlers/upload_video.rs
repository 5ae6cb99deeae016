//! Video upload endpoint
//!
//! Receives a multipart video upload and stages it on local disk under a
//! generated name. The staged name is what every later endpoint refers to.

use axum::extract::{Multipart, State};
use axum::response::IntoResponse;
use axum::Json;
use matchcut_core::AppError;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::upload::{
    extract_video_file, sanitize_filename, staged_file_name, validate_file_size,
};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadVideoResponse {
    pub success: bool,
    /// Staged file name to pass to the processing endpoints
    pub file_name: String,
    /// Absolute path of the staged file on the server
    pub file_path: String,
}

/// Upload a video for later processing
#[utoipa::path(
    post,
    path = "/api/upload-video",
    tag = "videos",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Video staged for processing", body = UploadVideoResponse),
        (status = 400, description = "Malformed multipart payload", body = ErrorResponse),
        (status = 413, description = "Video exceeds the size limit", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all)]
pub async fn upload_video(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let file = extract_video_file(&mut multipart).await?;

    validate_file_size(file.data.len(), state.config.max_video_size_bytes)?;

    let sanitized = sanitize_filename(&file.file_name)?;
    let staged_name = staged_file_name(&sanitized);

    let upload_dir = std::path::Path::new(&state.config.upload_dir);
    tokio::fs::create_dir_all(upload_dir)
        .await
        .map_err(AppError::from)?;

    let staged_path = upload_dir.join(&staged_name);
    tokio::fs::write(&staged_path, &file.data)
        .await
        .map_err(AppError::from)?;

    let absolute_path = tokio::fs::canonicalize(&staged_path)
        .await
        .map_err(AppError::from)?;

    tracing::info!(
        file_name = %staged_name,
        size_bytes = file.data.len(),
        content_type = %file.content_type,
        "Video staged for processing"
    );

    Ok(Json(UploadVideoResponse {
        success: true,
        file_name: staged_name,
        file_path: absolute_path.to_string_lossy().into_owned(),
    }))
}
