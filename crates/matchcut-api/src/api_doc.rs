//! OpenAPI documentation definitions

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Matchcut API",
        description = "Video upload and match-cut analysis service. Videos are staged \
via multipart upload, handed to the analyzer either synchronously or through the \
background queue, and published under /output_videos once processed."
    ),
    paths(
        crate::handlers::upload_video::upload_video,
        crate::handlers::run_model::run_model,
        crate::handlers::videos::create_video,
        crate::handlers::videos::process_video,
        crate::handlers::videos::get_video,
        crate::handlers::videos::list_videos
    ),
    components(schemas(
        crate::handlers::upload_video::UploadVideoResponse,
        crate::handlers::run_model::RunModelRequest,
        crate::handlers::run_model::RunModelResponse,
        crate::handlers::videos::CreateVideoRequest,
        crate::handlers::videos::VideoListResponse,
        matchcut_core::models::ProcessingStatus,
        matchcut_core::models::VideoRecordResponse,
        crate::error::ErrorResponse
    )),
    tags(
        (name = "videos", description = "Video upload, processing and retrieval")
    )
)]
pub struct ApiDoc;

pub fn openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
