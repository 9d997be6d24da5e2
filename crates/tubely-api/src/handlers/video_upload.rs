use crate::error::{ErrorResponse, HttpAppError};
use crate::services::upload::{MultipartSource, UploadRequest};
use crate::state::AppState;
use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    http::HeaderMap,
    Json,
};
use std::sync::Arc;
use tubely_core::models::VideoResponse;

#[utoipa::path(
    post,
    path = "/api/video_upload/{video_id}",
    tag = "uploads",
    params(
        ("video_id" = String, Path, description = "ID of the video record to attach the file to")
    ),
    request_body(content = inline(Object), content_type = "multipart/form-data", description = "Form field `video` carrying a video/mp4 file"),
    responses(
        (status = 200, description = "Video uploaded and record updated", body = VideoResponse),
        (status = 400, description = "Invalid ID, missing part or body too large", body = ErrorResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse),
        (status = 403, description = "Caller does not own the video", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse),
        (status = 415, description = "File is not video/mp4", body = ErrorResponse),
        (status = 422, description = "File contains no media streams", body = ErrorResponse),
        (status = 500, description = "Processing or storage failure", body = ErrorResponse)
    )
)]
pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<VideoResponse>, HttpAppError> {
    let request = UploadRequest::from_headers(&video_id, &headers);
    let mut source = MultipartSource::new(multipart);

    let video = state.pipeline.upload_video(request, &mut source).await?;

    Ok(Json(VideoResponse::from(video)))
}
