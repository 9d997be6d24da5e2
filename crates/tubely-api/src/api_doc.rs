//! OpenAPI documentation.

use axum::Json;
use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use tubely_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tubely API",
        version = "0.1.0",
        description = "Video and thumbnail upload service. Uploaded videos are remuxed for fast start and published under an orientation prefix; thumbnails are stored per video."
    ),
    paths(
        handlers::video_upload::upload_video,
        handlers::thumbnail_upload::upload_thumbnail,
        handlers::health::health,
    ),
    components(schemas(
        models::VideoResponse,
        error::ErrorResponse,
        handlers::health::HealthResponse,
    )),
    tags(
        (name = "uploads", description = "Video and thumbnail uploads"),
        (name = "health", description = "Liveness"),
    )
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_lists_upload_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/video_upload/{video_id}"));
        assert!(doc
            .paths
            .paths
            .contains_key("/api/thumbnail_upload/{video_id}"));
        assert!(doc.paths.paths.contains_key("/health"));
    }
}
