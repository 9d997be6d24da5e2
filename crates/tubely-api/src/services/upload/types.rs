//! Types used by the upload pipeline

use super::error::UploadError;
use axum::http::header::{AUTHORIZATION, CONTENT_LENGTH};
use axum::http::HeaderMap;
use std::fmt;
use tubely_processing::StagedFile;

/// Multipart field carrying the video file.
pub const VIDEO_FIELD: &str = "video";
/// Multipart field carrying the thumbnail image.
pub const THUMBNAIL_FIELD: &str = "thumbnail";
/// The only media type accepted for video uploads.
pub const VIDEO_MEDIA_TYPE: &str = "video/mp4";
/// Key prefix for thumbnails.
pub const THUMBNAIL_PREFIX: &str = "thumbnails";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Video,
    Thumbnail,
}

impl UploadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadKind::Video => "video",
            UploadKind::Thumbnail => "thumbnail",
        }
    }
}

impl fmt::Display for UploadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last step an upload completed. Failures are logged with the stage they happened after.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum UploadStage {
    Received,
    Authenticated,
    Authorized,
    Staged,
    Inspected,
    Transcoded,
    Published,
    Persisted,
}

impl fmt::Display for UploadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UploadStage::Received => "received",
            UploadStage::Authenticated => "authenticated",
            UploadStage::Authorized => "authorized",
            UploadStage::Staged => "staged",
            UploadStage::Inspected => "inspected",
            UploadStage::Transcoded => "transcoded",
            UploadStage::Published => "published",
            UploadStage::Persisted => "persisted",
        };
        f.write_str(name)
    }
}

/// Request metadata an upload needs besides the body.
#[derive(Debug, Clone, Copy)]
pub struct UploadRequest<'a> {
    /// Raw path segment, parsed as a video id by the pipeline
    pub video_id: &'a str,
    pub authorization: Option<&'a str>,
    /// Declared body size, if the client sent one
    pub content_length: Option<u64>,
}

impl<'a> UploadRequest<'a> {
    pub fn from_headers(video_id: &'a str, headers: &'a HeaderMap) -> Self {
        Self {
            video_id,
            authorization: headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()),
            content_length: headers
                .get(CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok()),
        }
    }
}

/// What a file part must look like to be staged.
#[derive(Debug, Clone)]
pub struct PartRules {
    pub field_name: &'static str,
    /// Exact media type required, if any
    pub required_media_type: Option<&'static str>,
    pub max_bytes: u64,
}

impl PartRules {
    pub fn video(max_bytes: u64) -> Self {
        Self {
            field_name: VIDEO_FIELD,
            required_media_type: Some(VIDEO_MEDIA_TYPE),
            max_bytes,
        }
    }

    pub fn thumbnail(max_bytes: u64) -> Self {
        Self {
            field_name: THUMBNAIL_FIELD,
            required_media_type: None,
            max_bytes,
        }
    }

    /// Check a part's declared content type and return its normalized media type.
    pub fn check_content_type(&self, content_type: Option<&str>) -> Result<String, UploadError> {
        let media_type = content_type
            .map(normalize_media_type)
            .filter(|m| !m.is_empty())
            .ok_or_else(|| {
                UploadError::BadInput("Missing Content-Type for file part".to_string())
            })?;

        if let Some(required) = self.required_media_type {
            if media_type != required {
                return Err(UploadError::UnsupportedMediaType(media_type));
            }
        }

        Ok(media_type)
    }
}

/// Strip parameters and case from a content type: `Video/MP4; codecs=avc1` → `video/mp4`.
pub fn normalize_media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// A file part that passed its rules and has been written to a staging file.
#[derive(Debug)]
pub struct StagedPart {
    pub media_type: String,
    pub file: StagedFile,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_normalize_media_type() {
        assert_eq!(normalize_media_type("video/mp4"), "video/mp4");
        assert_eq!(normalize_media_type("Video/MP4; codecs=avc1"), "video/mp4");
        assert_eq!(normalize_media_type(" image/png "), "image/png");
        assert_eq!(normalize_media_type(";"), "");
    }

    #[test]
    fn test_video_rules_require_mp4() {
        let rules = PartRules::video(1024);
        assert_eq!(
            rules.check_content_type(Some("video/mp4; codecs=avc1")).unwrap(),
            "video/mp4"
        );
        assert!(matches!(
            rules.check_content_type(Some("video/quicktime")),
            Err(UploadError::UnsupportedMediaType(m)) if m == "video/quicktime"
        ));
        assert!(matches!(
            rules.check_content_type(None),
            Err(UploadError::BadInput(_))
        ));
    }

    #[test]
    fn test_thumbnail_rules_accept_any_present_type() {
        let rules = PartRules::thumbnail(1024);
        assert_eq!(rules.check_content_type(Some("image/png")).unwrap(), "image/png");
        assert_eq!(rules.check_content_type(Some("text/plain")).unwrap(), "text/plain");
        assert!(matches!(
            rules.check_content_type(Some("")),
            Err(UploadError::BadInput(_))
        ));
    }

    #[test]
    fn test_request_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer tok"));
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("2048"));

        let request = UploadRequest::from_headers("abc", &headers);
        assert_eq!(request.video_id, "abc");
        assert_eq!(request.authorization, Some("Bearer tok"));
        assert_eq!(request.content_length, Some(2048));

        let empty = HeaderMap::new();
        let request = UploadRequest::from_headers("abc", &empty);
        assert!(request.authorization.is_none());
        assert!(request.content_length.is_none());
    }

    #[test]
    fn test_stage_order() {
        assert!(UploadStage::Received < UploadStage::Authenticated);
        assert!(UploadStage::Published < UploadStage::Persisted);
        assert_eq!(UploadStage::Transcoded.to_string(), "transcoded");
    }
}
