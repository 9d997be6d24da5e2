use crate::auth::AuthError;
use thiserror::Error;
use tubely_core::{AppError, ErrorMetadata};
use tubely_processing::{ProbeError, StagingError, TranscodeError};
use tubely_storage::StorageError;
use uuid::Uuid;

/// Why an upload stopped. Each variant maps to exactly one HTTP status via [`AppError`].
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("unauthenticated: {0}")]
    Unauthenticated(#[from] AuthError),

    #[error("user {user_id} is not the owner of video {video_id}")]
    Forbidden { video_id: Uuid, user_id: Uuid },

    #[error("video {0} not found")]
    NotFound(Uuid),

    #[error("{0}")]
    BadInput(String),

    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("staging failed: {0}")]
    StagingFailed(#[source] StagingError),

    #[error("probe failed: {0}")]
    ProbeFailed(String),

    #[error("no streams found in upload")]
    NoStreamsFound,

    #[error("could not parse probe output: {0}")]
    ParseFailed(String),

    #[error("transcode failed: {0}")]
    TranscodeFailed(#[from] TranscodeError),

    #[error("publish failed: {0}")]
    PublishFailed(#[source] StorageError),

    #[error("video lookup failed: {0}")]
    LookupFailed(#[source] AppError),

    #[error("persist failed: {0}")]
    PersistFailed(#[source] AppError),
}

impl From<StagingError> for UploadError {
    fn from(err: StagingError) -> Self {
        match err {
            StagingError::TooLarge { max_bytes } => UploadError::BadInput(format!(
                "Upload exceeds the maximum size of {} bytes",
                max_bytes
            )),
            other => UploadError::StagingFailed(other),
        }
    }
}

impl From<ProbeError> for UploadError {
    fn from(err: ProbeError) -> Self {
        match err {
            ProbeError::Failed(msg) => UploadError::ProbeFailed(msg),
            ProbeError::NoStreams => UploadError::NoStreamsFound,
            ProbeError::Parse(msg) => UploadError::ParseFailed(msg),
        }
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Unauthenticated(e) => AppError::Unauthorized(e.client_message()),
            UploadError::Forbidden { .. } => {
                AppError::Forbidden("You are not the owner of this video".to_string())
            }
            UploadError::NotFound(id) => AppError::NotFound(format!("Video {} not found", id)),
            UploadError::BadInput(msg) => AppError::InvalidInput(msg),
            UploadError::UnsupportedMediaType(media_type) => {
                AppError::UnsupportedMediaType(format!(
                    "Invalid file type '{}', only {} is allowed",
                    media_type,
                    super::VIDEO_MEDIA_TYPE
                ))
            }
            UploadError::StagingFailed(e) => AppError::Staging(e.to_string()),
            UploadError::ProbeFailed(msg) => AppError::MediaProcessing(format!("probe: {}", msg)),
            UploadError::NoStreamsFound => {
                AppError::UnprocessableMedia("No media streams found in upload".to_string())
            }
            UploadError::ParseFailed(msg) => {
                AppError::MediaProcessing(format!("probe output: {}", msg))
            }
            UploadError::TranscodeFailed(e) => AppError::MediaProcessing(e.to_string()),
            UploadError::PublishFailed(e) => AppError::Storage(e.to_string()),
            UploadError::LookupFailed(e) => e,
            // The asset is already published, so any write failure is a server error.
            UploadError::PersistFailed(e) if e.http_status_code() >= 500 => e,
            UploadError::PersistFailed(e) => {
                AppError::Internal(format!("Failed to record upload: {}", e))
            }
        }
    }
}
