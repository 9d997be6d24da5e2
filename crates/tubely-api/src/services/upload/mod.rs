//! Upload pipeline for video files and thumbnails
//!
//! Both variants run the same sequence: authenticate → authorize → stage → (inspect →
//! transcode) → publish → persist. Staging and transcoding scratch files are owned by RAII
//! guards, so nothing is left on disk whichever step fails.

mod error;
mod pipeline;
mod source;
mod types;

pub use error::UploadError;
pub use pipeline::{UploadPipeline, UploadPipelineConfig, MULTIPART_OVERHEAD_BYTES};
pub use source::{stage_part, MultipartSource, PartSource};
pub use types::{
    normalize_media_type, PartRules, StagedPart, UploadKind, UploadRequest, UploadStage,
    THUMBNAIL_FIELD, THUMBNAIL_PREFIX, VIDEO_FIELD, VIDEO_MEDIA_TYPE,
};
