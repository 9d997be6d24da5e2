//! Where upload bodies come from.
//!
//! A [`PartSource`] finds the named file part of a request body and stages it. Staging
//! happens inside the source because a multipart field borrows the body stream and cannot
//! outlive the iteration that produced it.

use super::error::UploadError;
use super::types::{PartRules, StagedPart};
use async_trait::async_trait;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::Multipart;
use axum::http::StatusCode;
use futures::TryStreamExt;
use std::io;
use tokio::io::AsyncRead;
use tokio_util::io::StreamReader;
use tubely_processing::{StagingError, Stager};

#[async_trait]
pub trait PartSource: Send {
    /// Locate the file part named by `rules`, check its content type and stage it.
    async fn stage_file(
        &mut self,
        rules: &PartRules,
        stager: &Stager,
    ) -> Result<StagedPart, UploadError>;
}

/// Check a part against `rules` and copy its content into a staging file.
///
/// The content type is checked before any byte is read.
pub async fn stage_part<R>(
    rules: &PartRules,
    content_type: Option<&str>,
    reader: R,
    stager: &Stager,
) -> Result<StagedPart, UploadError>
where
    R: AsyncRead + Unpin + Send,
{
    let media_type = rules.check_content_type(content_type)?;
    let file = stager.stage(reader, rules.max_bytes).await?;
    Ok(StagedPart { media_type, file })
}

/// Multipart request body. A body that could not be read as multipart is reported when the
/// pipeline asks for its file, so authentication still runs first.
pub struct MultipartSource {
    multipart: Result<Multipart, MultipartRejection>,
}

impl MultipartSource {
    pub fn new(multipart: Result<Multipart, MultipartRejection>) -> Self {
        Self { multipart }
    }
}

#[async_trait]
impl PartSource for MultipartSource {
    async fn stage_file(
        &mut self,
        rules: &PartRules,
        stager: &Stager,
    ) -> Result<StagedPart, UploadError> {
        let multipart = self.multipart.as_mut().map_err(|rejection| {
            UploadError::BadInput(format!("Unable to parse form: {}", rejection.body_text()))
        })?;

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            if field.name() != Some(rules.field_name) {
                continue;
            }

            let content_type = field.content_type().map(str::to_string);
            let reader = StreamReader::new(Box::pin(field.map_err(io::Error::other)));

            return stage_part(rules, content_type.as_deref(), reader, stager)
                .await
                .map_err(body_limit_as_bad_input);
        }

        Err(UploadError::BadInput(format!(
            "Unable to find form file '{}'",
            rules.field_name
        )))
    }
}

fn multipart_error(err: MultipartError) -> UploadError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return UploadError::BadInput("Upload exceeds the maximum body size".to_string());
    }
    UploadError::BadInput(format!("Unable to parse form: {}", err.body_text()))
}

/// A body cut off by the request size limit surfaces as a write error while staging.
fn body_limit_as_bad_input(err: UploadError) -> UploadError {
    if let UploadError::StagingFailed(StagingError::Write(io_err)) = &err {
        let over_limit = io_err
            .get_ref()
            .and_then(|inner| inner.downcast_ref::<MultipartError>())
            .is_some_and(|e| e.status() == StatusCode::PAYLOAD_TOO_LARGE);
        if over_limit {
            return UploadError::BadInput("Upload exceeds the maximum body size".to_string());
        }
    }
    err
}
