//! Upload orchestration

use super::error::UploadError;
use super::source::PartSource;
use super::types::{PartRules, StagedPart, UploadKind, UploadRequest, UploadStage, THUMBNAIL_PREFIX};
use crate::auth::{Authenticator, Credential};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tubely_core::models::Video;
use tubely_db::VideoRepository;
use tubely_processing::{Prober, Remuxer, Stager, StagingError};
use tubely_storage::{KeyStrategy, Storage, StorageError, StorageKey, UrlStrategy};
use uuid::Uuid;

/// Bytes allowed on top of a file limit for multipart boundaries and part headers.
pub const MULTIPART_OVERHEAD_BYTES: u64 = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct UploadPipelineConfig {
    pub stager: Stager,
    pub urls: UrlStrategy,
    pub max_video_bytes: u64,
    pub max_thumbnail_bytes: u64,
    /// Inspect + transcode runs allowed at once
    pub max_concurrent_transcodes: usize,
}

/// Runs video and thumbnail uploads from request to persisted record.
pub struct UploadPipeline {
    authenticator: Arc<dyn Authenticator>,
    videos: Arc<dyn VideoRepository>,
    storage: Arc<dyn Storage>,
    prober: Arc<dyn Prober>,
    remuxer: Arc<dyn Remuxer>,
    config: UploadPipelineConfig,
    transcode_slots: Semaphore,
}

impl UploadPipeline {
    pub fn new(
        authenticator: Arc<dyn Authenticator>,
        videos: Arc<dyn VideoRepository>,
        storage: Arc<dyn Storage>,
        prober: Arc<dyn Prober>,
        remuxer: Arc<dyn Remuxer>,
        config: UploadPipelineConfig,
    ) -> Self {
        let transcode_slots = Semaphore::new(config.max_concurrent_transcodes.max(1));
        Self {
            authenticator,
            videos,
            storage,
            prober,
            remuxer,
            config,
            transcode_slots,
        }
    }

    /// Largest request body accepted for `kind`, file plus multipart framing.
    pub fn body_limit(&self, kind: UploadKind) -> u64 {
        let max_file = match kind {
            UploadKind::Video => self.config.max_video_bytes,
            UploadKind::Thumbnail => self.config.max_thumbnail_bytes,
        };
        max_file.saturating_add(MULTIPART_OVERHEAD_BYTES)
    }

    /// Upload a video file: stage, inspect, remux to fast-start, publish under an
    /// orientation prefix and record its URL on the video.
    #[tracing::instrument(skip_all, fields(video_id = %request.video_id, variant = "video"))]
    pub async fn upload_video<S>(
        &self,
        request: UploadRequest<'_>,
        source: &mut S,
    ) -> Result<Video, UploadError>
    where
        S: PartSource + ?Sized,
    {
        let start = std::time::Instant::now();
        let mut stage = UploadStage::Received;
        let result = self.run_video(&request, source, &mut stage).await;
        log_outcome(UploadKind::Video, stage, start, &result);
        result
    }

    /// Upload a thumbnail and record its URL on the video. Re-uploads overwrite the
    /// previous thumbnail in place.
    #[tracing::instrument(skip_all, fields(video_id = %request.video_id, variant = "thumbnail"))]
    pub async fn upload_thumbnail<S>(
        &self,
        request: UploadRequest<'_>,
        source: &mut S,
    ) -> Result<Video, UploadError>
    where
        S: PartSource + ?Sized,
    {
        let start = std::time::Instant::now();
        let mut stage = UploadStage::Received;
        let result = self.run_thumbnail(&request, source, &mut stage).await;
        log_outcome(UploadKind::Thumbnail, stage, start, &result);
        result
    }

    async fn run_video<S>(
        &self,
        request: &UploadRequest<'_>,
        source: &mut S,
        stage: &mut UploadStage,
    ) -> Result<Video, UploadError>
    where
        S: PartSource + ?Sized,
    {
        let video_id = parse_video_id(request.video_id)?;
        self.check_declared_length(request, UploadKind::Video)?;

        let user_id = self.authenticate(request.authorization).await?;
        *stage = UploadStage::Authenticated;

        let mut video = self.authorize(video_id, user_id).await?;
        *stage = UploadStage::Authorized;

        let rules = PartRules::video(self.config.max_video_bytes);
        let StagedPart { media_type, file: staged } =
            source.stage_file(&rules, &self.config.stager).await?;
        *stage = UploadStage::Staged;

        let (descriptor, processed) = {
            // Never closed, so waiting always ends with a permit.
            let _permit = self.transcode_slots.acquire().await.ok();

            let descriptor = self.prober.inspect(staged.path()).await?;
            *stage = UploadStage::Inspected;

            let processed = self.remuxer.fast_start(staged.path()).await?;
            *stage = UploadStage::Transcoded;

            (descriptor, processed)
        };
        drop(staged);

        let key = KeyStrategy::Random.derive(&media_type, Some(descriptor.orientation.as_prefix()));
        let file = processed
            .open()
            .await
            .map_err(|e| UploadError::PublishFailed(StorageError::IoError(e)))?;
        self.storage
            .put_stream(key.as_str(), &media_type, Some(processed.len()), Box::pin(file))
            .await
            .map_err(UploadError::PublishFailed)?;
        drop(processed);
        *stage = UploadStage::Published;

        tracing::debug!(
            key = %key,
            width = descriptor.width,
            height = descriptor.height,
            orientation = %descriptor.orientation,
            "Video published"
        );

        let previous_url = video.video_url.replace(self.config.urls.public_url(key.as_str()));
        let video = self.persist(&video, &key, previous_url.as_deref()).await?;
        *stage = UploadStage::Persisted;

        Ok(video)
    }

    async fn run_thumbnail<S>(
        &self,
        request: &UploadRequest<'_>,
        source: &mut S,
        stage: &mut UploadStage,
    ) -> Result<Video, UploadError>
    where
        S: PartSource + ?Sized,
    {
        let video_id = parse_video_id(request.video_id)?;
        self.check_declared_length(request, UploadKind::Thumbnail)?;

        let user_id = self.authenticate(request.authorization).await?;
        *stage = UploadStage::Authenticated;

        let mut video = self.authorize(video_id, user_id).await?;
        *stage = UploadStage::Authorized;

        let rules = PartRules::thumbnail(self.config.max_thumbnail_bytes);
        let StagedPart { media_type, file: staged } =
            source.stage_file(&rules, &self.config.stager).await?;
        *stage = UploadStage::Staged;

        let data = staged
            .into_bytes()
            .await
            .map_err(|e| UploadError::StagingFailed(StagingError::Write(e)))?;

        let key = KeyStrategy::Owned(video.id).derive(&media_type, Some(THUMBNAIL_PREFIX));
        self.storage
            .put(key.as_str(), &media_type, data)
            .await
            .map_err(UploadError::PublishFailed)?;
        *stage = UploadStage::Published;

        let previous_url = video
            .thumbnail_url
            .replace(self.config.urls.public_url(key.as_str()));
        let video = self.persist(&video, &key, previous_url.as_deref()).await?;
        *stage = UploadStage::Persisted;

        Ok(video)
    }

    fn check_declared_length(
        &self,
        request: &UploadRequest<'_>,
        kind: UploadKind,
    ) -> Result<(), UploadError> {
        let limit = self.body_limit(kind);
        match request.content_length {
            Some(declared) if declared > limit => Err(UploadError::BadInput(format!(
                "Upload body of {} bytes exceeds the limit of {} bytes",
                declared, limit
            ))),
            _ => Ok(()),
        }
    }

    async fn authenticate(&self, authorization: Option<&str>) -> Result<Uuid, UploadError> {
        let token = Credential::parse(authorization)?.bearer()?;
        Ok(self.authenticator.authenticate(token).await?)
    }

    async fn authorize(&self, video_id: Uuid, user_id: Uuid) -> Result<Video, UploadError> {
        let video = self
            .videos
            .get(video_id)
            .await
            .map_err(UploadError::LookupFailed)?
            .ok_or(UploadError::NotFound(video_id))?;

        if !video.is_owned_by(user_id) {
            return Err(UploadError::Forbidden { video_id, user_id });
        }

        Ok(video)
    }

    /// Write the updated record and return it.
    ///
    /// If that fails the published object is removed again, unless the record still points at
    /// it (a thumbnail overwritten in place).
    async fn persist(
        &self,
        video: &Video,
        key: &StorageKey,
        previous_url: Option<&str>,
    ) -> Result<Video, UploadError> {
        let err = match self.videos.update(video).await {
            Ok(stored) => return Ok(stored),
            Err(err) => err,
        };

        let new_url = self.config.urls.public_url(key.as_str());
        if previous_url == Some(new_url.as_str()) {
            tracing::warn!(
                key = %key,
                "Metadata update failed; keeping object still referenced by the record"
            );
        } else if let Err(delete_err) = self.storage.delete(key.as_str()).await {
            tracing::warn!(
                key = %key,
                error = %delete_err,
                "Failed to remove published object after metadata update failure"
            );
        } else {
            tracing::info!(key = %key, "Removed published object after metadata update failure");
        }

        Err(UploadError::PersistFailed(err))
    }
}

fn parse_video_id(raw: &str) -> Result<Uuid, UploadError> {
    Uuid::parse_str(raw).map_err(|_| UploadError::BadInput("Invalid ID".to_string()))
}

fn log_outcome(
    kind: UploadKind,
    stage: UploadStage,
    start: std::time::Instant,
    result: &Result<Video, UploadError>,
) {
    let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
    match result {
        Ok(video) => tracing::info!(
            variant = %kind,
            video_id = %video.id,
            duration_ms,
            "Upload completed"
        ),
        Err(err) => tracing::warn!(
            variant = %kind,
            last_stage = %stage,
            error = %err,
            duration_ms,
            "Upload failed"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_video_id() {
        assert!(parse_video_id("not-a-uuid").is_err());
        let id = Uuid::new_v4();
        assert_eq!(parse_video_id(&id.to_string()).unwrap(), id);
    }
}
