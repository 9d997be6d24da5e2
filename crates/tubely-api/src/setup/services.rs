//! Upload pipeline wiring

use crate::auth::JwtAuthenticator;
use crate::services::upload::{UploadPipeline, UploadPipelineConfig};
use anyhow::{Context, Result};
use std::sync::Arc;
use tubely_core::Config;
use tubely_db::VideoRepository;
use tubely_processing::{FfmpegRemuxer, FfprobeProber, Stager};
use tubely_storage::{Storage, UrlStrategy};

pub fn build_upload_pipeline(
    config: &Config,
    videos: Arc<dyn VideoRepository>,
    storage: Arc<dyn Storage>,
) -> Result<UploadPipeline> {
    let prober = FfprobeProber::new(config.ffprobe_path())?;
    let remuxer = FfmpegRemuxer::new(config.ffmpeg_path())?;
    let urls = UrlStrategy::from_config(config).context("Invalid public URL strategy")?;

    let pipeline_config = UploadPipelineConfig {
        stager: Stager::new(config.staging_dir().cloned()),
        urls,
        max_video_bytes: config.max_video_size_bytes() as u64,
        max_thumbnail_bytes: config.max_thumbnail_size_bytes() as u64,
        max_concurrent_transcodes: config.max_concurrent_transcodes(),
    };

    tracing::info!(
        ffprobe_path = %config.ffprobe_path(),
        ffmpeg_path = %config.ffmpeg_path(),
        url_strategy = %config.public_url_strategy(),
        max_concurrent_transcodes = pipeline_config.max_concurrent_transcodes,
        "Upload pipeline configured"
    );

    Ok(UploadPipeline::new(
        Arc::new(JwtAuthenticator::new(config.jwt_secret())),
        videos,
        storage,
        Arc::new(prober),
        Arc::new(remuxer),
        pipeline_config,
    ))
}
