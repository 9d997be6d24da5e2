//! Fast-start remuxing with ffmpeg.
//!
//! Streams are copied without re-encoding into an MP4 whose index (moov atom) precedes the
//! media data, so playback can begin before the whole file is downloaded.

use crate::tool::{stderr_tail, validate_executable};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tempfile::TempPath;
use thiserror::Error;
use tokio::fs::File;
use tokio::process::Command;

/// Suffix appended to the input path to name the remuxed output.
pub const PROCESSING_SUFFIX: &str = ".processing";

const STDERR_TAIL_CHARS: usize = 2000;

#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("failed to run ffmpeg: {0}")]
    Spawn(#[source] io::Error),

    #[error("ffmpeg exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("processed file is missing: {0}")]
    MissingOutput(#[source] io::Error),

    #[error("processed file is empty")]
    EmptyOutput,
}

/// Remuxed copy of a staged upload. Removed from disk on drop.
#[derive(Debug)]
pub struct ProcessedFile {
    path: TempPath,
    len: u64,
}

impl ProcessedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub async fn open(&self) -> io::Result<File> {
        File::open(&self.path).await
    }
}

/// Rewrites a staged file into a fast-start container.
#[async_trait]
pub trait Remuxer: Send + Sync {
    async fn fast_start(&self, input: &Path) -> Result<ProcessedFile, TranscodeError>;
}

/// Sibling output path for `input`: the same path with [`PROCESSING_SUFFIX`] appended.
pub fn processing_path(input: &Path) -> PathBuf {
    let mut path = input.as_os_str().to_owned();
    path.push(PROCESSING_SUFFIX);
    PathBuf::from(path)
}

/// Accept the output behind `guard` only if it exists and is non-empty.
///
/// On failure the guard is dropped here, which removes whatever was written.
pub async fn verify_output(guard: TempPath) -> Result<ProcessedFile, TranscodeError> {
    let metadata = tokio::fs::metadata(&guard)
        .await
        .map_err(TranscodeError::MissingOutput)?;

    if metadata.len() == 0 {
        return Err(TranscodeError::EmptyOutput);
    }

    Ok(ProcessedFile {
        len: metadata.len(),
        path: guard,
    })
}

pub struct FfmpegRemuxer {
    ffmpeg_path: String,
}

impl FfmpegRemuxer {
    pub fn new(ffmpeg_path: impl Into<String>) -> Result<Self> {
        let ffmpeg_path = ffmpeg_path.into();
        validate_executable(&ffmpeg_path).context("Invalid ffmpeg_path")?;
        Ok(Self { ffmpeg_path })
    }
}

#[async_trait]
impl Remuxer for FfmpegRemuxer {
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffmpeg",
        process.executable.path = %self.ffmpeg_path,
        ffmpeg.operation = "faststart"
    ))]
    async fn fast_start(&self, input: &Path) -> Result<ProcessedFile, TranscodeError> {
        let start = std::time::Instant::now();
        let output_path = processing_path(input);

        // Guard the output before spawning: if this future is dropped the child is
        // killed (kill_on_drop) and the partial file removed with the guard.
        let guard = TempPath::from_path(&output_path);

        let child = Command::new(&self.ffmpeg_path)
            .arg("-y")
            .arg("-i")
            .arg(input)
            .args(["-movflags", "faststart", "-codec", "copy", "-f", "mp4"])
            .arg(&output_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(TranscodeError::Spawn)?;

        let output = child
            .wait_with_output()
            .await
            .map_err(TranscodeError::Spawn)?;

        if !output.status.success() {
            let stderr = stderr_tail(&output.stderr, STDERR_TAIL_CHARS);
            tracing::warn!(status = %output.status, stderr = %stderr, "ffmpeg remux failed");
            return Err(TranscodeError::Failed {
                status: output.status.to_string(),
                stderr,
            });
        }

        let processed = verify_output(guard).await?;

        tracing::info!(
            duration_ms = start.elapsed().as_millis(),
            size_bytes = processed.len(),
            "Fast-start remux completed"
        );

        Ok(processed)
    }
}
