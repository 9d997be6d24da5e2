//! Media inspection with ffprobe.

use crate::tool::{stderr_tail, validate_executable};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;

const STDERR_TAIL_CHARS: usize = 2000;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("ffprobe failed: {0}")]
    Failed(String),

    #[error("no video streams found")]
    NoStreams,

    #[error("could not parse ffprobe output: {0}")]
    Parse(String),
}

/// Aspect classification of a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Landscape,
    Portrait,
    Other,
}

impl Orientation {
    /// Exact 16:9 test using integer division, so `width == 16 * height / 9` truncates.
    ///
    /// This is deliberately strict: 854x480 is `Other` because `16 * 480 / 9 == 853`.
    /// Streams without dimensions are `Other`.
    pub fn classify(width: u32, height: u32) -> Self {
        // 0x0 passes `0 == 16 * 0 / 9` and would read as landscape. A first stream without
        // dimensions (audio first) is `Other` instead.
        if width == 0 || height == 0 {
            return Orientation::Other;
        }
        let (w, h) = (u64::from(width), u64::from(height));
        if w == 16 * h / 9 {
            Orientation::Landscape
        } else if h == 16 * w / 9 {
            Orientation::Portrait
        } else {
            Orientation::Other
        }
    }

    /// Storage key prefix for videos of this orientation.
    pub fn as_prefix(&self) -> &'static str {
        match self {
            Orientation::Landscape => "landscape",
            Orientation::Portrait => "portrait",
            Orientation::Other => "other",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_prefix())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaDescriptor {
    pub width: u32,
    pub height: u32,
    pub orientation: Orientation,
}

impl MediaDescriptor {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            orientation: Orientation::classify(width, height),
        }
    }
}

/// Inspects a staged file.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn inspect(&self, path: &Path) -> Result<MediaDescriptor, ProbeError>;
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
}

/// Build a descriptor from ffprobe `-show_streams` JSON, using the first stream.
pub fn parse_probe_output(stdout: &[u8]) -> Result<MediaDescriptor, ProbeError> {
    let output: ProbeOutput =
        serde_json::from_slice(stdout).map_err(|e| ProbeError::Parse(e.to_string()))?;

    let stream = output.streams.first().ok_or(ProbeError::NoStreams)?;

    Ok(MediaDescriptor::new(
        stream.width.unwrap_or(0),
        stream.height.unwrap_or(0),
    ))
}

pub struct FfprobeProber {
    ffprobe_path: String,
}

impl FfprobeProber {
    pub fn new(ffprobe_path: impl Into<String>) -> Result<Self> {
        let ffprobe_path = ffprobe_path.into();
        validate_executable(&ffprobe_path).context("Invalid ffprobe_path")?;
        Ok(Self { ffprobe_path })
    }
}

#[async_trait]
impl Prober for FfprobeProber {
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffprobe",
        process.executable.path = %self.ffprobe_path,
        ffmpeg.operation = "probe"
    ))]
    async fn inspect(&self, path: &Path) -> Result<MediaDescriptor, ProbeError> {
        let start = std::time::Instant::now();

        let output = Command::new(&self.ffprobe_path)
            .args(["-v", "error", "-print_format", "json", "-show_streams"])
            .arg(path)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ProbeError::Failed(format!("failed to execute ffprobe: {}", e)))?;

        if !output.status.success() {
            return Err(ProbeError::Failed(format!(
                "{}: {}",
                output.status,
                stderr_tail(&output.stderr, STDERR_TAIL_CHARS)
            )));
        }

        let descriptor = parse_probe_output(&output.stdout)?;

        tracing::info!(
            duration_ms = start.elapsed().as_millis(),
            width = descriptor.width,
            height = descriptor.height,
            orientation = %descriptor.orientation,
            "Video probe completed"
        );

        Ok(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_exact_ratios() {
        assert_eq!(Orientation::classify(1920, 1080), Orientation::Landscape);
        assert_eq!(Orientation::classify(1080, 1920), Orientation::Portrait);
        assert_eq!(Orientation::classify(1000, 1000), Orientation::Other);
        assert_eq!(Orientation::classify(1280, 720), Orientation::Landscape);
        assert_eq!(Orientation::classify(720, 1280), Orientation::Portrait);
    }

    #[test]
    fn test_classify_keeps_integer_truncation() {
        // 16 * 480 / 9 == 853, so a common 16:9 size is not recognised.
        assert_eq!(Orientation::classify(854, 480), Orientation::Other);
        assert_eq!(Orientation::classify(853, 480), Orientation::Landscape);
        // 16 * 1082 / 9 == 1923 (truncated from 1923.55)
        assert_eq!(Orientation::classify(1923, 1082), Orientation::Landscape);
        assert_eq!(Orientation::classify(1924, 1082), Orientation::Other);
    }

    #[test]
    fn test_classify_missing_dimensions() {
        assert_eq!(Orientation::classify(0, 0), Orientation::Other);
        assert_eq!(Orientation::classify(1920, 0), Orientation::Other);
    }

    #[test]
    fn test_parse_audio_first_stream_is_other() {
        let json = br#"{"streams":[{"codec_type":"audio"},{"codec_type":"video","width":1920,"height":1080}]}"#;
        let descriptor = parse_probe_output(json).unwrap();
        assert_eq!((descriptor.width, descriptor.height), (0, 0));
        assert_eq!(descriptor.orientation, Orientation::Other);
    }

    #[test]
    fn test_parse_first_stream() {
        let json = br#"{"streams":[{"index":0,"codec_type":"video","width":1080,"height":1920},{"index":1,"codec_type":"audio"}]}"#;
        let descriptor = parse_probe_output(json).unwrap();
        assert_eq!(descriptor.width, 1080);
        assert_eq!(descriptor.height, 1920);
        assert_eq!(descriptor.orientation, Orientation::Portrait);
    }

    #[test]
    fn test_parse_without_streams() {
        assert!(matches!(
            parse_probe_output(br#"{"streams":[]}"#),
            Err(ProbeError::NoStreams)
        ));
        assert!(matches!(
            parse_probe_output(br#"{}"#),
            Err(ProbeError::NoStreams)
        ));
    }

    #[test]
    fn test_parse_malformed() {
        assert!(matches!(
            parse_probe_output(b"not json"),
            Err(ProbeError::Parse(_))
        ));
        assert!(matches!(parse_probe_output(b""), Err(ProbeError::Parse(_))));
    }

    #[test]
    fn test_rejects_unsafe_executable() {
        assert!(FfprobeProber::new("ffprobe && curl evil").is_err());
    }

    #[cfg(unix)]
    mod subprocess {
        use super::super::*;
        use std::os::unix::fs::PermissionsExt;

        fn write_script(dir: &Path, name: &str, body: &str) -> String {
            let path = dir.join(name);
            std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path.to_string_lossy().into_owned()
        }

        #[tokio::test]
        async fn test_inspect_reads_stdout() {
            let dir = tempfile::tempdir().unwrap();
            let script = write_script(
                dir.path(),
                "fake-ffprobe",
                r#"echo '{"streams":[{"width":1920,"height":1080}]}'"#,
            );
            let prober = FfprobeProber::new(script).unwrap();

            let descriptor = prober.inspect(Path::new("/tmp/input.mp4")).await.unwrap();
            assert_eq!(descriptor.orientation, Orientation::Landscape);
        }

        #[tokio::test]
        async fn test_inspect_nonzero_exit() {
            let dir = tempfile::tempdir().unwrap();
            let script = write_script(
                dir.path(),
                "fake-ffprobe",
                "echo 'Invalid data found when processing input' >&2; exit 1",
            );
            let prober = FfprobeProber::new(script).unwrap();

            let err = prober
                .inspect(Path::new("/tmp/input.mp4"))
                .await
                .unwrap_err();
            match err {
                ProbeError::Failed(msg) => assert!(msg.contains("Invalid data")),
                other => panic!("unexpected error: {:?}", other),
            }
        }

        #[tokio::test]
        async fn test_inspect_missing_binary() {
            let prober = FfprobeProber::new("/nonexistent/ffprobe").unwrap();
            let err = prober
                .inspect(Path::new("/tmp/input.mp4"))
                .await
                .unwrap_err();
            assert!(matches!(err, ProbeError::Failed(_)));
        }
    }
}
