//! Canned [`Prober`] and [`Remuxer`] implementations for tests.

use crate::probe::{MediaDescriptor, ProbeError, Prober};
use crate::remux::{processing_path, verify_output, ProcessedFile, Remuxer, TranscodeError};
use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempPath;

/// What a [`FakeProber`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeProbe {
    Dimensions(u32, u32),
    Fail,
    NoStreams,
    Malformed,
}

#[derive(Debug)]
pub struct FakeProber {
    outcome: FakeProbe,
    calls: AtomicUsize,
}

impl FakeProber {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_outcome(FakeProbe::Dimensions(width, height))
    }

    pub fn with_outcome(outcome: FakeProbe) -> Self {
        Self {
            outcome,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Prober for FakeProber {
    async fn inspect(&self, path: &Path) -> Result<MediaDescriptor, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if !path.exists() {
            return Err(ProbeError::Failed(format!(
                "{}: No such file or directory",
                path.display()
            )));
        }

        match self.outcome {
            FakeProbe::Dimensions(width, height) => Ok(MediaDescriptor::new(width, height)),
            FakeProbe::Fail => Err(ProbeError::Failed(
                "Invalid data found when processing input".to_string(),
            )),
            FakeProbe::NoStreams => Err(ProbeError::NoStreams),
            FakeProbe::Malformed => Err(ProbeError::Parse("expected value".to_string())),
        }
    }
}

/// What a [`FakeRemuxer`] writes to the output path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeRemux {
    /// Copy the input unchanged.
    CopyInput,
    /// Write fixed bytes (empty bytes exercise the zero-size check).
    Output(Vec<u8>),
    /// Exit as if ffmpeg failed after writing a partial file.
    Fail,
}

#[derive(Debug)]
pub struct FakeRemuxer {
    behaviour: FakeRemux,
    calls: AtomicUsize,
}

impl FakeRemuxer {
    pub fn copying() -> Self {
        Self::with_behaviour(FakeRemux::CopyInput)
    }

    pub fn with_behaviour(behaviour: FakeRemux) -> Self {
        Self {
            behaviour,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Remuxer for FakeRemuxer {
    async fn fast_start(&self, input: &Path) -> Result<ProcessedFile, TranscodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let output_path = processing_path(input);
        let guard = TempPath::from_path(&output_path);

        match &self.behaviour {
            FakeRemux::CopyInput => {
                tokio::fs::copy(input, &output_path)
                    .await
                    .map_err(TranscodeError::Spawn)?;
            }
            FakeRemux::Output(bytes) => {
                tokio::fs::write(&output_path, bytes)
                    .await
                    .map_err(TranscodeError::Spawn)?;
            }
            FakeRemux::Fail => {
                tokio::fs::write(&output_path, b"partial")
                    .await
                    .map_err(TranscodeError::Spawn)?;
                return Err(TranscodeError::Failed {
                    status: "exit status: 1".to_string(),
                    stderr: "moov atom not found".to_string(),
                });
            }
        }

        verify_output(guard).await
    }
}
