//! Tubely Processing Library
//!
//! Local handling of an upload before it is published: staging the request body on disk,
//! inspecting it with ffprobe, and remuxing it into a fast-start MP4 with ffmpeg.
//!
//! Inspection and remuxing sit behind the [`Prober`] and [`Remuxer`] traits so the upload
//! pipeline never deals with process invocation directly.

#[cfg(any(test, feature = "test-util"))]
pub mod fake;
pub mod probe;
pub mod remux;
pub mod staging;
mod tool;

pub use probe::{FfprobeProber, MediaDescriptor, Orientation, ProbeError, Prober};
pub use remux::{FfmpegRemuxer, ProcessedFile, Remuxer, TranscodeError};
pub use staging::{StagedFile, Stager, StagingError};
