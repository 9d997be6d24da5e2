//! Tubely DB Library
//!
//! Access to the video metadata store used by the upload pipeline.

pub mod db;

pub use db::{MemoryVideoRepository, PgVideoRepository, VideoRepository};
