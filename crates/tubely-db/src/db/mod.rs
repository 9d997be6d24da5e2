//! Repositories for the video metadata store.
//!
//! The upload pipeline only needs fetch-by-id and update-by-value, each assumed to be
//! atomic for a single row.

pub mod memory;
pub mod video;

pub use memory::MemoryVideoRepository;
pub use video::{PgVideoRepository, VideoRepository};
