//! Tubely Storage Library
//!
//! Object store abstraction for published assets, the backends behind it, and the
//! helpers that decide where an asset lives (`keys`) and how it is addressed publicly (`urls`).
//!
//! # Storage key format
//!
//! - **Videos**: `{orientation}/{random}{ext}` where `random` is 32 bytes of OS entropy,
//!   base64 URL-safe without padding.
//! - **Thumbnails**: `thumbnails/{video_id}{ext}`, so a re-upload overwrites the previous image.
//!
//! Keys must not contain `..` or a leading `/`.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod memory;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;
pub mod urls;

// Re-export commonly used types
pub use factory::create_storage;
pub use keys::{media_type_to_ext, KeyStrategy, StorageKey};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use memory::MemoryStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult, StoredObject};
pub use tubely_core::StorageBackend;
pub use urls::UrlStrategy;
