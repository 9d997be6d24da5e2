//! Storage key derivation.
//!
//! A key is a classification prefix plus a filename. The filename is either 32 bytes of OS
//! entropy (URL-safe base64, no padding) or the owning record id, followed by an extension
//! taken from the media type.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::TryRngCore;
use std::fmt;
use uuid::Uuid;

/// Extension used when a media type has no usable subtype.
pub const GENERIC_BINARY_EXTENSION: &str = ".bin";

const RANDOM_NAME_BYTES: usize = 32;

/// Opaque key an asset is addressed by in the object store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Last path segment of the key.
    pub fn filename(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Map a media type such as `video/mp4` to a file extension (`.mp4`).
///
/// The subtype is used verbatim. Anything that is not exactly `type/subtype` with both
/// parts non-empty maps to [`GENERIC_BINARY_EXTENSION`].
pub fn media_type_to_ext(media_type: &str) -> String {
    let mut parts = media_type.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(kind), Some(subtype), None) if !kind.is_empty() && !subtype.is_empty() => {
            format!(".{}", subtype)
        }
        _ => GENERIC_BINARY_EXTENSION.to_string(),
    }
}

/// How the filename part of a key is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStrategy {
    /// Fresh random name per upload; collisions are negligible.
    Random,
    /// Named after the owning record, so re-uploads overwrite the previous asset.
    Owned(Uuid),
}

impl KeyStrategy {
    pub fn filename(&self, media_type: &str) -> String {
        let ext = media_type_to_ext(media_type);
        match self {
            KeyStrategy::Random => format!("{}{}", random_name(), ext),
            KeyStrategy::Owned(id) => format!("{}{}", id, ext),
        }
    }

    /// Derive a key, joining `prefix` as a directory when one is given.
    pub fn derive(&self, media_type: &str, prefix: Option<&str>) -> StorageKey {
        let filename = self.filename(media_type);
        match prefix.map(|p| p.trim_matches('/')).filter(|p| !p.is_empty()) {
            Some(prefix) => StorageKey(format!("{}/{}", prefix, filename)),
            None => StorageKey(filename),
        }
    }
}

/// A broken entropy source cannot be recovered from, so the process is aborted.
fn random_name() -> String {
    let mut buf = [0u8; RANDOM_NAME_BYTES];
    if let Err(e) = OsRng.try_fill_bytes(&mut buf) {
        tracing::error!(error = %e, "OS entropy source failed while deriving a storage key");
        std::process::abort();
    }
    URL_SAFE_NO_PAD.encode(buf)
}
