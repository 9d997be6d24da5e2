use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Storage backend types
///
/// Defined in core because configuration selects the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    S3,
    Local,
    /// Process memory. Development only: contents are lost on restart and not shared between workers.
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "s3" => Ok(StorageBackend::S3),
            "local" => Ok(StorageBackend::Local),
            "memory" => Ok(StorageBackend::Memory),
            _ => Err(anyhow::anyhow!("Invalid storage backend: {}", s)),
        }
    }
}

impl Display for StorageBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StorageBackend::S3 => write!(f, "s3"),
            StorageBackend::Local => write!(f, "local"),
            StorageBackend::Memory => write!(f, "memory"),
        }
    }
}

/// How public asset URLs are built from storage keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlStrategyKind {
    /// Served by this process under the `/assets` mount.
    Local,
    /// Bucket-hosted S3 URL.
    S3,
    /// CDN distribution in front of the bucket.
    CloudFront,
}

impl FromStr for UrlStrategyKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(UrlStrategyKind::Local),
            "s3" => Ok(UrlStrategyKind::S3),
            "cloudfront" | "cdn" => Ok(UrlStrategyKind::CloudFront),
            _ => Err(anyhow::anyhow!("Invalid public URL strategy: {}", s)),
        }
    }
}

impl Display for UrlStrategyKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            UrlStrategyKind::Local => write!(f, "local"),
            UrlStrategyKind::S3 => write!(f, "s3"),
            UrlStrategyKind::CloudFront => write!(f, "cloudfront"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_backend_parse() {
        assert_eq!("S3".parse::<StorageBackend>().unwrap(), StorageBackend::S3);
        assert_eq!(
            "memory".parse::<StorageBackend>().unwrap(),
            StorageBackend::Memory
        );
        assert!("nfs".parse::<StorageBackend>().is_err());
        assert_eq!(StorageBackend::Local.to_string(), "local");
    }

    #[test]
    fn test_url_strategy_parse() {
        assert_eq!(
            "cdn".parse::<UrlStrategyKind>().unwrap(),
            UrlStrategyKind::CloudFront
        );
        assert_eq!(UrlStrategyKind::CloudFront.to_string(), "cloudfront");
        assert!("ftp".parse::<UrlStrategyKind>().is_err());
    }
}
