//! Public URL construction for published assets.

use crate::{StorageError, StorageResult};
use tubely_core::{Config, UrlStrategyKind};

/// Template used to turn a storage key into a URL clients can fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlStrategy {
    /// `{base_url}/{key}`, served by this process under `/assets`
    LocalMount { base_url: String },
    /// `https://{bucket}.s3.{region}.amazonaws.com/{key}`, or path-style
    /// `{endpoint}/{bucket}/{key}` for S3-compatible providers
    S3 {
        bucket: String,
        region: String,
        endpoint: Option<String>,
    },
    /// `https://{distribution}/{key}`
    CloudFront { distribution: String },
}

impl UrlStrategy {
    pub fn from_config(config: &Config) -> StorageResult<Self> {
        match config.public_url_strategy() {
            UrlStrategyKind::Local => Ok(UrlStrategy::LocalMount {
                base_url: config.assets_base_url().to_string(),
            }),
            UrlStrategyKind::S3 => {
                let bucket = config.s3_bucket().ok_or_else(|| {
                    StorageError::ConfigError("S3_BUCKET not configured".to_string())
                })?;
                let region = config.s3_region().ok_or_else(|| {
                    StorageError::ConfigError("S3_REGION or AWS_REGION not configured".to_string())
                })?;
                Ok(UrlStrategy::S3 {
                    bucket: bucket.to_string(),
                    region: region.to_string(),
                    endpoint: config.s3_endpoint().map(String::from),
                })
            }
            UrlStrategyKind::CloudFront => {
                let distribution = config.cloudfront_distribution().ok_or_else(|| {
                    StorageError::ConfigError("CLOUDFRONT_DISTRIBUTION not configured".to_string())
                })?;
                Ok(UrlStrategy::CloudFront {
                    distribution: distribution.to_string(),
                })
            }
        }
    }

    pub fn public_url(&self, storage_key: &str) -> String {
        match self {
            UrlStrategy::LocalMount { base_url } => {
                format!("{}/{}", base_url.trim_end_matches('/'), storage_key)
            }
            UrlStrategy::S3 {
                bucket,
                endpoint: Some(endpoint),
                ..
            } => format!("{}/{}/{}", endpoint.trim_end_matches('/'), bucket, storage_key),
            UrlStrategy::S3 {
                bucket,
                region,
                endpoint: None,
            } => format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                bucket, region, storage_key
            ),
            UrlStrategy::CloudFront { distribution } => format!(
                "https://{}/{}",
                distribution
                    .trim_start_matches("https://")
                    .trim_end_matches('/'),
                storage_key
            ),
        }
    }
}
