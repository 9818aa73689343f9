//! Configuration module
//!
//! This module provides the configuration for the storage backend and the
//! upload pipeline, loaded from the environment (and `.env` when present).

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{
    BYTES_PER_MB, DEFAULT_LEGACY_IMAGE_SUFFIXES, DEFAULT_MAX_IMAGE_SIZE_MB,
    DEFAULT_OPTIMIZE_MIN_DIMENSION, DEFAULT_S3_PART_SIZE_MB, DEFAULT_SETTLE_DELAY_MS,
};
use crate::storage_types::StorageBackend;

/// Minimum multipart part size accepted by S3.
const MIN_S3_PART_SIZE_MB: usize = 5;

/// Upload pipeline and storage configuration
#[derive(Clone, Debug)]
pub struct UploaderConfig {
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub aws_region: Option<String>,
    pub s3_part_size_bytes: usize,
    pub local_storage_path: Option<PathBuf>,
    pub local_storage_base_url: Option<String>,
    // Image pipeline configuration
    pub max_image_size_bytes: u64,
    pub optimize_min_dimension: u32,
    pub legacy_image_suffixes: Vec<String>,
    pub ffmpeg_path: String,
    // Batch behaviour
    pub settle_delay: Duration,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            storage_backend: StorageBackend::S3,
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            aws_region: None,
            s3_part_size_bytes: DEFAULT_S3_PART_SIZE_MB * BYTES_PER_MB as usize,
            local_storage_path: None,
            local_storage_base_url: None,
            max_image_size_bytes: DEFAULT_MAX_IMAGE_SIZE_MB * BYTES_PER_MB,
            optimize_min_dimension: DEFAULT_OPTIMIZE_MIN_DIMENSION,
            legacy_image_suffixes: DEFAULT_LEGACY_IMAGE_SUFFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            ffmpeg_path: "ffmpeg".to_string(),
            settle_delay: Duration::from_millis(DEFAULT_SETTLE_DELAY_MS),
        }
    }
}

fn parse_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn non_empty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Split a comma-separated suffix list into lowercase suffixes without dots.
pub fn parse_suffix_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_start_matches('.').to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

impl UploaderConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let storage_backend = match non_empty("STORAGE_BACKEND") {
            Some(s) => s.parse::<StorageBackend>()?,
            None => defaults.storage_backend,
        };

        let max_image_size_mb = parse_or("MAX_UPLOAD_IMAGE_SIZE_MB", DEFAULT_MAX_IMAGE_SIZE_MB);
        let part_size_mb = parse_or("S3_PART_SIZE_MB", DEFAULT_S3_PART_SIZE_MB);
        let settle_delay_ms = parse_or("SETTLE_DELAY_MS", DEFAULT_SETTLE_DELAY_MS);

        let legacy_image_suffixes = match env::var("LEGACY_IMAGE_SUFFIXES") {
            Ok(raw) => parse_suffix_list(&raw),
            Err(_) => defaults.legacy_image_suffixes,
        };

        let config = UploaderConfig {
            storage_backend,
            s3_bucket: non_empty("S3_BUCKET"),
            s3_region: non_empty("S3_REGION"),
            s3_endpoint: non_empty("S3_ENDPOINT"),
            aws_region: non_empty("AWS_REGION"),
            s3_part_size_bytes: part_size_mb * BYTES_PER_MB as usize,
            local_storage_path: non_empty("LOCAL_STORAGE_PATH").map(PathBuf::from),
            local_storage_base_url: non_empty("LOCAL_STORAGE_BASE_URL"),
            max_image_size_bytes: max_image_size_mb * BYTES_PER_MB,
            optimize_min_dimension: parse_or(
                "OPTIMIZE_MIN_DIMENSION",
                DEFAULT_OPTIMIZE_MIN_DIMENSION,
            ),
            legacy_image_suffixes,
            ffmpeg_path: non_empty("FFMPEG_PATH").unwrap_or(defaults.ffmpeg_path),
            settle_delay: Duration::from_millis(settle_delay_ms),
        };

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
                if self.s3_part_size_bytes < MIN_S3_PART_SIZE_MB * BYTES_PER_MB as usize {
                    return Err(anyhow::anyhow!(
                        "S3_PART_SIZE_MB must be at least {}",
                        MIN_S3_PART_SIZE_MB
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
            }
        }

        if self.max_image_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_IMAGE_SIZE_MB must be positive"));
        }

        Ok(())
    }

    // Convenience getters used by the storage factory
    pub fn s3_bucket(&self) -> Option<&str> {
        self.s3_bucket.as_deref()
    }

    /// S3 region, falling back to `AWS_REGION`.
    pub fn s3_region(&self) -> Option<&str> {
        self.s3_region.as_deref().or(self.aws_region.as_deref())
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.s3_endpoint.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&PathBuf> {
        self.local_storage_path.as_ref()
    }

    /// Base URL for local objects, defaulting to a `file://` URL of the storage path.
    pub fn local_storage_base_url(&self) -> String {
        match (&self.local_storage_base_url, &self.local_storage_path) {
            (Some(url), _) => url.clone(),
            (None, Some(path)) => format!("file://{}", path.display()),
            (None, None) => "file://".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_pipeline_policy() {
        let config = UploaderConfig::default();
        assert_eq!(config.max_image_size_bytes, 10 * 1024 * 1024);
        assert_eq!(config.optimize_min_dimension, 1920);
        assert_eq!(config.legacy_image_suffixes, vec!["heic", "heif"]);
        assert_eq!(config.settle_delay, Duration::from_secs(1));
    }

    #[test]
    fn test_parse_suffix_list() {
        assert_eq!(
            parse_suffix_list(" .HEIC, heif ,,dng"),
            vec!["heic", "heif", "dng"]
        );
        assert!(parse_suffix_list("").is_empty());
    }

    #[test]
    fn test_validate_s3_requires_bucket_and_region() {
        let mut config = UploaderConfig::default();
        assert!(config.validate().is_err());

        config.s3_bucket = Some("files".to_string());
        assert!(config.validate().is_err());

        config.aws_region = Some("eu-west-1".to_string());
        assert!(config.validate().is_ok());
        assert_eq!(config.s3_region(), Some("eu-west-1"));
    }

    #[test]
    fn test_validate_rejects_small_part_size() {
        let config = UploaderConfig {
            s3_bucket: Some("files".to_string()),
            s3_region: Some("us-east-1".to_string()),
            s3_part_size_bytes: 1024,
            ..UploaderConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_local_requires_path() {
        let mut config = UploaderConfig {
            storage_backend: StorageBackend::Local,
            ..UploaderConfig::default()
        };
        assert!(config.validate().is_err());

        config.local_storage_path = Some(PathBuf::from("/tmp/stowage"));
        assert!(config.validate().is_ok());
        assert_eq!(config.local_storage_base_url(), "file:///tmp/stowage");
    }
}
