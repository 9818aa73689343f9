//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Receives transfer progress as bytes sent out of total bytes.
///
/// Called at whatever granularity the backend provides. Values are not
/// guaranteed to be monotonic across retries.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, sent: u64, total: u64);
}

/// A progress sink that ignores every update.
pub struct NoOpProgress;

impl ProgressSink for NoOpProgress {
    fn on_progress(&self, _sent: u64, _total: u64) {}
}

impl<F> ProgressSink for F
where
    F: Fn(u64, u64) + Send + Sync,
{
    fn on_progress(&self, sent: u64, total: u64) {
        self(sent, total)
    }
}

/// Percentage of a transfer, `(sent / total) * 100`. Empty payloads are complete.
pub fn percent(sent: u64, total: u64) -> f64 {
    if total == 0 {
        return 100.0;
    }
    (sent as f64 / total as f64) * 100.0
}

/// One object in a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
}

/// One level of the key hierarchy below a prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    /// Child "folders", each a full prefix ending in the delimiter.
    pub common_prefixes: Vec<String>,
    /// Objects directly under the prefix.
    pub objects: Vec<ObjectEntry>,
}

/// Storage abstraction trait
///
/// All storage backends (S3, local filesystem) must implement this trait.
/// Keys live in a flat namespace; `/` emulates folders.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Upload `data` under `key`, overwriting any existing object, and report
    /// progress to `progress` while the body is transferred.
    async fn put_stream(
        &self,
        key: &str,
        content_type: &str,
        data: Bytes,
        progress: &dyn ProgressSink,
    ) -> StorageResult<()>;

    /// Download an object by key
    async fn get(&self, key: &str) -> StorageResult<Bytes>;

    /// List one level below `prefix` using `/` as the delimiter.
    ///
    /// `prefix` is either empty (root) or ends with `/`.
    async fn list(&self, prefix: &str) -> StorageResult<Listing>;

    /// Copy an object from one key to another
    async fn copy(&self, from_key: &str, to_key: &str) -> StorageResult<()>;

    /// Delete an object by key. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Check if an object exists
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Public URL (or location) of an object
    fn object_url(&self, key: &str) -> String;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
