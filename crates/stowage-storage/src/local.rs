use crate::keys::validate_key;
use crate::traits::{Listing, ObjectEntry, ProgressSink, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Chunk size used when writing uploads, so progress has useful granularity.
const WRITE_CHUNK_SIZE: usize = 64 * 1024;

/// Local filesystem storage implementation
///
/// Keys map to paths below `base_path`; `/` in a key becomes a directory.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for object storage (e.g., "/var/lib/stowage")
    /// * `base_url` - Base URL for serving objects (e.g., "http://localhost:3000/files")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
        })
    }

    /// Convert storage key to filesystem path with security validation
    ///
    /// This function validates that the storage key doesn't contain path traversal
    /// sequences that could escape the base storage directory.
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        validate_key(storage_key)?;

        let path = self.base_path.join(storage_key);

        let base_canonical = self.base_path.canonicalize().map_err(|e| {
            StorageError::ConfigError(format!("Failed to canonicalize base path: {}", e))
        })?;

        if let Ok(canonical) = path.canonicalize() {
            if canonical.strip_prefix(&base_canonical).is_err() {
                return Err(StorageError::InvalidKey(
                    "Storage key resolves outside storage directory".to_string(),
                ));
            }
        }

        Ok(path)
    }

    /// Directory backing a listing prefix; the root for an empty prefix.
    fn prefix_to_dir(&self, prefix: &str) -> StorageResult<PathBuf> {
        if prefix.is_empty() {
            return Ok(self.base_path.clone());
        }
        self.key_to_path(prefix.trim_end_matches('/'))
    }

    /// Generate public URL for file
    fn generate_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn put_stream(
        &self,
        key: &str,
        _content_type: &str,
        data: Bytes,
        progress: &dyn ProgressSink,
    ) -> StorageResult<()> {
        let path = self.key_to_path(key)?;
        let total = data.len() as u64;

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        let mut sent = 0u64;
        progress.on_progress(sent, total);
        for chunk in data.chunks(WRITE_CHUNK_SIZE) {
            file.write_all(chunk).await.map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to write file {}: {}",
                    path.display(),
                    e
                ))
            })?;
            sent += chunk.len() as u64;
            progress.on_progress(sent, total);
        }
        if total == 0 {
            progress.on_progress(0, 0);
        }

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = total,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(())
    }

    async fn get(&self, key: &str) -> StorageResult<Bytes> {
        let path = self.key_to_path(key)?;
        let start = std::time::Instant::now();

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(key.to_string()));
        }

        let data = fs::read(&path).await.map_err(|e| {
            StorageError::DownloadFailed(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage download successful"
        );

        Ok(Bytes::from(data))
    }

    async fn list(&self, prefix: &str) -> StorageResult<Listing> {
        let dir = self.prefix_to_dir(prefix)?;
        let mut listing = Listing::default();

        if !fs::try_exists(&dir).await.unwrap_or(false) {
            return Ok(listing);
        }

        let mut entries = fs::read_dir(&dir).await.map_err(|e| {
            StorageError::BackendError(format!("Failed to list {}: {}", dir.display(), e))
        })?;

        while let Some(entry) = entries.next_entry().await? {
            let Some(name) = entry.file_name().to_str().map(String::from) else {
                tracing::warn!(path = %entry.path().display(), "Skipping non UTF-8 file name");
                continue;
            };
            let metadata = entry.metadata().await?;
            if metadata.is_dir() {
                listing.common_prefixes.push(format!("{}{}/", prefix, name));
            } else {
                listing.objects.push(ObjectEntry {
                    key: format!("{}{}", prefix, name),
                    size: metadata.len(),
                    last_modified: metadata.modified().ok().map(DateTime::<Utc>::from),
                });
            }
        }

        // read_dir order is platform dependent; S3 lists lexicographically.
        listing.common_prefixes.sort();
        listing.objects.sort_by(|a, b| a.key.cmp(&b.key));

        Ok(listing)
    }

    async fn copy(&self, from_key: &str, to_key: &str) -> StorageResult<()> {
        let from_path = self.key_to_path(from_key)?;
        let to_path = self.key_to_path(to_key)?;

        if !fs::try_exists(&from_path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(from_key.to_string()));
        }

        self.ensure_parent_dir(&to_path).await?;

        fs::copy(&from_path, &to_path).await.map_err(|e| {
            StorageError::BackendError(format!(
                "Failed to copy {} to {}: {}",
                from_path.display(),
                to_path.display(),
                e
            ))
        })?;

        tracing::info!(
            from_key = %from_key,
            to_key = %to_key,
            "Local storage copy successful"
        );

        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.key_to_path(key)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(());
        }

        fs::remove_file(&path).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to delete file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %key,
            "Local storage delete successful"
        );

        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(key)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    fn object_url(&self, key: &str) -> String {
        self.generate_url(key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::NoOpProgress;
    use std::sync::Mutex;
    use tempfile::tempdir;

    async fn storage(dir: &Path) -> LocalStorage {
        LocalStorage::new(dir, "http://localhost:3000/files".to_string())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_local_storage_put_get() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let data = Bytes::from_static(b"test data");
        storage
            .put_stream("docs/test.txt", "text/plain", data.clone(), &NoOpProgress)
            .await
            .unwrap();

        assert_eq!(storage.get("docs/test.txt").await.unwrap(), data);
        assert_eq!(
            storage.object_url("docs/test.txt"),
            "http://localhost:3000/files/docs/test.txt"
        );
    }

    #[tokio::test]
    async fn test_put_reports_progress_up_to_total() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let seen = Mutex::new(Vec::new());
        let sink = |sent: u64, total: u64| seen.lock().unwrap().push((sent, total));
        let data = Bytes::from(vec![7u8; WRITE_CHUNK_SIZE * 2 + 10]);
        let total = data.len() as u64;

        storage
            .put_stream("big.bin", "application/octet-stream", data, &sink)
            .await
            .unwrap();

        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.first(), Some(&(0, total)));
        assert_eq!(seen.last(), Some(&(total, total)));
        assert_eq!(seen.len(), 4);
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let result = storage.get("../../../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.delete("../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.exists("/etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_local_storage_delete_nonexistent() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        assert!(storage.delete("nonexistent/file.txt").await.is_ok());
    }

    #[tokio::test]
    async fn test_local_storage_list_splits_folders_and_files() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        for key in ["b.txt", "a.txt", "photos/x.jpg", "photos/2024/y.jpg"] {
            storage
                .put_stream(key, "text/plain", Bytes::from_static(b"x"), &NoOpProgress)
                .await
                .unwrap();
        }

        let root = storage.list("").await.unwrap();
        assert_eq!(root.common_prefixes, vec!["photos/"]);
        let keys: Vec<_> = root.objects.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["a.txt", "b.txt"]);

        let photos = storage.list("photos/").await.unwrap();
        assert_eq!(photos.common_prefixes, vec!["photos/2024/"]);
        assert_eq!(photos.objects[0].key, "photos/x.jpg");
        assert_eq!(photos.objects[0].size, 1);

        let missing = storage.list("nothing/").await.unwrap();
        assert_eq!(missing, Listing::default());
    }

    #[tokio::test]
    async fn test_local_storage_copy() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let data = Bytes::from_static(b"original content");
        storage
            .put_stream("original.txt", "text/plain", data.clone(), &NoOpProgress)
            .await
            .unwrap();

        storage.copy("original.txt", "nested/copied.txt").await.unwrap();

        assert_eq!(storage.get("nested/copied.txt").await.unwrap(), data);
        assert!(storage.exists("original.txt").await.unwrap());
        assert!(matches!(
            storage.copy("missing.txt", "x.txt").await,
            Err(StorageError::NotFound(_))
        ));
    }
}
