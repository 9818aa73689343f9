//! Mock Storage implementation for testing

use crate::traits::{Listing, ObjectEntry, ProgressSink, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Arc, Mutex};

/// One recorded `put_stream` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedPut {
    pub key: String,
    pub content_type: String,
    pub data: Bytes,
}

/// Mock storage implementation that stores objects in memory
///
/// Uploads to keys registered with [`MockStorage::fail_on`] fail after
/// reporting partial progress.
#[derive(Clone)]
pub struct MockStorage {
    files: Arc<Mutex<BTreeMap<String, Bytes>>>,
    puts: Arc<Mutex<Vec<RecordedPut>>>,
    fail_keys: Arc<Mutex<HashSet<String>>>,
    backend_type: StorageBackend,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::with_backend(StorageBackend::Local)
    }

    pub fn with_backend(backend_type: StorageBackend) -> Self {
        Self {
            files: Arc::new(Mutex::new(BTreeMap::new())),
            puts: Arc::new(Mutex::new(Vec::new())),
            fail_keys: Arc::new(Mutex::new(HashSet::new())),
            backend_type,
        }
    }

    /// Make every upload to `key` fail
    pub fn fail_on(&self, key: &str) {
        self.fail_keys.lock().unwrap().insert(key.to_string());
    }

    /// Set an object in the mock storage
    pub fn set_file(&self, key: &str, data: impl Into<Bytes>) {
        self.files.lock().unwrap().insert(key.to_string(), data.into());
    }

    /// Check if an object exists in the mock storage
    pub fn has_file(&self, key: &str) -> bool {
        self.files.lock().unwrap().contains_key(key)
    }

    /// Get object data (for test assertions)
    pub fn get_file(&self, key: &str) -> Option<Bytes> {
        self.files.lock().unwrap().get(key).cloned()
    }

    /// All stored keys in lexicographic order
    pub fn keys(&self) -> Vec<String> {
        self.files.lock().unwrap().keys().cloned().collect()
    }

    /// Every upload attempt, including failed ones, in call order
    pub fn puts(&self) -> Vec<RecordedPut> {
        self.puts.lock().unwrap().clone()
    }
}

impl Default for MockStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for MockStorage {
    async fn put_stream(
        &self,
        key: &str,
        content_type: &str,
        data: Bytes,
        progress: &dyn ProgressSink,
    ) -> StorageResult<()> {
        crate::keys::validate_key(key)?;

        self.puts.lock().unwrap().push(RecordedPut {
            key: key.to_string(),
            content_type: content_type.to_string(),
            data: data.clone(),
        });

        let total = data.len() as u64;
        progress.on_progress(0, total);
        progress.on_progress(total / 2, total);

        if self.fail_keys.lock().unwrap().contains(key) {
            return Err(StorageError::UploadFailed(format!(
                "Simulated failure for {}",
                key
            )));
        }

        self.files.lock().unwrap().insert(key.to_string(), data);
        progress.on_progress(total, total);
        Ok(())
    }

    async fn get(&self, key: &str) -> StorageResult<Bytes> {
        self.get_file(key)
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn list(&self, prefix: &str) -> StorageResult<Listing> {
        let files = self.files.lock().unwrap();
        let mut common_prefixes = BTreeSet::new();
        let mut objects = Vec::new();

        for (key, data) in files.range(prefix.to_string()..) {
            let Some(rest) = key.strip_prefix(prefix) else {
                break;
            };
            match rest.find('/') {
                Some(idx) => {
                    common_prefixes.insert(format!("{}{}", prefix, &rest[..=idx]));
                }
                None => objects.push(ObjectEntry {
                    key: key.clone(),
                    size: data.len() as u64,
                    last_modified: None,
                }),
            }
        }

        Ok(Listing {
            common_prefixes: common_prefixes.into_iter().collect(),
            objects,
        })
    }

    async fn copy(&self, from_key: &str, to_key: &str) -> StorageResult<()> {
        let data = self.get(from_key).await?;
        self.files.lock().unwrap().insert(to_key.to_string(), data);
        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.files.lock().unwrap().remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        Ok(self.has_file(key))
    }

    fn object_url(&self, key: &str) -> String {
        format!("https://example.com/{}", key)
    }

    fn backend_type(&self) -> StorageBackend {
        self.backend_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::NoOpProgress;

    #[tokio::test]
    async fn test_mock_list_uses_delimiter() {
        let storage = MockStorage::new();
        storage.set_file("a/", Bytes::new());
        storage.set_file("a/x.txt", "x");
        storage.set_file("a/b/y.txt", "y");
        storage.set_file("c.txt", "c");

        let root = storage.list("").await.unwrap();
        assert_eq!(root.common_prefixes, vec!["a/"]);
        assert_eq!(root.objects.len(), 1);

        let a = storage.list("a/").await.unwrap();
        assert_eq!(a.common_prefixes, vec!["a/b/"]);
        let keys: Vec<_> = a.objects.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["a/", "a/x.txt"]);
    }

    #[tokio::test]
    async fn test_mock_forced_failure_is_recorded() {
        let storage = MockStorage::new();
        storage.fail_on("bad.txt");

        let result = storage
            .put_stream("bad.txt", "text/plain", Bytes::from_static(b"x"), &NoOpProgress)
            .await;

        assert!(matches!(result, Err(StorageError::UploadFailed(_))));
        assert!(!storage.has_file("bad.txt"));
        assert_eq!(storage.puts().len(), 1);
    }
}
