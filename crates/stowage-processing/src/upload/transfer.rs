//! Upload of finished artifacts to the object store.

use std::sync::Arc;
use stowage_core::PipelineArtifact;
use stowage_storage::{object_key, percent, Storage};

pub struct TransferAgent {
    storage: Arc<dyn Storage>,
}

impl TransferAgent {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Key the artifact is stored under.
    pub fn key_for(&self, artifact: &PipelineArtifact, prefix: &str) -> String {
        object_key(prefix, &artifact.name)
    }

    /// Put `artifact` under `prefix + name`, reporting percent complete.
    ///
    /// Transport errors are logged and reported as `false`.
    pub async fn transfer(
        &self,
        artifact: &PipelineArtifact,
        prefix: &str,
        on_percent: &(dyn Fn(f64) + Send + Sync),
    ) -> bool {
        let key = self.key_for(artifact, prefix);
        let start = std::time::Instant::now();
        let sink = |sent: u64, total: u64| on_percent(percent(sent, total));

        match self
            .storage
            .put_stream(&key, &artifact.media_type, artifact.bytes.clone(), &sink)
            .await
        {
            Ok(()) => {
                tracing::info!(
                    key = %key,
                    content_type = %artifact.media_type,
                    size_bytes = artifact.size(),
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Upload complete"
                );
                true
            }
            Err(e) => {
                tracing::error!(
                    key = %key,
                    error = %e,
                    size_bytes = artifact.size(),
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Upload failed"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::sync::Mutex;
    use stowage_core::SourceFile;
    use stowage_storage::test_helpers::MockStorage;

    #[tokio::test]
    async fn test_transfer_puts_under_prefix() {
        let storage = MockStorage::new();
        let agent = TransferAgent::new(Arc::new(storage.clone()));
        let artifact = SourceFile::new("a.txt", "text/plain", b"hello".to_vec()).to_artifact();
        let seen = Mutex::new(Vec::new());

        let ok = agent
            .transfer(&artifact, "docs/", &|p| seen.lock().unwrap().push(p))
            .await;

        assert!(ok);
        assert_eq!(storage.get_file("docs/a.txt"), Some(Bytes::from("hello")));
        let puts = storage.puts();
        assert_eq!(puts[0].content_type, "text/plain");
        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.first(), Some(&0.0));
        assert_eq!(seen.last(), Some(&100.0));
    }

    #[tokio::test]
    async fn test_transfer_failure_is_false() {
        let storage = MockStorage::new();
        storage.fail_on("a.txt");
        let agent = TransferAgent::new(Arc::new(storage.clone()));
        let artifact = SourceFile::new("a.txt", "text/plain", b"hello".to_vec()).to_artifact();

        assert!(!agent.transfer(&artifact, "", &|_| {}).await);
        assert!(!storage.has_file("a.txt"));
    }

    #[tokio::test]
    async fn test_empty_payload_reports_complete() {
        let storage = MockStorage::new();
        let agent = TransferAgent::new(Arc::new(storage));
        let artifact = SourceFile::new("empty.txt", "text/plain", Vec::new()).to_artifact();
        let last = Mutex::new(0.0);

        assert!(agent.transfer(&artifact, "", &|p| *last.lock().unwrap() = p).await);
        assert_eq!(*last.lock().unwrap(), 100.0);
    }
}
