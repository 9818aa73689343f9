//! Batch uploads: one pipeline per file, run concurrently, then settle.

use futures::future::join_all;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use stowage_core::{SourceFile, UploaderConfig};
use stowage_storage::{normalize_prefix, Storage};

use super::environment::{DirectoryHandle, SaveEnvironment};
use super::events::UploadEvents;
use super::persistence::LocalPersistence;
use super::pipeline::FilePipeline;
use super::tracker::ProgressTracker;
use super::transfer::TransferAgent;
use super::types::{BatchReport, BatchState};
use crate::image::{FormatNormalizer, ImageOptimizer};

/// Files started together and what they share.
pub struct BatchSession {
    pub prefix: String,
    pub file_count: usize,
    /// Granted at most once, before any pipeline starts; read-only afterwards.
    pub directory: Option<Arc<dyn DirectoryHandle>>,
}

pub struct UploadOrchestrator {
    normalizer: FormatNormalizer,
    optimizer: ImageOptimizer,
    persistence: LocalPersistence,
    transfer: TransferAgent,
    tracker: ProgressTracker,
    settle_delay: Duration,
    state: Mutex<BatchState>,
}

impl UploadOrchestrator {
    pub fn new(
        normalizer: FormatNormalizer,
        optimizer: ImageOptimizer,
        persistence: LocalPersistence,
        transfer: TransferAgent,
        settle_delay: Duration,
    ) -> Self {
        Self {
            normalizer,
            optimizer,
            persistence,
            transfer,
            tracker: ProgressTracker::new(),
            settle_delay,
            state: Mutex::new(BatchState::Idle),
        }
    }

    /// Orchestrator wired from configuration with the ffmpeg decoder.
    pub fn from_config(
        config: &UploaderConfig,
        storage: Arc<dyn Storage>,
        env: Arc<dyn SaveEnvironment>,
    ) -> Self {
        Self::new(
            FormatNormalizer::from_config(config),
            ImageOptimizer::from_config(config),
            LocalPersistence::new(env),
            TransferAgent::new(storage),
            config.settle_delay,
        )
    }

    /// Shared handle on per-file progress.
    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    pub fn state(&self) -> BatchState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: BatchState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// Upload `files` under `prefix`.
    ///
    /// Waits for every file, never stopping at the first failure. On success,
    /// fires `on_batch_complete` and clears progress after the settle delay;
    /// on failure, progress is kept so callers can show what failed.
    pub async fn upload_batch(
        &self,
        files: Vec<SourceFile>,
        prefix: &str,
        events: &dyn UploadEvents,
    ) -> BatchReport {
        if files.is_empty() {
            return BatchReport::new(Vec::new());
        }

        self.set_state(BatchState::Running);
        self.tracker.start(files.iter().map(SourceFile::name));

        let session = BatchSession {
            prefix: normalize_prefix(prefix),
            file_count: files.len(),
            directory: self.persistence.acquire_directory(files.len()).await,
        };

        tracing::info!(
            prefix = %session.prefix,
            file_count = session.file_count,
            batch_directory = session.directory.is_some(),
            "Starting upload batch"
        );

        let pipeline = FilePipeline {
            normalizer: &self.normalizer,
            optimizer: &self.optimizer,
            persistence: &self.persistence,
            transfer: &self.transfer,
        };

        let runs = files.iter().enumerate().map(|(index, file)| {
            let pipeline = &pipeline;
            let session = &session;
            async move {
                let on_percent = |percent: f64| {
                    if let Some(clamped) = self.tracker.set_progress(index, percent) {
                        events.on_progress(file.name(), clamped);
                    }
                };
                let report = pipeline
                    .run(file, &session.prefix, session.directory.as_deref(), &on_percent)
                    .await;
                self.tracker.set_outcome(index, report.outcome);
                report
            }
        });

        let report = BatchReport::new(join_all(runs).await);

        if report.success {
            tracing::info!(file_count = report.files.len(), "Upload batch complete");
            events.on_batch_complete();
            tokio::time::sleep(self.settle_delay).await;
            self.tracker.clear();
        } else {
            let failed: Vec<&str> = report.failed().map(|f| f.original_name.as_str()).collect();
            tracing::warn!(
                failed = ?failed,
                failed_count = failed.len(),
                file_count = report.files.len(),
                "Upload batch finished with failures"
            );
        }

        self.set_state(BatchState::Settled);
        report
    }
}
