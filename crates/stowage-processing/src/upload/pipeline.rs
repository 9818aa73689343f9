//! Upload pipeline for one file: normalize → optimize → persist → transfer.
//!
//! Every stage hands on an artifact even when it fails, so a file only ends
//! in `Failure` when the transfer itself fails.

use stowage_core::{SourceFile, UploadOutcome};

use super::environment::DirectoryHandle;
use super::persistence::LocalPersistence;
use super::transfer::TransferAgent;
use super::types::FileReport;
use crate::image::{FormatNormalizer, ImageOptimizer};

/// The stages a file goes through, borrowed from the orchestrator.
pub struct FilePipeline<'a> {
    pub normalizer: &'a FormatNormalizer,
    pub optimizer: &'a ImageOptimizer,
    pub persistence: &'a LocalPersistence,
    pub transfer: &'a TransferAgent,
}

impl FilePipeline<'_> {
    /// Run one file to completion. Never fails; the outcome is in the report.
    pub async fn run(
        &self,
        file: &SourceFile,
        prefix: &str,
        directory: Option<&dyn DirectoryHandle>,
        on_percent: &(dyn Fn(f64) + Send + Sync),
    ) -> FileReport {
        let normalized = self.normalizer.normalize(file.to_artifact()).await;
        let normalize = normalized.status();

        let optimized = self.optimizer.optimize(normalized.into_inner()).await;
        let optimize = optimized.status();
        let artifact = optimized.into_inner();

        let local_save = self.persistence.persist(&artifact, directory).await;

        let key = self.transfer.key_for(&artifact, prefix);
        let uploaded = self.transfer.transfer(&artifact, prefix, on_percent).await;

        FileReport {
            original_name: file.name().to_string(),
            final_name: artifact.name,
            key,
            media_type: artifact.media_type,
            size_bytes: artifact.bytes.len() as u64,
            was_transformed: artifact.was_transformed,
            normalize,
            optimize,
            local_save,
            outcome: if uploaded {
                UploadOutcome::Success
            } else {
                UploadOutcome::Failure
            },
        }
    }
}
