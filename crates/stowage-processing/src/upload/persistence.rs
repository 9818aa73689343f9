//! Offering the user a local copy of files the pipeline changed.

use std::sync::Arc;
use stowage_core::{media, PipelineArtifact};

use super::environment::{DirectoryHandle, LocalSaveError, SaveEnvironment};
use super::types::LocalSaveEffect;

pub struct LocalPersistence {
    env: Arc<dyn SaveEnvironment>,
}

impl LocalPersistence {
    pub fn new(env: Arc<dyn SaveEnvironment>) -> Self {
        Self { env }
    }

    /// Pick the batch directory. Only asked for batches of more than one file.
    pub async fn acquire_directory(&self, file_count: usize) -> Option<Arc<dyn DirectoryHandle>> {
        if file_count <= 1 || !self.env.supports_directory_picker() {
            return None;
        }

        match self.env.pick_directory().await {
            Ok(Some(handle)) => {
                tracing::info!(directory = %handle.name(), file_count, "Batch directory selected");
                Some(handle)
            }
            Ok(None) => {
                tracing::info!("Directory picker cancelled, saving files one by one");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Directory picker failed, saving files one by one");
                None
            }
        }
    }

    /// Keep a local copy of `artifact` if the pipeline transformed it.
    ///
    /// Writes into `directory` when one was granted for the batch, falling
    /// back to the single-file path for this file if that write fails.
    pub async fn persist(
        &self,
        artifact: &PipelineArtifact,
        directory: Option<&dyn DirectoryHandle>,
    ) -> LocalSaveEffect {
        if !artifact.was_transformed {
            return LocalSaveEffect::Skipped;
        }

        if let Some(dir) = directory {
            match dir.write_file(&artifact.name, &artifact.bytes).await {
                Ok(()) => return LocalSaveEffect::WrittenToDirectory,
                Err(e) => tracing::warn!(
                    file_name = %artifact.name,
                    directory = %dir.name(),
                    error = %e,
                    "Directory write failed, falling back to single-file save"
                ),
            }
        }

        self.save_single(artifact).await
    }

    async fn save_single(&self, artifact: &PipelineArtifact) -> LocalSaveEffect {
        if !self.env.supports_save_prompt() {
            return match self.env.download(&artifact.name, &artifact.bytes).await {
                Ok(_) => LocalSaveEffect::Downloaded,
                Err(e) => {
                    tracing::warn!(file_name = %artifact.name, error = %e, "Download failed");
                    LocalSaveEffect::Failed {
                        reason: e.to_string(),
                    }
                }
            };
        }

        let extension = media::extension_for_media_type(&artifact.media_type);
        match self
            .env
            .prompt_save(&artifact.name, &artifact.media_type, extension, &artifact.bytes)
            .await
        {
            Ok(()) => LocalSaveEffect::SavedViaPrompt,
            Err(LocalSaveError::Cancelled) => {
                tracing::debug!(file_name = %artifact.name, "Save prompt cancelled");
                LocalSaveEffect::Cancelled
            }
            Err(e) => {
                tracing::warn!(file_name = %artifact.name, error = %e, "Save prompt failed");
                LocalSaveEffect::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}
