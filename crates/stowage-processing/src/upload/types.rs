//! Types for the upload pipeline.

use stowage_core::UploadOutcome;

use crate::stage::StageStatus;

/// Lifecycle of a batch inside the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchState {
    #[default]
    Idle,
    Running,
    Settled,
}

/// Side effect of offering the user a local copy of a transformed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalSaveEffect {
    /// The file was not transformed, so nothing was offered.
    Skipped,
    SavedViaPrompt,
    WrittenToDirectory,
    Downloaded,
    /// The user dismissed the save prompt.
    Cancelled,
    Failed { reason: String },
}

/// Result of one file's pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct FileReport {
    /// Name as supplied by the user.
    pub original_name: String,
    /// Name after normalization, used for the object key.
    pub final_name: String,
    pub key: String,
    /// Content type the object was stored with.
    pub media_type: String,
    pub size_bytes: u64,
    pub was_transformed: bool,
    pub normalize: StageStatus,
    pub optimize: StageStatus,
    pub local_save: LocalSaveEffect,
    pub outcome: UploadOutcome,
}

impl FileReport {
    pub fn succeeded(&self) -> bool {
        self.outcome == UploadOutcome::Success
    }
}

/// Result of a whole batch; `success` is the AND of every file's outcome.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
    pub success: bool,
}

impl BatchReport {
    pub fn new(files: Vec<FileReport>) -> Self {
        let success = files.iter().all(FileReport::succeeded);
        Self { files, success }
    }

    pub fn failed(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| !f.succeeded())
    }

    pub fn file(&self, original_name: &str) -> Option<&FileReport> {
        self.files.iter().find(|f| f.original_name == original_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(name: &str, outcome: UploadOutcome) -> FileReport {
        FileReport {
            original_name: name.to_string(),
            final_name: name.to_string(),
            key: name.to_string(),
            media_type: "text/plain".to_string(),
            size_bytes: 1,
            was_transformed: false,
            normalize: StageStatus::Skipped,
            optimize: StageStatus::Skipped,
            local_save: LocalSaveEffect::Skipped,
            outcome,
        }
    }

    #[test]
    fn test_batch_success_is_and_of_outcomes() {
        let ok = BatchReport::new(vec![
            report("a", UploadOutcome::Success),
            report("b", UploadOutcome::Success),
        ]);
        assert!(ok.success);
        assert_eq!(ok.failed().count(), 0);

        let partial = BatchReport::new(vec![
            report("a", UploadOutcome::Success),
            report("b", UploadOutcome::Failure),
        ]);
        assert!(!partial.success);
        let failed: Vec<_> = partial.failed().map(|f| f.original_name.as_str()).collect();
        assert_eq!(failed, vec!["b"]);
        assert!(partial.file("a").unwrap().succeeded());
    }
}
