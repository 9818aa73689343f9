//! Per-file upload state as observed by callers.

use serde::{Deserialize, Serialize};

/// Terminal or pending state of one file in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadOutcome {
    Pending,
    Success,
    Failure,
}

impl UploadOutcome {
    pub fn is_terminal(self) -> bool {
        !matches!(self, UploadOutcome::Pending)
    }
}

/// Progress of a single file within a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadTask {
    /// Name of the file as supplied by the user.
    pub name: String,
    /// Transfer progress, 0 to 100.
    pub progress: f64,
    pub outcome: UploadOutcome,
}

impl UploadTask {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            progress: 0.0,
            outcome: UploadOutcome::Pending,
        }
    }

    /// Record a progress update, clamped to `0..=100`.
    pub fn set_progress(&mut self, percent: f64) {
        self.progress = if percent.is_nan() {
            0.0
        } else {
            percent.clamp(0.0, 100.0)
        };
    }
}
