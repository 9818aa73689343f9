//! Shared per-file progress for the running batch.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use stowage_core::{UploadOutcome, UploadTask};

/// Progress of every file in the current batch, indexed by position.
///
/// Cloning shares the same state, so callers can watch a batch while the
/// orchestrator drives it.
#[derive(Clone, Default)]
pub struct ProgressTracker {
    tasks: Arc<Mutex<Vec<UploadTask>>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<UploadTask>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the tracked tasks with one pending task per name.
    pub fn start<'a>(&self, names: impl IntoIterator<Item = &'a str>) {
        *self.lock() = names.into_iter().map(UploadTask::new).collect();
    }

    /// Record progress for the task at `index`; returns the clamped value.
    pub fn set_progress(&self, index: usize, percent: f64) -> Option<f64> {
        let mut tasks = self.lock();
        let task = tasks.get_mut(index)?;
        task.set_progress(percent);
        Some(task.progress)
    }

    pub fn set_outcome(&self, index: usize, outcome: UploadOutcome) {
        if let Some(task) = self.lock().get_mut(index) {
            task.outcome = outcome;
        }
    }

    pub fn snapshot(&self) -> Vec<UploadTask> {
        self.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}
