//! Callbacks fired while a batch uploads.

/// Receives batch progress. Both methods default to doing nothing.
pub trait UploadEvents: Send + Sync {
    /// Transfer progress of one file, 0 to 100.
    fn on_progress(&self, _file_name: &str, _percent: f64) {}

    /// Every file in the batch uploaded successfully.
    fn on_batch_complete(&self) {}
}

pub struct NoOpEvents;

impl UploadEvents for NoOpEvents {}
