//! Batch upload pipeline.
//!
//! Each file runs normalize → optimize → (if transformed) local save →
//! transfer. The orchestrator runs one pipeline per file concurrently and
//! reports the batch as successful only when every transfer succeeded.

pub mod environment;
pub mod events;
pub mod orchestrator;
pub mod persistence;
pub mod pipeline;
pub mod tracker;
pub mod transfer;
pub mod types;

pub use environment::{
    DirectoryHandle, FilesystemEnvironment, LocalDirectory, LocalSaveError, SaveEnvironment,
};
pub use events::{NoOpEvents, UploadEvents};
pub use orchestrator::{BatchSession, UploadOrchestrator};
pub use persistence::LocalPersistence;
pub use pipeline::FilePipeline;
pub use tracker::ProgressTracker;
pub use transfer::TransferAgent;
pub use types::{BatchReport, BatchState, FileReport, LocalSaveEffect};
