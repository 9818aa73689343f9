//! Data model shared by the upload pipeline and its front-ends.

pub mod file;
pub mod task;

pub use file::{PipelineArtifact, SourceFile};
pub use task::{UploadOutcome, UploadTask};
