//! Stowage Core Library
//!
//! This crate provides the data model, error types, configuration and media
//! helpers shared by all stowage components.

pub mod config;
pub mod constants;
pub mod error;
pub mod media;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::UploaderConfig;
pub use error::{AppError, AppResult, LogLevel};
pub use models::{PipelineArtifact, SourceFile, UploadOutcome, UploadTask};
pub use storage_types::StorageBackend;
