//! Stowage Processing Library
//!
//! This crate provides the upload pipeline: camera-format normalization,
//! image optimization, optional local copies and the transfer to storage,
//! plus the orchestrator that drives a batch of files through it.

pub mod compression;
pub mod image;
pub mod stage;
pub mod upload;

pub use compression::{ImageCompressor, OutputFormat, QualityPolicy};
pub use self::image::{FfmpegDecoder, FormatNormalizer, ImageOptimizer, ImageProcessor, RawImageDecoder};
pub use stage::{StageOutcome, StageStatus};
pub use upload::{
    BatchReport, BatchSession, BatchState, DirectoryHandle, FileReport, FilesystemEnvironment,
    LocalDirectory, LocalPersistence, LocalSaveEffect, LocalSaveError, NoOpEvents,
    ProgressTracker, SaveEnvironment, TransferAgent, UploadEvents, UploadOrchestrator,
};
