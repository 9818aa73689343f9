//! Error types module
//!
//! This module provides the core error types shared by the stowage crates.
//! Configuration, image processing and conversion errors are unified under
//! the `AppError` enum. Storage errors live in `stowage-storage`.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like an undecodable file
    Warn,
    /// Error level - for unexpected failures
    Error,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("Media conversion error: {0}")]
    MediaConversion(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Size budget exceeded: {size} bytes exceeds ceiling of {ceiling} bytes")]
    SizeBudgetExceeded { size: u64, ceiling: u64 },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl AppError {
    /// Level at which a stage should log this error when it recovers from it.
    pub fn log_level(&self) -> LogLevel {
        match self {
            AppError::InvalidInput(_) => LogLevel::Debug,
            AppError::ImageProcessing(_)
            | AppError::MediaConversion(_)
            | AppError::SizeBudgetExceeded { .. } => LogLevel::Warn,
            AppError::Config(_)
            | AppError::Io(_)
            | AppError::Internal(_)
            | AppError::InternalWithSource { .. } => LogLevel::Error,
        }
    }
}

/// Result type for core operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_failures_are_warnings() {
        let err = AppError::ImageProcessing("bad header".to_string());
        assert_eq!(err.log_level(), LogLevel::Warn);

        let err = AppError::SizeBudgetExceeded {
            size: 20,
            ceiling: 10,
        };
        assert_eq!(err.log_level(), LogLevel::Warn);
        assert!(err.to_string().contains("20 bytes"));
    }

    #[test]
    fn test_io_error_conversion() {
        let err: AppError = io::Error::new(io::ErrorKind::NotFound, "missing").into();
        assert!(matches!(err, AppError::Io(_)));
        assert_eq!(err.log_level(), LogLevel::Error);
    }

    #[test]
    fn test_anyhow_conversion_keeps_message() {
        let err: AppError = anyhow::anyhow!("ffmpeg exited").into();
        match err {
            AppError::InternalWithSource { message, .. } => assert_eq!(message, "ffmpeg exited"),
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
