//! Result of running one pipeline stage.

use stowage_core::{AppError, LogLevel};

/// What a stage did with the artifact it was given.
///
/// Every variant carries the artifact the next stage should continue with, so
/// a stage never aborts the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome<T> {
    /// The stage changed the artifact.
    Applied(T),
    /// The stage had nothing to do; the artifact is unchanged.
    Skipped(T),
    /// The stage failed; `fallback` is its unchanged input.
    Failed { fallback: T, reason: String },
}

/// [`StageOutcome`] without the payload, for reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageStatus {
    Applied,
    Skipped,
    Failed(String),
}

impl<T> StageOutcome<T> {
    pub fn into_inner(self) -> T {
        match self {
            StageOutcome::Applied(t) | StageOutcome::Skipped(t) => t,
            StageOutcome::Failed { fallback, .. } => fallback,
        }
    }

    pub fn inner(&self) -> &T {
        match self {
            StageOutcome::Applied(t) | StageOutcome::Skipped(t) => t,
            StageOutcome::Failed { fallback, .. } => fallback,
        }
    }

    pub fn status(&self) -> StageStatus {
        match self {
            StageOutcome::Applied(_) => StageStatus::Applied,
            StageOutcome::Skipped(_) => StageStatus::Skipped,
            StageOutcome::Failed { reason, .. } => StageStatus::Failed(reason.clone()),
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, StageOutcome::Applied(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, StageOutcome::Skipped(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, StageOutcome::Failed { .. })
    }

    /// Turn a recoverable error into `Failed`, logging it at the error's level.
    pub(crate) fn recovered(stage: &str, file_name: &str, fallback: T, error: AppError) -> Self {
        match error.log_level() {
            LogLevel::Debug => {
                tracing::debug!(stage = %stage, file_name = %file_name, error = %error, "Stage skipped after error")
            }
            LogLevel::Warn => {
                tracing::warn!(stage = %stage, file_name = %file_name, error = %error, "Stage failed, keeping input")
            }
            LogLevel::Error => {
                tracing::error!(stage = %stage, file_name = %file_name, error = %error, "Stage failed, keeping input")
            }
        }
        StageOutcome::Failed {
            fallback,
            reason: error.to_string(),
        }
    }
}
