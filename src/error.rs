//! Error types for the proforma batch generation system.

use std::path::PathBuf;
use thiserror::Error;

/// Source-store errors. `Unavailable` is fatal for a run; the rest are
/// surfaced per record.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record store unavailable: {0}")]
    Unavailable(String),

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("Record {identifier} is not a readable proposal document: {reason}")]
    RecordUnreadable { identifier: String, reason: String },

    #[error("Store I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Run-level errors. Per-record failures never take this form — they are
/// converted into per-record summary entries inside the batch loop.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Instruction template unreadable at {path}: {reason}")]
    InstructionsUnreadable { path: PathBuf, reason: String },

    #[error("Failed to write run summary to {path}: {reason}")]
    SummaryWriteFailed { path: PathBuf, reason: String },

    #[error("Run completed with {failed} failed record(s) out of {processed}")]
    CompletedWithFailures { failed: usize, processed: usize },
}

impl From<config::ConfigError> for RunError {
    fn from(err: config::ConfigError) -> Self {
        RunError::ConfigError(err.to_string())
    }
}

/// Terminal reason attached to a failed per-record result.
///
/// This mirrors the per-record slice of the run taxonomy: a record fails
/// either because the backend rejected it, because every ladder rung was
/// exhausted, because a nominally successful response failed structural
/// validation, or because the artifact could not be written.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "detail")]
pub enum RecordFailure {
    Rejected(String),
    LadderExhausted(String),
    InvalidOutputShape(String),
    ArtifactWriteFailure(String),
    SourceUnreadable(String),
}

impl std::fmt::Display for RecordFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordFailure::Rejected(reason) => write!(f, "rejected: {}", reason),
            RecordFailure::LadderExhausted(reason) => {
                write!(f, "ceiling ladder exhausted: {}", reason)
            }
            RecordFailure::InvalidOutputShape(reason) => {
                write!(f, "invalid output shape: {}", reason)
            }
            RecordFailure::ArtifactWriteFailure(reason) => {
                write!(f, "artifact write failed: {}", reason)
            }
            RecordFailure::SourceUnreadable(reason) => {
                write!(f, "source record unreadable: {}", reason)
            }
        }
    }
}
