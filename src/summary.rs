//! Run summary: the single observational record written at the end of a run.
//!
//! Pure serialization of in-memory results — nothing here recomputes or reads
//! back; the counts are derived once when the summary is assembled.

use crate::error::{RecordFailure, RunError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const SUMMARY_FILENAME: &str = "run-summary.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Succeeded,
    Failed,
}

/// Outcome of one record, in selector order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordReport {
    pub identifier: String,
    pub status: RecordStatus,

    /// Set when the accepted output hit its ceiling; surfaced, not retried.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,

    /// Generation attempts made (1 unless the ladder descended).
    pub attempts: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_bytes: Option<u64>,

    /// Display-only reference: `<publish_base_url>/<artifact name>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RecordFailure>,
}

impl RecordReport {
    pub fn failed(identifier: &str, attempts: u32, error: RecordFailure) -> Self {
        Self {
            identifier: identifier.to_string(),
            status: RecordStatus::Failed,
            truncated: false,
            attempts,
            artifact: None,
            artifact_bytes: None,
            published_url: None,
            error: Some(error),
        }
    }
}

/// Aggregate of a full batch run. Constructed once, written once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub timestamp: DateTime<Utc>,
    pub duration_ms: u64,
    pub selection_mode: String,
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub truncated: usize,
    pub results: Vec<RecordReport>,
}

impl RunSummary {
    pub fn new(
        timestamp: DateTime<Utc>,
        duration_ms: u64,
        selection_mode: &str,
        results: Vec<RecordReport>,
    ) -> Self {
        let succeeded = results
            .iter()
            .filter(|r| r.status == RecordStatus::Succeeded)
            .count();
        let truncated = results.iter().filter(|r| r.truncated).count();
        Self {
            timestamp,
            duration_ms,
            selection_mode: selection_mode.to_string(),
            processed: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            truncated,
            results,
        }
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    /// Serialize to `<output_dir>/run-summary.json`, overwriting any prior
    /// summary at that location.
    pub fn write(&self, output_dir: &Path) -> Result<PathBuf, RunError> {
        let path = output_dir.join(SUMMARY_FILENAME);
        let json = serde_json::to_string_pretty(self).map_err(|e| {
            RunError::SummaryWriteFailed {
                path: path.clone(),
                reason: e.to_string(),
            }
        })?;
        std::fs::write(&path, json).map_err(|e| RunError::SummaryWriteFailed {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        Ok(path)
    }
}
