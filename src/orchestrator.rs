//! Generation orchestrator: processes selected records to completion.
//!
//! One record at a time, strictly sequential. Each record gets a fresh
//! request per attempt; on a retryable failure the orchestrator descends the
//! configured ceiling ladder and tries again, discarding any partial output.
//! Per-record failures are isolated — they become summary entries and never
//! abort the batch loop.

use crate::error::{RecordFailure, RunError};
use crate::naming::artifact_name;
use crate::provider::{GenerationBackend, GenerationOutcome, GenerationRequest};
use crate::record::{ProposalRecord, RecordStore};
use crate::summary::{RecordReport, RecordStatus, RunSummary};
use chrono::Utc;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Observation seam for per-record progress. Implementations must not fail;
/// reporting is best-effort and never affects outcomes.
pub trait ProgressReporter: Send + Sync {
    fn record_started(&self, _index: usize, _total: usize, _identifier: &str) {}
    fn ladder_descended(&self, _identifier: &str, _next_ceiling: u32, _reason: &str) {}
    fn record_finished(&self, _report: &RecordReport) {}
}

/// Reporter that observes nothing.
pub struct NullReporter;

impl ProgressReporter for NullReporter {}

/// Immutable per-run options handed to the orchestrator at construction.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Strictly descending, finite output-ceiling ladder.
    pub ceiling_ladder: Vec<u32>,
    /// Wall-clock bound on each individual generation attempt.
    pub attempt_timeout: Duration,
    pub output_dir: PathBuf,
    /// When set, successful records report `<base>/<artifact name>`.
    pub publish_base_url: Option<String>,
    /// Opt-in destructive cleanup: remove the source document after its
    /// artifact is written. Off by default; makes reruns non-idempotent.
    pub delete_inputs_after_success: bool,
}

/// Reject ladders the retry policy cannot operate on.
pub fn validate_ladder(ladder: &[u32]) -> Result<(), String> {
    if ladder.is_empty() {
        return Err("ceiling ladder must not be empty".to_string());
    }
    if ladder.iter().any(|&c| c == 0) {
        return Err("ceiling ladder rungs must be positive".to_string());
    }
    if ladder.windows(2).any(|w| w[1] >= w[0]) {
        return Err("ceiling ladder must be strictly descending".to_string());
    }
    Ok(())
}

pub struct Orchestrator<'a> {
    backend: &'a dyn GenerationBackend,
    instructions: String,
    options: RunOptions,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        backend: &'a dyn GenerationBackend,
        instructions: String,
        options: RunOptions,
    ) -> Result<Self, RunError> {
        validate_ladder(&options.ceiling_ladder).map_err(RunError::ConfigError)?;
        Ok(Self {
            backend,
            instructions,
            options,
        })
    }

    /// Process every selected record in order and assemble the run summary.
    /// The summary is returned even when records failed; the caller decides
    /// the process-level exit from `RunSummary::has_failures`.
    pub async fn run(
        &self,
        store: &dyn RecordStore,
        identifiers: &[String],
        selection_mode: &str,
        reporter: &dyn ProgressReporter,
    ) -> RunSummary {
        let timestamp = Utc::now();
        let started = Instant::now();
        let mut results = Vec::with_capacity(identifiers.len());

        for (index, identifier) in identifiers.iter().enumerate() {
            reporter.record_started(index, identifiers.len(), identifier);
            let report = self.process_record(store, identifier, reporter).await;
            match report.status {
                RecordStatus::Succeeded => info!(
                    identifier = %identifier,
                    attempts = report.attempts,
                    truncated = report.truncated,
                    "Record completed"
                ),
                RecordStatus::Failed => warn!(
                    identifier = %identifier,
                    attempts = report.attempts,
                    error = %report.error.as_ref().map(|e| e.to_string()).unwrap_or_default(),
                    "Record failed"
                ),
            }
            reporter.record_finished(&report);
            results.push(report);
        }

        RunSummary::new(
            timestamp,
            started.elapsed().as_millis() as u64,
            selection_mode,
            results,
        )
    }

    async fn process_record(
        &self,
        store: &dyn RecordStore,
        identifier: &str,
        reporter: &dyn ProgressReporter,
    ) -> RecordReport {
        let record = match store.read_record(identifier) {
            Ok(record) => record,
            Err(e) => {
                return RecordReport::failed(
                    identifier,
                    0,
                    RecordFailure::SourceUnreadable(e.to_string()),
                )
            }
        };

        let record_text = match serde_json::to_string_pretty(&record) {
            Ok(text) => text,
            Err(e) => {
                return RecordReport::failed(
                    identifier,
                    0,
                    RecordFailure::SourceUnreadable(format!("serialization failed: {}", e)),
                )
            }
        };

        let request = GenerationRequest {
            instructions: self.instructions.clone(),
            record_text,
            max_output_tokens: self.options.ceiling_ladder[0],
        };

        let mut attempts = 0u32;
        let mut last_retryable_reason = String::new();

        for (rung, &ceiling) in self.options.ceiling_ladder.iter().enumerate() {
            attempts += 1;
            let attempt = request.with_ceiling(ceiling);
            let outcome = match tokio::time::timeout(
                self.options.attempt_timeout,
                self.backend.generate(&attempt),
            )
            .await
            {
                Ok(outcome) => outcome,
                Err(_) => GenerationOutcome::RetryableFailure(format!(
                    "attempt timed out after {}s",
                    self.options.attempt_timeout.as_secs()
                )),
            };

            match outcome {
                GenerationOutcome::Success(text) => {
                    return self.accept(&record, attempts, &text, false)
                }
                GenerationOutcome::TruncatedSuccess(text) => {
                    // Surfaced, not retried: a larger ceiling is not on the
                    // ladder and blind re-raising is not guaranteed to finish.
                    return self.accept(&record, attempts, &text, true);
                }
                GenerationOutcome::Rejected(reason) => {
                    return RecordReport::failed(identifier, attempts, RecordFailure::Rejected(reason));
                }
                GenerationOutcome::RetryableFailure(reason) => {
                    if let Some(&next) = self.options.ceiling_ladder.get(rung + 1) {
                        warn!(
                            identifier = %identifier,
                            ceiling,
                            next_ceiling = next,
                            reason = %reason,
                            "Retryable failure; descending ceiling ladder"
                        );
                        reporter.ladder_descended(identifier, next, &reason);
                    }
                    last_retryable_reason = reason;
                }
            }
        }

        RecordReport::failed(
            identifier,
            attempts,
            RecordFailure::LadderExhausted(last_retryable_reason),
        )
    }

    /// Normalize, validate, and persist accepted text, then apply the opt-in
    /// source cleanup.
    fn accept(
        &self,
        record: &ProposalRecord,
        attempts: u32,
        text: &str,
        truncated: bool,
    ) -> RecordReport {
        let normalized = normalize_output(text);
        // Truncated output is accepted as-is and flagged; shape validation
        // would reject any document whose closing tags were cut off.
        if !truncated {
            if let Err(reason) = check_output_shape(normalized) {
                return RecordReport::failed(
                    &record.identifier,
                    attempts,
                    RecordFailure::InvalidOutputShape(reason),
                );
            }
        }

        let name = artifact_name(record);
        let path = self.options.output_dir.join(&name);
        if let Err(e) = std::fs::write(&path, normalized) {
            return RecordReport::failed(
                &record.identifier,
                attempts,
                RecordFailure::ArtifactWriteFailure(format!("{}: {}", path.display(), e)),
            );
        }

        let published_url = self
            .options
            .publish_base_url
            .as_deref()
            .map(|base| format!("{}/{}", base.trim_end_matches('/'), name));

        RecordReport {
            identifier: record.identifier.clone(),
            status: RecordStatus::Succeeded,
            truncated,
            attempts,
            artifact: Some(path),
            artifact_bytes: Some(normalized.len() as u64),
            published_url,
            error: None,
        }
    }

    /// Remove source documents for successfully generated records. Failures
    /// here downgrade to warnings; the artifacts are already on disk.
    pub fn cleanup_sources(&self, store: &dyn RecordStore, summary: &RunSummary) {
        if !self.options.delete_inputs_after_success {
            return;
        }
        for report in &summary.results {
            if report.status != RecordStatus::Succeeded {
                continue;
            }
            let Some(path) = store.source_path(&report.identifier) else {
                continue;
            };
            match std::fs::remove_file(&path) {
                Ok(()) => info!(identifier = %report.identifier, path = %path.display(), "Deleted source record"),
                Err(e) => warn!(
                    identifier = %report.identifier,
                    path = %path.display(),
                    error = %e,
                    "Failed to delete source record"
                ),
            }
        }
    }
}

/// Strip a wrapping markdown code fence (```html or bare ```), then trim.
pub fn normalize_output(text: &str) -> &str {
    let text = text.trim();
    let stripped = text
        .strip_prefix("```html")
        .or_else(|| text.strip_prefix("```"));
    match stripped {
        Some(inner) => {
            let inner = inner.trim_start();
            inner
                .strip_suffix("```")
                .map(|s| s.trim())
                .unwrap_or(inner)
        }
        None => text,
    }
}

/// Structural plausibility check for the target format.
fn check_output_shape(text: &str) -> Result<(), String> {
    if text.is_empty() {
        return Err("generated output is empty".to_string());
    }
    let lower = text.to_lowercase();
    if lower.starts_with("<!doctype") || lower.contains("<html") {
        Ok(())
    } else {
        Err("output lacks an <html> or <!doctype> marker".to_string())
    }
}
