//! CLI presentation: terminal formatting for run progress, plans, and reports.

use crate::error::RecordFailure;
use crate::init::{InitPreview, InitResult};
use crate::orchestrator::ProgressReporter;
use crate::summary::{RecordReport, RecordStatus, RunSummary};
use serde_json::json;

/// Prints per-record progress to stdout as it happens.
pub struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn record_started(&self, index: usize, total: usize, identifier: &str) {
        println!("[{}/{}] {} ...", index + 1, total, identifier);
    }

    fn ladder_descended(&self, identifier: &str, next_ceiling: u32, reason: &str) {
        println!(
            "         {} retrying at ceiling {} ({})",
            identifier, next_ceiling, reason
        );
    }

    fn record_finished(&self, report: &RecordReport) {
        match report.status {
            RecordStatus::Succeeded => {
                let artifact = report
                    .artifact
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                let marker = if report.truncated { " (truncated)" } else { "" };
                println!("         {} -> {}{}", report.identifier, artifact, marker);
                if let Some(url) = &report.published_url {
                    println!("         {}", url);
                }
            }
            RecordStatus::Failed => {
                let reason = report
                    .error
                    .as_ref()
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "unknown failure".to_string());
                println!("         {} FAILED: {}", report.identifier, reason);
            }
        }
    }
}

/// Final tally after a run, with failed records re-listed.
pub fn format_run_tally(summary: &RunSummary) -> String {
    let mut lines = vec![format!(
        "Processed {} record(s) in {:.1}s: {} succeeded ({} truncated), {} failed.",
        summary.processed,
        summary.duration_ms as f64 / 1000.0,
        summary.succeeded,
        summary.truncated,
        summary.failed,
    )];

    if summary.failed > 0 {
        lines.push("Failed records:".to_string());
        for report in summary.results.iter().filter(|r| r.status == RecordStatus::Failed) {
            let reason = report
                .error
                .as_ref()
                .map(failure_label)
                .unwrap_or_else(|| "unknown failure".to_string());
            lines.push(format!("  {}: {}", report.identifier, reason));
        }
    }

    lines.join("\n")
}

fn failure_label(failure: &RecordFailure) -> String {
    failure.to_string()
}

pub fn format_plan_text(mode: &str, identifiers: &[String]) -> String {
    if identifiers.is_empty() {
        return format!("Selection mode '{}': nothing to do.", mode);
    }
    let mut lines = vec![format!(
        "Selection mode '{}': {} record(s) would be processed:",
        mode,
        identifiers.len()
    )];
    for id in identifiers {
        lines.push(format!("  {}", id));
    }
    lines.join("\n")
}

pub fn format_plan_json(mode: &str, identifiers: &[String]) -> String {
    serde_json::to_string_pretty(&json!({
        "selection_mode": mode,
        "count": identifiers.len(),
        "records": identifiers,
    }))
    .unwrap_or_else(|_| "{}".to_string())
}

pub fn format_validate_result(problems: &[String]) -> String {
    if problems.is_empty() {
        return "Configuration and workspace are valid.".to_string();
    }
    let mut lines = vec![format!("Found {} problem(s):", problems.len())];
    for problem in problems {
        lines.push(format!("  {}", problem));
    }
    lines.join("\n")
}

pub fn format_init_result(result: &InitResult) -> String {
    let mut lines = Vec::new();
    for path in &result.created {
        lines.push(format!("created  {}", path));
    }
    for path in &result.skipped {
        lines.push(format!("skipped  {} (exists)", path));
    }
    for error in &result.errors {
        lines.push(format!("error    {}", error));
    }
    if lines.is_empty() {
        lines.push("Nothing to initialize.".to_string());
    }
    lines.join("\n")
}

pub fn format_init_preview(preview: &InitPreview) -> String {
    if preview.pending.is_empty() {
        return "Workspace already initialized; nothing would be created.".to_string();
    }
    let mut lines = vec!["Would create:".to_string()];
    for path in &preview.pending {
        lines.push(format!("  {}", path));
    }
    lines.join("\n")
}
