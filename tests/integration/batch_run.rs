//! End-to-end batch runs over a real filesystem store with a scripted backend.

use async_trait::async_trait;
use proforma::orchestrator::{NullReporter, Orchestrator, RunOptions};
use proforma::provider::{GenerationBackend, GenerationOutcome, GenerationRequest};
use proforma::record::FsRecordStore;
use proforma::selector::{select_records, SelectionMode};
use proforma::summary::{RecordStatus, RunSummary, SUMMARY_FILENAME};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;

const HTML: &str = "<!DOCTYPE html><html><body>rendered</body></html>";

/// Backend that answers per record identifier, extracted from the serialized
/// record text.
struct PerRecordBackend {
    outcomes: Mutex<HashMap<String, Vec<GenerationOutcome>>>,
}

impl PerRecordBackend {
    fn new(entries: Vec<(&str, Vec<GenerationOutcome>)>) -> Self {
        let outcomes = entries
            .into_iter()
            .map(|(id, v)| (id.to_string(), v))
            .collect();
        Self {
            outcomes: Mutex::new(outcomes),
        }
    }
}

#[async_trait]
impl GenerationBackend for PerRecordBackend {
    async fn generate(&self, request: &GenerationRequest) -> GenerationOutcome {
        let mut outcomes = self.outcomes.lock().unwrap();
        for (id, queue) in outcomes.iter_mut() {
            if request.record_text.contains(&format!("\"{}\"", id)) && !queue.is_empty() {
                return queue.remove(0);
            }
        }
        GenerationOutcome::Success(HTML.to_string())
    }

    fn backend_name(&self) -> &str {
        "per-record"
    }

    fn model_name(&self) -> &str {
        "test-model"
    }
}

fn write_record(dir: &Path, id: &str, org: &str) {
    std::fs::write(
        dir.join(format!("{id}.json")),
        format!(r#"{{"identifier": "{id}", "organization_name": "{org}", "body": "proposal text"}}"#),
    )
    .unwrap();
}

fn run_options(output_dir: &Path) -> RunOptions {
    RunOptions {
        ceiling_ladder: vec![65000, 32000, 16000],
        attempt_timeout: Duration::from_secs(30),
        output_dir: output_dir.to_path_buf(),
        publish_base_url: None,
        delete_inputs_after_success: false,
    }
}

async fn run_batch(
    backend: &dyn GenerationBackend,
    input_dir: &Path,
    options: RunOptions,
) -> (RunSummary, FsRecordStore) {
    let store = FsRecordStore::open(input_dir).unwrap();
    let identifiers = select_records(&store, &SelectionMode::All).unwrap();
    let orchestrator = Orchestrator::new(backend, "render instructions".to_string(), options).unwrap();
    let summary = orchestrator
        .run(&store, &identifiers, "all", &NullReporter)
        .await;
    (summary, store)
}

#[tokio::test]
async fn test_full_run_writes_artifacts_and_summary() {
    let workspace = TempDir::new().unwrap();
    let input = workspace.path().join("proposals");
    let output = workspace.path().join("published");
    std::fs::create_dir_all(&input).unwrap();
    std::fs::create_dir_all(&output).unwrap();

    write_record(&input, "a", "Acme Corp, Ltd.");
    write_record(&input, "b", "Globex");

    let backend = PerRecordBackend::new(vec![]);
    let (summary, _store) = run_batch(&backend, &input, run_options(&output)).await;

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.succeeded, 2);
    assert!(!summary.has_failures());

    // Artifact names are derived from the organization name.
    assert!(output.join("acmecorpltd.html").is_file());
    assert!(output.join("globex.html").is_file());
    assert_eq!(
        std::fs::read_to_string(output.join("globex.html")).unwrap(),
        HTML
    );

    let summary_path = summary.write(&output).unwrap();
    assert_eq!(summary_path, output.join(SUMMARY_FILENAME));
    let parsed: RunSummary =
        serde_json::from_str(&std::fs::read_to_string(&summary_path).unwrap()).unwrap();
    assert_eq!(parsed.succeeded, 2);
}

#[tokio::test]
async fn test_failed_record_does_not_block_the_rest() {
    let workspace = TempDir::new().unwrap();
    let input = workspace.path().join("proposals");
    let output = workspace.path().join("published");
    std::fs::create_dir_all(&input).unwrap();
    std::fs::create_dir_all(&output).unwrap();

    write_record(&input, "bad", "Bad Actor");
    write_record(&input, "good", "Good Co");

    let backend = PerRecordBackend::new(vec![(
        "bad",
        vec![GenerationOutcome::Rejected("policy".to_string())],
    )]);
    let (summary, _store) = run_batch(&backend, &input, run_options(&output)).await;

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.succeeded, 1);
    assert!(summary.has_failures());

    assert!(!output.join("badactor.html").exists());
    assert!(output.join("goodco.html").is_file());

    let bad = summary
        .results
        .iter()
        .find(|r| r.identifier == "bad")
        .unwrap();
    assert_eq!(bad.status, RecordStatus::Failed);
    assert_eq!(bad.attempts, 1);
}

#[tokio::test]
async fn test_ladder_descent_recovers_oversize_record() {
    let workspace = TempDir::new().unwrap();
    let input = workspace.path().join("proposals");
    let output = workspace.path().join("published");
    std::fs::create_dir_all(&input).unwrap();
    std::fs::create_dir_all(&output).unwrap();

    write_record(&input, "big", "Big Deal Inc");

    let backend = PerRecordBackend::new(vec![(
        "big",
        vec![
            GenerationOutcome::RetryableFailure("request too large".to_string()),
            GenerationOutcome::RetryableFailure("request too large".to_string()),
            GenerationOutcome::Success(HTML.to_string()),
        ],
    )]);
    let (summary, _store) = run_batch(&backend, &input, run_options(&output)).await;

    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.results[0].attempts, 3);
    assert!(output.join("bigdealinc.html").is_file());
}

#[tokio::test]
async fn test_delete_inputs_after_success_removes_only_succeeded_sources() {
    let workspace = TempDir::new().unwrap();
    let input = workspace.path().join("proposals");
    let output = workspace.path().join("published");
    std::fs::create_dir_all(&input).unwrap();
    std::fs::create_dir_all(&output).unwrap();

    write_record(&input, "keep", "Kept Org");
    write_record(&input, "gone", "Gone Org");

    let backend = PerRecordBackend::new(vec![(
        "keep",
        vec![GenerationOutcome::Rejected("policy".to_string())],
    )]);
    let mut options = run_options(&output);
    options.delete_inputs_after_success = true;

    let input_clone = input.clone();
    let store = FsRecordStore::open(&input_clone).unwrap();
    let identifiers = select_records(&store, &SelectionMode::All).unwrap();
    let orchestrator =
        Orchestrator::new(&backend, "render instructions".to_string(), options).unwrap();
    let summary = orchestrator
        .run(&store, &identifiers, "all", &NullReporter)
        .await;
    orchestrator.cleanup_sources(&store, &summary);

    // Failed record's source survives; the succeeded one is removed.
    assert!(input.join("keep.json").is_file());
    assert!(!input.join("gone.json").exists());
}

#[tokio::test]
async fn test_truncated_output_is_persisted_and_counted() {
    let workspace = TempDir::new().unwrap();
    let input = workspace.path().join("proposals");
    let output = workspace.path().join("published");
    std::fs::create_dir_all(&input).unwrap();
    std::fs::create_dir_all(&output).unwrap();

    write_record(&input, "long", "Long Winded LLC");

    let backend = PerRecordBackend::new(vec![(
        "long",
        vec![GenerationOutcome::TruncatedSuccess(HTML.to_string())],
    )]);
    let (summary, _store) = run_batch(&backend, &input, run_options(&output)).await;

    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.truncated, 1);
    assert!(summary.results[0].truncated);
    assert!(output.join("longwindedllc.html").is_file());
}

#[tokio::test]
async fn test_rerun_is_idempotent_for_artifact_names() {
    let workspace = TempDir::new().unwrap();
    let input = workspace.path().join("proposals");
    let output = workspace.path().join("published");
    std::fs::create_dir_all(&input).unwrap();
    std::fs::create_dir_all(&output).unwrap();

    write_record(&input, "a", "Café Lumière");

    let backend = PerRecordBackend::new(vec![]);
    let (first, _) = run_batch(&backend, &input, run_options(&output)).await;
    let (second, _) = run_batch(&backend, &input, run_options(&output)).await;

    assert_eq!(first.results[0].artifact, second.results[0].artifact);
    assert_eq!(
        first.results[0].artifact.as_ref().unwrap(),
        &output.join("cafelumiere.html")
    );
    // One artifact, overwritten in place.
    let html_files = std::fs::read_dir(&output)
        .unwrap()
        .filter(|e| {
            e.as_ref()
                .unwrap()
                .path()
                .extension()
                .map(|x| x == "html")
                .unwrap_or(false)
        })
        .count();
    assert_eq!(html_files, 1);
}
