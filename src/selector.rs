//! Input selection: decide which records a run will process.
//!
//! Three membership policies over the record store. Selection always emits
//! identifiers in store discovery order with no duplicates; an empty
//! selection is a legitimate "nothing to do", not an error.

use crate::error::StoreError;
use crate::naming::artifact_name;
use crate::record::RecordStore;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Membership policy for one run.
#[derive(Debug, Clone)]
pub enum SelectionMode {
    /// Every record in the store.
    All,
    /// Records whose source path appears in an externally supplied
    /// changed-path list. Falls back to `All` when the intersection is empty.
    Changed { changed_paths: Vec<PathBuf> },
    /// Records with no artifact yet at the expected output location. A record
    /// whose expected location cannot be computed is treated as missing.
    MissingOutput { output_dir: PathBuf },
}

impl SelectionMode {
    pub fn name(&self) -> &'static str {
        match self {
            SelectionMode::All => "all",
            SelectionMode::Changed { .. } => "changed",
            SelectionMode::MissingOutput { .. } => "missing-output",
        }
    }
}

/// Produce the ordered set of identifiers to process.
///
/// Fails only when the store itself is unusable; per-record read problems in
/// `missing-output` mode degrade to inclusion so the orchestrator surfaces
/// the real error in the per-record result.
pub fn select_records(
    store: &dyn RecordStore,
    mode: &SelectionMode,
) -> Result<Vec<String>, StoreError> {
    let all = store.list_identifiers()?;

    let selected = match mode {
        SelectionMode::All => all,
        SelectionMode::Changed { changed_paths } => {
            let changed: HashSet<PathBuf> =
                changed_paths.iter().map(|p| normalize(p)).collect();
            let subset: Vec<String> = all
                .iter()
                .filter(|id| {
                    store
                        .source_path(id)
                        .map(|p| changed.contains(&normalize(&p)))
                        .unwrap_or(false)
                })
                .cloned()
                .collect();
            if subset.is_empty() {
                warn!(
                    total = all.len(),
                    "Changed-path selection matched no records; falling back to all records"
                );
                all
            } else {
                subset
            }
        }
        SelectionMode::MissingOutput { output_dir } => all
            .iter()
            .filter(|id| match store.read_record(id) {
                Ok(record) => {
                    let expected = output_dir.join(artifact_name(&record));
                    let exists = expected.exists();
                    if exists {
                        debug!(identifier = %id, artifact = %expected.display(), "Skipping record; artifact already present");
                    }
                    !exists
                }
                // Unreadable here means the expected location is not
                // computable; include the record and let the run report it.
                Err(e) => {
                    debug!(identifier = %id, error = %e, "Including record whose output location is not computable");
                    true
                }
            })
            .cloned()
            .collect(),
    };

    Ok(selected)
}

/// Canonicalize where possible so externally supplied paths (often
/// repo-relative) compare against store paths reliably.
fn normalize(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
