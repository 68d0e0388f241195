//! Proposal records and the source store that provides them.
//!
//! A record is one unit of work: a JSON document on disk carrying an optional
//! organization name and a free-text body. Records are immutable once read;
//! the orchestrator never mutates them.

use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One proposal to transform. Immutable once read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalRecord {
    /// Stable name derived from the source filename (stem, no extension).
    /// Any identifier embedded in the document is ignored on read.
    #[serde(default)]
    pub identifier: String,

    /// Free-text label used to derive the output artifact name.
    #[serde(default, alias = "company_name")]
    pub organization_name: Option<String>,

    /// Proposal content (structured text or markdown) to be transformed.
    pub body: String,
}

/// Read access to the source store.
///
/// The core depends only on this seam: list identifiers in discovery order,
/// read one record, and locate a record's underlying path (used by the
/// changed-path selection mode and the opt-in source cleanup).
pub trait RecordStore {
    /// Identifiers in discovery order, no duplicates.
    fn list_identifiers(&self) -> Result<Vec<String>, StoreError>;

    fn read_record(&self, identifier: &str) -> Result<ProposalRecord, StoreError>;

    /// Source path backing an identifier, if the store is file-backed.
    fn source_path(&self, identifier: &str) -> Option<PathBuf>;
}

/// Filesystem-backed record store: one `.json` document per record, scanned
/// non-recursively from a single input directory in sorted filename order.
#[derive(Debug)]
pub struct FsRecordStore {
    input_dir: PathBuf,
    entries: BTreeMap<String, PathBuf>,
}

impl FsRecordStore {
    /// Scan the input directory. Fails with `StoreError::Unavailable` if the
    /// directory does not exist or cannot be read — there is nothing to run.
    pub fn open(input_dir: &Path) -> Result<Self, StoreError> {
        if !input_dir.is_dir() {
            return Err(StoreError::Unavailable(format!(
                "input directory does not exist: {}",
                input_dir.display()
            )));
        }

        let mut entries = BTreeMap::new();
        for entry in WalkDir::new(input_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| {
                StoreError::Unavailable(format!(
                    "failed to scan {}: {}",
                    input_dir.display(),
                    e
                ))
            })?;
            let path = entry.path();
            if !entry.file_type().is_file() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                tracing::warn!(path = %path.display(), "Skipping record with non-UTF-8 filename");
                continue;
            };
            entries.insert(stem.to_string(), path.to_path_buf());
        }

        Ok(Self {
            input_dir: input_dir.to_path_buf(),
            entries,
        })
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }
}

impl RecordStore for FsRecordStore {
    fn list_identifiers(&self) -> Result<Vec<String>, StoreError> {
        // BTreeMap iteration preserves the sorted discovery order.
        Ok(self.entries.keys().cloned().collect())
    }

    fn read_record(&self, identifier: &str) -> Result<ProposalRecord, StoreError> {
        let path = self
            .entries
            .get(identifier)
            .ok_or_else(|| StoreError::RecordNotFound(identifier.to_string()))?;

        let raw = std::fs::read_to_string(path).map_err(|e| StoreError::RecordUnreadable {
            identifier: identifier.to_string(),
            reason: e.to_string(),
        })?;

        let mut record: ProposalRecord =
            serde_json::from_str(&raw).map_err(|e| StoreError::RecordUnreadable {
                identifier: identifier.to_string(),
                reason: format!("invalid JSON: {}", e),
            })?;

        // The filename is authoritative for identity; a stale identifier
        // field inside the document is ignored.
        record.identifier = identifier.to_string();
        Ok(record)
    }

    fn source_path(&self, identifier: &str) -> Option<PathBuf> {
        self.entries.get(identifier).cloned()
    }
}
