//! Artifact naming: a pure function from record to output filename.
//!
//! Re-running on the same record must always yield the same name, so that
//! artifact placement is idempotent and the missing-output selection mode can
//! predict where a record's artifact would land.

use crate::record::ProposalRecord;
use unicode_normalization::UnicodeNormalization;

/// Extension applied to every generated artifact.
pub const ARTIFACT_EXTENSION: &str = "html";

/// Derive the artifact filename for a record.
///
/// Prefers the organization name: NFKD-folded, lowercased, with every
/// non-ASCII-alphanumeric character stripped. Falls back to the record
/// identifier (similarly sanitized) when the organization name is absent or
/// sanitizes to nothing.
pub fn artifact_name(record: &ProposalRecord) -> String {
    let from_org = record
        .organization_name
        .as_deref()
        .map(sanitize)
        .filter(|s| !s.is_empty());

    let stem = match from_org {
        Some(stem) => stem,
        None => {
            let fallback = sanitize(&record.identifier);
            if fallback.is_empty() {
                "record".to_string()
            } else {
                fallback
            }
        }
    };

    format!("{}.{}", stem, ARTIFACT_EXTENSION)
}

/// Lowercase and keep only ASCII alphanumerics. NFKD first so accented
/// letters contribute their base character instead of vanishing.
fn sanitize(label: &str) -> String {
    label
        .nfkd()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
