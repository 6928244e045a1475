//! Best-effort corpus merge.
//!
//! Concatenates records from multiple serialized corpora in caller
//! order. One missing or corrupt input is reported and skipped, never
//! aborting the merge. No id-based deduplication: merge is a pure
//! concatenation and duplicate ids survive as-is.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::models::NormalizedRecord;
use crate::serializer::{self, CorpusError};

/// Outcome of one merge run.
#[derive(Debug, Default)]
pub struct MergeReport {
    /// Per-input record counts, in input order, for inputs that loaded.
    pub loaded: Vec<(PathBuf, usize)>,
    /// Per-input failures, in input order.
    pub failures: Vec<(PathBuf, String)>,
    /// Total records written, 0 when no output file was produced.
    pub total: usize,
}

/// Loads every input corpus, concatenates records in order, and writes
/// the combined corpus to `output` when at least one record loaded.
pub fn merge(inputs: &[PathBuf], output: &Path) -> Result<MergeReport, CorpusError> {
    let mut report = MergeReport::default();
    let mut merged: Vec<NormalizedRecord> = Vec::new();

    for input in inputs {
        match serializer::load(input) {
            Ok(records) => {
                report.loaded.push((input.clone(), records.len()));
                merged.extend(records);
            }
            Err(e) => {
                warn!(input = %input.display(), error = %e, "skipping merge input");
                report.failures.push((input.clone(), e.to_string()));
            }
        }
    }

    if merged.is_empty() {
        return Ok(report);
    }

    serializer::store(output, &merged)?;
    report.total = merged.len();
    Ok(report)
}
