//! Required-field record validation.
//!
//! Gates records before they enter a corpus during batch extraction.
//! A failing record is dropped from the output but the failure is
//! surfaced to the caller with the offending field named.

use thiserror::Error;

use crate::models::NormalizedRecord;

/// Validation failure naming the field that was empty.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("record is missing required field '{field}'")]
pub struct InvalidRecord {
    pub field: &'static str,
}

/// Ok iff `id`, `title`, and `content` are all non-empty after trimming.
/// Does not mutate the record.
pub fn validate(record: &NormalizedRecord) -> Result<(), InvalidRecord> {
    for (field, value) in [
        ("id", &record.id),
        ("title", &record.title),
        ("content", &record.content),
    ] {
        if value.trim().is_empty() {
            return Err(InvalidRecord { field });
        }
    }
    Ok(())
}
