//! Canonical corpus JSON encode/decode.
//!
//! On disk a corpus is `{"value": [ <record>, ... ]}`, pretty-printed
//! for human inspection. The file doubles as a hand-editable artifact,
//! so decoding tolerates three shapes, tried in fixed order: a wrapped
//! non-empty `value` array, a bare top-level array, and a single bare
//! record object.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::NormalizedRecord;

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("corpus JSON matches none of the supported shapes: {0}")]
    Shape(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Serialize, Deserialize)]
struct WrappedCorpus {
    value: Vec<NormalizedRecord>,
}

/// Serializes records under the single `value` array key.
pub fn to_json(records: &[NormalizedRecord]) -> Result<String, CorpusError> {
    let wrapped = WrappedCorpus {
        value: records.to_vec(),
    };
    Ok(serde_json::to_string_pretty(&wrapped)?)
}

/// Decodes a corpus from any of the three tolerated shapes; first
/// success wins.
pub fn from_json(text: &str) -> Result<Vec<NormalizedRecord>, CorpusError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| CorpusError::Shape(e.to_string()))?;

    if let Some(array) = value.get("value").and_then(|v| v.as_array()) {
        if !array.is_empty() {
            let records = serde_json::from_value(serde_json::Value::Array(array.clone()))
                .map_err(|e| CorpusError::Shape(e.to_string()))?;
            return Ok(records);
        }
    }
    if value.is_array() {
        return serde_json::from_value(value).map_err(|e| CorpusError::Shape(e.to_string()));
    }
    if value.is_object() {
        if let Ok(record) = serde_json::from_value::<NormalizedRecord>(value) {
            return Ok(vec![record]);
        }
    }
    Err(CorpusError::Shape(
        "expected a {\"value\": [...]} object, a record array, or a single record".to_string(),
    ))
}

/// Reads and decodes a corpus file.
pub fn load(path: &std::path::Path) -> Result<Vec<NormalizedRecord>, CorpusError> {
    let text = std::fs::read_to_string(path)?;
    from_json(&text)
}

/// Encodes and writes a corpus file, creating parent directories.
pub fn store(path: &std::path::Path, records: &[NormalizedRecord]) -> Result<(), CorpusError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, to_json(records)?)?;
    Ok(())
}
