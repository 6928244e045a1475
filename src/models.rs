//! Core data models used throughout Corpus Mill.
//!
//! These types represent the normalized records that flow through the
//! extraction, validation, and merge pipeline, and the closed set of
//! source formats the extractors understand.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Source format tag. Closed set; fixed by the extractor that produced
/// the record and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileType {
    Pptx,
    Pdf,
    Md,
}

impl FileType {
    /// Maps a file extension (case-insensitive, no dot) to a format tag.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pptx" => Some(FileType::Pptx),
            "pdf" => Some(FileType::Pdf),
            "md" | "markdown" => Some(FileType::Md),
            _ => None,
        }
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileType::Pptx => write!(f, "PPTX"),
            FileType::Pdf => write!(f, "PDF"),
            FileType::Md => write!(f, "MD"),
        }
    }
}

/// Normalized output record for one source document.
///
/// Created by exactly one extractor call over exactly one input file and
/// mutated only during that call. Wire shape is camelCase JSON with a
/// second-precision UTC timestamp (see [`timestamp`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRecord {
    pub id: String,
    pub title: String,
    pub content: String,
    pub source_path: String,
    pub file_type: FileType,
    #[serde(with = "timestamp")]
    pub indexed_date: DateTime<Utc>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub audio_files: Vec<String>,
    #[serde(default)]
    pub video_files: Vec<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl NormalizedRecord {
    /// Creates a record for `source_path` with a fresh v4 UUID, the file
    /// stem as the initial title, and the current UTC time truncated to
    /// second precision so serialization round-trips exactly.
    pub fn new(source_path: &Path, file_type: FileType) -> Self {
        let title = source_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            content: String::new(),
            source_path: source_path.to_string_lossy().to_string(),
            file_type,
            indexed_date: Utc::now().trunc_subsecs(0),
            images: Vec::new(),
            audio_files: Vec::new(),
            video_files: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// The file stem of the source path, used for asset naming and for
    /// the "title still equals the default" promotion rule.
    pub fn source_stem(&self) -> String {
        Path::new(&self.source_path)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// Overwrites `title` with a document-declared title, but only when
    /// no better title was set yet (i.e. `title` still equals the stem).
    pub fn promote_title(&mut self, document_title: &str) {
        let t = document_title.trim();
        if !t.is_empty() && self.title == self.source_stem() {
            self.title = t.to_string();
        }
    }

    /// Inserts a metadata entry when the value is non-blank; blank or
    /// missing values are omitted rather than stored as empty strings.
    pub fn insert_metadata(&mut self, key: &str, value: &str) {
        let v = value.trim();
        if !v.is_empty() {
            self.metadata.insert(key.to_string(), v.to_string());
        }
    }
}

/// Second-precision UTC timestamp codec (`yyyy-MM-ddTHH:mm:ssZ`).
///
/// The corpus file is hand-editable; a fixed literal-`Z` format keeps it
/// stable across runs and readable in diffs.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if let Ok(naive) = NaiveDateTime::parse_from_str(&s, FORMAT) {
            return Ok(naive.and_utc());
        }
        // Tolerate full RFC 3339 (offset or fractional seconds) from
        // hand-edited corpora.
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
