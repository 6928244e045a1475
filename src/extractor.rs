//! Format dispatch for the extraction pipeline.
//!
//! The three extractors share no base type beyond the uniform
//! `(path, media_dir) -> NormalizedRecord` contract expressed by
//! [`Extractor`]. [`ExtractorRegistry`] selects a variant by file
//! extension; unknown extensions are a per-file error, never a batch
//! abort.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::models::{FileType, NormalizedRecord};

/// Extraction error (per-file; sibling files in a batch are unaffected).
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("input not found: {0}")]
    NotFound(PathBuf),
    #[error("no extractor for file: {0}")]
    Unsupported(PathBuf),
    #[error("PDF extraction failed for {path}: {reason}")]
    Pdf { path: PathBuf, reason: String },
    #[error("presentation package unreadable at {path}: {reason}")]
    Package { path: PathBuf, reason: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A component converting one source format into one [`NormalizedRecord`].
///
/// `media_dir` is where embedded assets land; extractors create it on
/// demand and leave it untouched when the format embeds no binaries.
pub trait Extractor: Send + Sync {
    /// Format tag stamped on every record this extractor produces.
    fn file_type(&self) -> FileType;

    /// Extensions (lowercase, no dot) this extractor claims.
    fn extensions(&self) -> &[&str];

    fn extract(&self, path: &Path, media_dir: &Path) -> Result<NormalizedRecord, ExtractError>;
}

/// Registry of available extractors, consulted in registration order.
pub struct ExtractorRegistry {
    extractors: Vec<Box<dyn Extractor>>,
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractorRegistry {
    /// Registry with the three built-in extractors.
    pub fn new() -> Self {
        Self {
            extractors: vec![
                Box::new(crate::extract_pptx::SlideDeckExtractor),
                Box::new(crate::extract_pdf::PdfExtractor),
                Box::new(crate::extract_md::MarkdownExtractor),
            ],
        }
    }

    /// Finds the extractor claiming `extension`, case-insensitively.
    pub fn find(&self, extension: &str) -> Option<&dyn Extractor> {
        self.extractors
            .iter()
            .find(|e| {
                e.extensions()
                    .iter()
                    .any(|ext| ext.eq_ignore_ascii_case(extension))
            })
            .map(|e| e.as_ref())
    }

    /// Extracts one file, dispatching on its extension.
    pub fn extract_file(
        &self,
        path: &Path,
        media_dir: &Path,
    ) -> Result<NormalizedRecord, ExtractError> {
        if !path.exists() {
            return Err(ExtractError::NotFound(path.to_path_buf()));
        }
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ExtractError::Unsupported(path.to_path_buf()))?;
        let extractor = self
            .find(extension)
            .ok_or_else(|| ExtractError::Unsupported(path.to_path_buf()))?;
        extractor.extract(path, media_dir)
    }
}
