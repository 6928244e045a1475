//! Batch extraction orchestration.
//!
//! Coordinates the full flow: directory walk → per-file extraction →
//! validation gate → corpus serialization. Extraction is synchronous
//! and one-document-at-a-time; each document owns its file handle,
//! counters, and record, and per-file failures never abort the batch.

use anyhow::{bail, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

use crate::config::Config;
use crate::extractor::ExtractorRegistry;
use crate::models::NormalizedRecord;
use crate::serializer;
use crate::validate;

/// Outcome of one batch extraction run.
#[derive(Debug, Default)]
pub struct ExtractReport {
    /// Files found and attempted, in processing order.
    pub candidates: usize,
    /// Records accepted into the corpus.
    pub extracted: usize,
    /// Per-file extraction failures (input order preserved).
    pub failed: Vec<(PathBuf, String)>,
    /// Records dropped by the validation gate, with the failing field.
    pub invalid: Vec<(PathBuf, String)>,
    /// Path of the corpus file, when one was written.
    pub corpus_path: Option<PathBuf>,
}

/// Extracts `input` (a single file or a directory tree) into
/// `out_root`, writing `{out_root}/{corpus_file}` and a media
/// subdirectory holding every extracted asset.
pub fn run_extract(
    config: &Config,
    input: &Path,
    out_root: &Path,
    limit: Option<usize>,
) -> Result<ExtractReport> {
    if !input.exists() {
        bail!("input does not exist: {}", input.display());
    }

    let mut files = candidate_files(config, input)?;
    if let Some(lim) = limit {
        files.truncate(lim);
    }

    let media_dir = out_root.join(&config.output.media_dir);
    let registry = ExtractorRegistry::new();

    let mut report = ExtractReport {
        candidates: files.len(),
        ..Default::default()
    };
    let mut corpus: Vec<NormalizedRecord> = Vec::new();

    for file in &files {
        match registry.extract_file(file, &media_dir) {
            Ok(record) => match validate::validate(&record) {
                Ok(()) => {
                    corpus.push(record);
                    report.extracted += 1;
                }
                Err(e) => {
                    warn!(file = %file.display(), %e, "record failed validation");
                    report.invalid.push((file.clone(), e.to_string()));
                }
            },
            Err(e) => {
                warn!(file = %file.display(), %e, "extraction failed");
                report.failed.push((file.clone(), e.to_string()));
            }
        }
    }

    if !corpus.is_empty() {
        let corpus_path = out_root.join(&config.output.corpus_file);
        serializer::store(&corpus_path, &corpus)?;
        report.corpus_path = Some(corpus_path);
    }

    print_report(input, &report);
    Ok(report)
}

/// Candidate files under `input`, include/exclude-filtered and sorted
/// for deterministic ordering. A single-file input bypasses the globs.
fn candidate_files(config: &Config, input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }

    let include_set = build_globset(&config.extraction.include_globs)?;
    let exclude_set = build_globset(&config.extraction.exclude_globs)?;

    let mut files = Vec::new();
    let walker = WalkDir::new(input).follow_links(config.extraction.follow_symlinks);
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let relative = path.strip_prefix(input).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();
        if exclude_set.is_match(&rel_str) {
            continue;
        }
        if !include_set.is_match(&rel_str) {
            continue;
        }
        files.push(path.to_path_buf());
    }

    // Sort for deterministic ordering
    files.sort();
    Ok(files)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

fn print_report(input: &Path, report: &ExtractReport) {
    println!("extract {}", input.display());
    println!("  candidates: {}", report.candidates);
    println!("  extracted:  {}", report.extracted);
    for (file, reason) in &report.failed {
        println!("  failed:     {} ({})", file.display(), reason);
    }
    for (file, reason) in &report.invalid {
        println!("  invalid:    {} ({})", file.display(), reason);
    }
    match &report.corpus_path {
        Some(path) => println!("  corpus:     {}", path.display()),
        None => println!("  corpus:     not written (no records)"),
    }
    println!("ok");
}
