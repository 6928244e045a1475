//! Markdown extraction.
//!
//! Parses CommonMark plus tables/footnotes/strikethrough/tasklists with
//! `pulldown-cmark`. The title is the first heading; the content field
//! is a lossy, structure-flattened rendering (HTML render, tag strip,
//! entity decode, whitespace collapse) meant for search and context,
//! not reproduction. Relative image links are resolved against the
//! file's directory and recorded in document order; absolute URLs
//! (`https://...`, `data:`, `mailto:`) are left out of `images` and
//! `ImageCount`, which carry resolvable local paths only.

use std::path::{Component, Path, PathBuf};

use once_cell::sync::Lazy;
use pulldown_cmark::{html, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use regex::Regex;

use crate::extractor::{ExtractError, Extractor};
use crate::models::{FileType, NormalizedRecord};

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

pub struct MarkdownExtractor;

impl Extractor for MarkdownExtractor {
    fn file_type(&self) -> FileType {
        FileType::Md
    }

    fn extensions(&self) -> &[&str] {
        &["md", "markdown"]
    }

    fn extract(&self, path: &Path, media_dir: &Path) -> Result<NormalizedRecord, ExtractError> {
        let text = std::fs::read_to_string(path)?;
        std::fs::create_dir_all(media_dir)?;

        let mut record = NormalizedRecord::new(path, FileType::Md);
        let structure = scan_structure(&text, path);

        if let Some((_, first)) = structure.headings.first() {
            record.promote_title(first);
        }
        record.content = flatten_to_text(&text);
        record.images = structure.images;

        record.insert_metadata("HeadingCount", &structure.headings.len().to_string());
        for level in 1..=6u32 {
            let count = structure
                .headings
                .iter()
                .filter(|(l, _)| *l == level)
                .count();
            if count > 0 {
                record.insert_metadata(&format!("H{}Count", level), &count.to_string());
            }
        }
        record.insert_metadata("CodeBlockCount", &structure.code_blocks.to_string());
        record.insert_metadata("LinkCount", &structure.links.to_string());
        record.insert_metadata("ImageCount", &record.images.len().to_string());
        if !structure.headings.is_empty() {
            let toc: Vec<String> = structure
                .headings
                .iter()
                .map(|(level, text)| {
                    format!("{}- {}", "  ".repeat(*level as usize - 1), text)
                })
                .collect();
            record.insert_metadata("TableOfContents", &toc.join("\n"));
        }

        Ok(record)
    }
}

/// Headings, image targets, and counts gathered in one event walk.
struct Structure {
    /// `(level, inline text)` per heading, in document order.
    headings: Vec<(u32, String)>,
    /// Resolved image paths, in document order, no deduplication.
    images: Vec<String>,
    code_blocks: usize,
    links: usize,
}

fn scan_structure(text: &str, md_path: &Path) -> Structure {
    let base_dir = md_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_default();
    // Absolutize the base so resolved image paths are absolute even for
    // targets that do not exist on disk. A bare relative input like
    // `note.md` has an empty parent, which canonicalize rejects; anchor
    // it to the working directory instead.
    let base_dir = std::fs::canonicalize(&base_dir).unwrap_or_else(|_| {
        std::env::current_dir()
            .map(|cwd| normalize_path(&cwd.join(&base_dir)))
            .unwrap_or(base_dir)
    });

    let mut structure = Structure {
        headings: Vec::new(),
        images: Vec::new(),
        code_blocks: 0,
        links: 0,
    };
    let mut heading: Option<(u32, String)> = None;

    for event in Parser::new_ext(text, extensions()) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                heading = Some((heading_level(level), String::new()));
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((level, text)) = heading.take() {
                    structure.headings.push((level, text.trim().to_string()));
                }
            }
            Event::Text(t) | Event::Code(t) => {
                if let Some((_, buf)) = heading.as_mut() {
                    buf.push_str(&t);
                }
            }
            Event::Start(Tag::Image { dest_url, .. }) => {
                if !is_absolute_url(&dest_url) {
                    let resolved = normalize_path(&base_dir.join(dest_url.as_ref()));
                    structure.images.push(resolved.to_string_lossy().to_string());
                }
            }
            Event::Start(Tag::Link { .. }) => structure.links += 1,
            Event::Start(Tag::CodeBlock(_)) => structure.code_blocks += 1,
            _ => {}
        }
    }
    structure
}

fn extensions() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
}

fn heading_level(level: HeadingLevel) -> u32 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn is_absolute_url(url: &str) -> bool {
    url.contains("://") || url.starts_with("data:") || url.starts_with("mailto:")
}

/// Lexical `.`/`..` normalization; no filesystem access, so targets
/// that do not exist still resolve.
fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other),
        }
    }
    out
}

/// Renders the whole document to HTML, then flattens it: strip tags to
/// spaces, decode the five common entities, collapse whitespace runs.
fn flatten_to_text(markdown: &str) -> String {
    let mut html_out = String::new();
    html::push_html(&mut html_out, Parser::new_ext(markdown, extensions()));

    let stripped = HTML_TAG.replace_all(&html_out, " ");
    let decoded = stripped
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
        .replace("&quot;", "\"");

    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}
