//! Slide-deck (PPTX) extraction.
//!
//! A PPTX file is a ZIP of XML parts. Text lives in `<a:t>` runs inside
//! `ppt/slides/slideN.xml`; embedded media hangs off each slide's
//! relationship part; document metadata lives in `docProps/core.xml`.
//! All XML is walked with streamed `quick-xml` events and bounded entry
//! reads so a hostile package cannot balloon memory.

use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::Path;

use quick_xml::events::Event;
use tracing::warn;

use crate::assets::{self, AssetCounters, AssetKind};
use crate::extractor::{ExtractError, Extractor};
use crate::models::{FileType, NormalizedRecord};

/// Maximum decompressed bytes read from a single ZIP entry (zip-bomb
/// protection).
const MAX_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

pub struct SlideDeckExtractor;

impl Extractor for SlideDeckExtractor {
    fn file_type(&self) -> FileType {
        FileType::Pptx
    }

    fn extensions(&self) -> &[&str] {
        &["pptx"]
    }

    fn extract(&self, path: &Path, media_dir: &Path) -> Result<NormalizedRecord, ExtractError> {
        let bytes = std::fs::read(path)?;
        let mut archive =
            zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| ExtractError::Package {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let mut record = NormalizedRecord::new(path, FileType::Pptx);
        let base_name = record.source_stem();
        let mut counters = AssetCounters::new();

        let content_types = read_content_types(&mut archive);
        let slide_names = list_slide_names(&archive);

        // A deck with no slide collection still extracts successfully;
        // content is just empty.
        let mut slide_texts: Vec<String> = Vec::new();
        for name in &slide_names {
            match read_entry(&mut archive, name) {
                Ok(xml) => {
                    let text = slide_text(&xml).map_err(|reason| ExtractError::Package {
                        path: path.to_path_buf(),
                        reason,
                    })?;
                    if !text.trim().is_empty() {
                        slide_texts.push(text);
                    }
                }
                Err(reason) => {
                    return Err(ExtractError::Package {
                        path: path.to_path_buf(),
                        reason,
                    })
                }
            }

            extract_slide_media(
                &mut archive,
                name,
                &content_types,
                &base_name,
                &mut counters,
                media_dir,
                &mut record,
            );
        }
        record.content = slide_texts.join("\n\n");

        apply_core_properties(&mut archive, &mut record);
        record.insert_metadata("SlideCount", &slide_names.len().to_string());

        Ok(record)
    }
}

/// Slide part names in container-declared order (numeric, not lexical:
/// slide10 sorts after slide9).
fn list_slide_names(archive: &zip::ZipArchive<Cursor<Vec<u8>>>) -> Vec<String> {
    let mut names: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with("ppt/slides/slide") && n.ends_with(".xml"))
        .map(|s| s.to_string())
        .collect();
    names.sort_by_key(|name| {
        name.trim_start_matches("ppt/slides/slide")
            .trim_end_matches(".xml")
            .parse::<u32>()
            .unwrap_or(u32::MAX)
    });
    names
}

fn read_entry(
    archive: &mut zip::ZipArchive<Cursor<Vec<u8>>>,
    name: &str,
) -> Result<Vec<u8>, String> {
    read_entry_bounded(archive, name, MAX_ENTRY_BYTES)
}

/// Reads one entry, failing when its decompressed size exceeds `limit`.
/// The cap is inclusive: an entry of exactly `limit` bytes is fine.
fn read_entry_bounded(
    archive: &mut zip::ZipArchive<Cursor<Vec<u8>>>,
    name: &str,
    limit: u64,
) -> Result<Vec<u8>, String> {
    let entry = archive.by_name(name).map_err(|e| e.to_string())?;
    let mut out = Vec::new();
    entry
        .take(limit + 1)
        .read_to_end(&mut out)
        .map_err(|e| e.to_string())?;
    if out.len() as u64 > limit {
        return Err(format!("ZIP entry {} exceeds size limit", name));
    }
    Ok(out)
}

/// Concatenates non-empty `<a:t>` run text within one slide, joined by
/// single spaces, in document order.
fn slide_text(xml: &[u8]) -> Result<String, String> {
    let mut runs: Vec<String> = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut in_t = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_t = true;
                }
            }
            Ok(Event::Text(te)) if in_t => {
                let text = te.unescape().unwrap_or_default();
                if !text.trim().is_empty() {
                    runs.push(text.trim().to_string());
                }
            }
            Ok(Event::End(e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_t = false;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.to_string()),
            _ => {}
        }
        buf.clear();
    }
    Ok(runs.join(" "))
}

/// Part content types declared in `[Content_Types].xml`: extension
/// defaults plus per-part overrides.
struct ContentTypes {
    defaults: HashMap<String, String>,
    overrides: HashMap<String, String>,
}

impl ContentTypes {
    fn lookup(&self, part_name: &str) -> Option<&str> {
        if let Some(ct) = self.overrides.get(&format!("/{}", part_name)) {
            return Some(ct);
        }
        let ext = part_name.rsplit('.').next()?.to_ascii_lowercase();
        self.defaults.get(&ext).map(String::as_str)
    }
}

fn read_content_types(archive: &mut zip::ZipArchive<Cursor<Vec<u8>>>) -> ContentTypes {
    let mut types = ContentTypes {
        defaults: HashMap::new(),
        overrides: HashMap::new(),
    };
    let xml = match read_entry(archive, "[Content_Types].xml") {
        Ok(xml) => xml,
        Err(_) => return types,
    };
    let mut reader = quick_xml::Reader::from_reader(xml.as_slice());
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) => {
                let local = e.local_name();
                if local.as_ref() == b"Default" {
                    if let (Some(ext), Some(ct)) = (attr(&e, b"Extension"), attr(&e, b"ContentType"))
                    {
                        types.defaults.insert(ext.to_ascii_lowercase(), ct);
                    }
                } else if local.as_ref() == b"Override" {
                    if let (Some(part), Some(ct)) = (attr(&e, b"PartName"), attr(&e, b"ContentType"))
                    {
                        types.overrides.insert(part, ct);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }
    types
}

fn attr(e: &quick_xml::events::BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| a.unescape_value().ok())
        .map(|v| v.into_owned())
}

/// One entry from a slide's relationship part, in declared order.
struct SlideRel {
    rel_type: String,
    target: String,
    external: bool,
}

fn read_slide_rels(
    archive: &mut zip::ZipArchive<Cursor<Vec<u8>>>,
    slide_name: &str,
) -> Vec<SlideRel> {
    let file = slide_name.rsplit('/').next().unwrap_or(slide_name);
    let rels_name = format!("ppt/slides/_rels/{}.rels", file);
    let xml = match read_entry(archive, &rels_name) {
        Ok(xml) => xml,
        Err(_) => return Vec::new(),
    };
    let mut rels = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml.as_slice());
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == b"Relationship" {
                    if let (Some(rel_type), Some(target)) = (attr(&e, b"Type"), attr(&e, b"Target"))
                    {
                        let external = attr(&e, b"TargetMode").as_deref() == Some("External");
                        rels.push(SlideRel {
                            rel_type,
                            target,
                            external,
                        });
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }
    rels
}

/// Resolves a relationship target ("../media/image1.png") against the
/// slide part directory ("ppt/slides/") to a package part name.
fn resolve_target(target: &str) -> String {
    if let Some(abs) = target.strip_prefix('/') {
        return abs.to_string();
    }
    let mut parts: Vec<&str> = vec!["ppt", "slides"];
    for seg in target.split('/') {
        match seg {
            ".." => {
                parts.pop();
            }
            "." | "" => {}
            _ => parts.push(seg),
        }
    }
    parts.join("/")
}

/// Writes one slide's embedded images, then its audio and video parts,
/// appending asset paths in discovery order. Failures on individual
/// parts are logged and skipped; the record is still produced.
fn extract_slide_media(
    archive: &mut zip::ZipArchive<Cursor<Vec<u8>>>,
    slide_name: &str,
    content_types: &ContentTypes,
    base_name: &str,
    counters: &mut AssetCounters,
    media_dir: &Path,
    record: &mut NormalizedRecord,
) {
    let rels = read_slide_rels(archive, slide_name);
    for rel in rels.iter().filter(|r| !r.external) {
        let part = resolve_target(&rel.target);
        let content_type = content_types
            .lookup(&part)
            .unwrap_or("application/octet-stream")
            .to_string();

        let kind = if rel.rel_type.ends_with("/image") {
            AssetKind::Image
        } else if content_type.contains("audio") {
            AssetKind::Audio
        } else if content_type.contains("video") {
            AssetKind::Video
        } else {
            continue;
        };

        let bytes = match read_entry(archive, &part) {
            Ok(bytes) => bytes,
            Err(reason) => {
                warn!(part = %part, %reason, "skipping unreadable media part");
                continue;
            }
        };
        if bytes.is_empty() {
            continue;
        }

        let counter = counters.next(kind);
        match assets::write_asset(&bytes, &content_type, base_name, kind, counter, media_dir) {
            Ok(path) => {
                let path = path.to_string_lossy().to_string();
                match kind {
                    AssetKind::Image => record.images.push(path),
                    AssetKind::Audio => record.audio_files.push(path),
                    AssetKind::Video => record.video_files.push(path),
                }
            }
            Err(e) => warn!(part = %part, error = %e, "failed to write media part"),
        }
    }
}

/// Reads `docProps/core.xml` and fills Author, CreatedDate,
/// ModifiedDate, and DocumentTitle metadata; promotes the document
/// title when the record still carries the filename-stem default.
fn apply_core_properties(
    archive: &mut zip::ZipArchive<Cursor<Vec<u8>>>,
    record: &mut NormalizedRecord,
) {
    let xml = match read_entry(archive, "docProps/core.xml") {
        Ok(xml) => xml,
        Err(_) => return,
    };
    let mut reader = quick_xml::Reader::from_reader(xml.as_slice());
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut current: Option<&'static str> = None;
    let mut title = None;
    let mut creator = None;
    let mut created = None;
    let mut modified = None;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                current = match e.local_name().as_ref() {
                    b"title" => Some("title"),
                    b"creator" => Some("creator"),
                    b"created" => Some("created"),
                    b"modified" => Some("modified"),
                    _ => None,
                };
            }
            Ok(Event::Text(te)) => {
                if let Some(field) = current {
                    let value = te.unescape().unwrap_or_default().into_owned();
                    match field {
                        "title" => title = Some(value),
                        "creator" => creator = Some(value),
                        "created" => created = Some(value),
                        "modified" => modified = Some(value),
                        _ => {}
                    }
                }
            }
            Ok(Event::End(_)) => current = None,
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    if let Some(author) = creator {
        record.insert_metadata("Author", &author);
    }
    if let Some(ts) = created {
        record.insert_metadata("CreatedDate", &to_date_only(&ts));
    }
    if let Some(ts) = modified {
        record.insert_metadata("ModifiedDate", &to_date_only(&ts));
    }
    if let Some(doc_title) = title {
        if !doc_title.trim().is_empty() {
            record.insert_metadata("DocumentTitle", &doc_title);
            record.promote_title(&doc_title);
        }
    }
}

/// Formats an OOXML `dcterms` timestamp as `yyyy-MM-dd`; passes the raw
/// value through when it does not parse.
fn to_date_only(value: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| value.trim().to_string())
}
