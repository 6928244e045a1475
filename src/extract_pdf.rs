//! PDF extraction.
//!
//! Text comes from `pdf-extract`'s content-stream strategy, page by
//! page. Image XObjects and the document information dictionary are
//! read through `lopdf`, which exposes the object graph directly.
//! Image streams are written raw (no re-encode, fixed `.png`
//! extension); a bad image never aborts the document.

use std::path::Path;

use lopdf::{Dictionary, Document, Object};
use tracing::warn;

use crate::assets::{self, AssetCounters, AssetKind};
use crate::extractor::{ExtractError, Extractor};
use crate::models::{FileType, NormalizedRecord};

pub struct PdfExtractor;

impl Extractor for PdfExtractor {
    fn file_type(&self) -> FileType {
        FileType::Pdf
    }

    fn extensions(&self) -> &[&str] {
        &["pdf"]
    }

    fn extract(&self, path: &Path, media_dir: &Path) -> Result<NormalizedRecord, ExtractError> {
        let bytes = std::fs::read(path)?;
        let doc = Document::load_mem(&bytes).map_err(|e| ExtractError::Pdf {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut record = NormalizedRecord::new(path, FileType::Pdf);

        // Reading-order text per page; whitespace-only pages are skipped
        // and the rest joined by a blank line.
        let pages_text =
            pdf_extract::extract_text_from_mem_by_pages(&bytes).map_err(|e| ExtractError::Pdf {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        record.content = pages_text
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");

        extract_page_images(&doc, &record.source_stem(), media_dir, &mut record);
        apply_info_dictionary(&doc, &mut record);
        record.insert_metadata("PageCount", &doc.get_pages().len().to_string());

        Ok(record)
    }
}

/// Walks each page's XObject resources in page order and writes every
/// Image-subtype stream via the asset writer. Raw stream bytes go out
/// as-is; per-image failures are logged and skipped.
fn extract_page_images(
    doc: &Document,
    base_name: &str,
    media_dir: &Path,
    record: &mut NormalizedRecord,
) {
    let mut counters = AssetCounters::new();
    for (page_num, page_id) in doc.get_pages() {
        let resources = match page_resources(doc, page_id) {
            Some(r) => r,
            None => continue,
        };
        let xobjects = match resources.get(b"XObject").ok().and_then(|o| as_dict(doc, o)) {
            Some(d) => d,
            None => continue,
        };
        for (name, obj) in xobjects.iter() {
            match image_stream_bytes(doc, obj) {
                Some(bytes) if !bytes.is_empty() => {
                    let counter = counters.next(AssetKind::Image);
                    match assets::write_asset(
                        &bytes,
                        "image/png",
                        base_name,
                        AssetKind::Image,
                        counter,
                        media_dir,
                    ) {
                        Ok(path) => record.images.push(path.to_string_lossy().to_string()),
                        Err(e) => warn!(
                            page = page_num,
                            name = %String::from_utf8_lossy(name),
                            error = %e,
                            "failed to write page image"
                        ),
                    }
                }
                _ => {}
            }
        }
    }
}

fn page_resources(doc: &Document, page_id: (u32, u16)) -> Option<&Dictionary> {
    let page = doc.get_dictionary(page_id).ok()?;
    let resources = page.get(b"Resources").ok()?;
    as_dict(doc, resources)
}

/// Follows one level of indirection to a dictionary.
fn as_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    match obj {
        Object::Dictionary(d) => Some(d),
        Object::Reference(id) => match doc.get_object(*id).ok()? {
            Object::Dictionary(d) => Some(d),
            _ => None,
        },
        _ => None,
    }
}

/// Raw content bytes of `obj` when it is a stream whose declared
/// subtype is `Image`; `None` for forms and anything malformed.
fn image_stream_bytes(doc: &Document, obj: &Object) -> Option<Vec<u8>> {
    let resolved = match obj {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        other => other,
    };
    let stream = match resolved {
        Object::Stream(s) => s,
        _ => return None,
    };
    match stream.dict.get(b"Subtype") {
        Ok(Object::Name(n)) if n.as_slice() == b"Image" => Some(stream.content.clone()),
        _ => None,
    }
}

/// Copies the document information dictionary into record metadata and
/// promotes the title when the record still carries the stem default.
fn apply_info_dictionary(doc: &Document, record: &mut NormalizedRecord) {
    let info = match doc.trailer.get(b"Info").ok().and_then(|o| as_dict(doc, o)) {
        Some(d) => d,
        None => return,
    };
    if let Some(author) = info_string(info, b"Author") {
        record.insert_metadata("Author", &author);
    }
    if let Some(title) = info_string(info, b"Title") {
        record.insert_metadata("DocumentTitle", &title);
        record.promote_title(&title);
    }
    if let Some(subject) = info_string(info, b"Subject") {
        record.insert_metadata("Subject", &subject);
    }
    if let Some(keywords) = info_string(info, b"Keywords") {
        record.insert_metadata("Keywords", &keywords);
    }
    if let Some(creator) = info_string(info, b"Creator") {
        record.insert_metadata("Creator", &creator);
    }
    if let Some(producer) = info_string(info, b"Producer") {
        record.insert_metadata("Producer", &producer);
    }
}

fn info_string(info: &Dictionary, key: &[u8]) -> Option<String> {
    match info.get(key) {
        Ok(Object::String(bytes, _)) => {
            let s = decode_pdf_string(bytes);
            let s = s.trim();
            if s.is_empty() {
                None
            } else {
                Some(s.to_string())
            }
        }
        _ => None,
    }
}

/// PDF text strings are either UTF-16BE with a BOM or PDFDocEncoding,
/// which is close enough to Latin-1 for info-dictionary fields.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.starts_with(&[0xFE, 0xFF]) {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&utf16)
    } else {
        bytes.iter().map(|&b| b as char).collect()
    }
}
