//! End-to-end pipeline tests over hand-built fixture documents.
//!
//! Fixtures are constructed in-test: PPTX as a ZIP of XML parts, PDF
//! as a byte-exact body with a correct xref table, Markdown as plain
//! text. No binary fixtures are checked in.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use corpus_mill::config::Config;
use corpus_mill::extractor::{Extractor, ExtractorRegistry};
use corpus_mill::extract_pdf::PdfExtractor;
use corpus_mill::extract_pptx::SlideDeckExtractor;
use corpus_mill::models::FileType;
use corpus_mill::{merge, pipeline, serializer, validate};
use tempfile::TempDir;

fn slide_xml(texts: &[&str]) -> String {
    let runs: String = texts
        .iter()
        .map(|t| format!("<a:r><a:t>{}</a:t></a:r>", t))
        .collect();
    format!(
        "<?xml version=\"1.0\"?><p:sld \
         xmlns:p=\"http://schemas.openxmlformats.org/presentationml/2006/main\" \
         xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\">\
         <p:cSld><p:spTree><p:sp><p:txBody><a:p>{}</a:p></p:txBody></p:sp>\
         </p:spTree></p:cSld></p:sld>",
        runs
    )
}

/// Two-slide deck: slide 1 has text "Intro" and a PNG image, slide 2
/// has an audio clip and no text. Core properties carry a title.
fn two_slide_deck() -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
        let options = zip::write::SimpleFileOptions::default();

        zip.start_file("[Content_Types].xml", options).unwrap();
        zip.write_all(
            br#"<?xml version="1.0"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="png" ContentType="image/png"/><Default Extension="mp3" ContentType="audio/mp3"/></Types>"#,
        )
        .unwrap();

        zip.start_file("ppt/slides/slide1.xml", options).unwrap();
        zip.write_all(slide_xml(&["Intro"]).as_bytes()).unwrap();
        zip.start_file("ppt/slides/slide2.xml", options).unwrap();
        zip.write_all(slide_xml(&[]).as_bytes()).unwrap();

        zip.start_file("ppt/slides/_rels/slide1.xml.rels", options)
            .unwrap();
        zip.write_all(
            br#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/image1.png"/></Relationships>"#,
        )
        .unwrap();
        zip.start_file("ppt/slides/_rels/slide2.xml.rels", options)
            .unwrap();
        zip.write_all(
            br#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/audio" Target="../media/clip1.mp3"/></Relationships>"#,
        )
        .unwrap();

        zip.start_file("ppt/media/image1.png", options).unwrap();
        zip.write_all(b"\x89PNG\r\n\x1a\nfake-image-bytes").unwrap();
        zip.start_file("ppt/media/clip1.mp3", options).unwrap();
        zip.write_all(b"ID3fake-audio-bytes").unwrap();

        zip.start_file("docProps/core.xml", options).unwrap();
        zip.write_all(
            br#"<?xml version="1.0"?><cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/"><dc:title>Team Update</dc:title><dc:creator>Ada Lovelace</dc:creator><dcterms:created>2024-01-15T08:30:00Z</dcterms:created><dcterms:modified>2024-02-01T10:00:00Z</dcterms:modified></cp:coreProperties>"#,
        )
        .unwrap();

        zip.finish().unwrap();
    }
    buf
}

/// Minimal PDF with one page, an Image XObject in the page resources,
/// and an Info dictionary. Builds body then xref with correct byte
/// offsets so both lopdf and pdf-extract can parse it.
fn pdf_with_image_and_info() -> Vec<u8> {
    let mut out: Vec<u8> = Vec::new();
    let mut offsets: Vec<usize> = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");

    let push = |out: &mut Vec<u8>, offsets: &mut Vec<usize>, body: &[u8]| {
        offsets.push(out.len());
        out.extend_from_slice(body);
    };

    push(&mut out, &mut offsets, b"1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n");
    push(
        &mut out,
        &mut offsets,
        b"2 0 obj << /Type /Pages /Kids [3 0 R] /Count 1 >> endobj\n",
    );
    push(
        &mut out,
        &mut offsets,
        b"3 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> /XObject << /Im1 6 0 R >> >> >> endobj\n",
    );
    let content = b"BT /F1 12 Tf 100 700 Td (board meeting notes) Tj ET";
    let content_obj = format!("4 0 obj << /Length {} >> stream\n", content.len());
    offsets.push(out.len());
    out.extend_from_slice(content_obj.as_bytes());
    out.extend_from_slice(content);
    out.extend_from_slice(b"\nendstream endobj\n");
    push(
        &mut out,
        &mut offsets,
        b"5 0 obj << /Type /Font /Subtype /Type1 /BaseFont /Helvetica >> endobj\n",
    );
    let image_bytes = b"raw-image-stream-bytes";
    let image_obj = format!(
        "6 0 obj << /Type /XObject /Subtype /Image /Width 4 /Height 4 /ColorSpace /DeviceGray /BitsPerComponent 8 /Length {} >> stream\n",
        image_bytes.len()
    );
    offsets.push(out.len());
    out.extend_from_slice(image_obj.as_bytes());
    out.extend_from_slice(image_bytes);
    out.extend_from_slice(b"\nendstream endobj\n");
    push(
        &mut out,
        &mut offsets,
        b"7 0 obj << /Title (Board Notes) /Author (Grace Hopper) /Subject (Minutes) /Producer (corpus-mill tests) >> endobj\n",
    );

    let xref_start = out.len();
    out.extend_from_slice(b"xref\n0 8\n");
    out.extend_from_slice(b"0000000000 65535 f \n");
    for offset in &offsets {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(b"trailer << /Size 8 /Root 1 0 R /Info 7 0 R >>\nstartxref\n");
    out.extend_from_slice(format!("{}\n", xref_start).as_bytes());
    out.extend_from_slice(b"%%EOF\n");
    out
}

#[test]
fn slide_deck_scenario_text_media_and_metadata() {
    let tmp = TempDir::new().unwrap();
    let deck = tmp.path().join("update.pptx");
    fs::write(&deck, two_slide_deck()).unwrap();
    let media_dir = tmp.path().join("media");

    let record = SlideDeckExtractor.extract(&deck, &media_dir).unwrap();

    assert_eq!(record.content, "Intro");
    assert_eq!(record.file_type, FileType::Pptx);
    assert_eq!(record.images.len(), 1);
    assert!(record.images[0].ends_with("update_image_1.png"));
    assert_eq!(record.audio_files.len(), 1);
    assert!(record.audio_files[0].ends_with("update_audio_1.mp3"));
    assert!(record.video_files.is_empty());
    assert_eq!(record.metadata["SlideCount"], "2");
    assert_eq!(record.metadata["Author"], "Ada Lovelace");
    assert_eq!(record.metadata["CreatedDate"], "2024-01-15");
    assert_eq!(record.metadata["ModifiedDate"], "2024-02-01");
    assert_eq!(record.metadata["DocumentTitle"], "Team Update");
    assert_eq!(record.title, "Team Update");

    // Asset bytes actually landed on disk under the deterministic name.
    let written = fs::read(&record.images[0]).unwrap();
    assert!(written.starts_with(b"\x89PNG"));
}

#[test]
fn slide_deck_without_slides_still_succeeds() {
    let tmp = TempDir::new().unwrap();
    let deck = tmp.path().join("empty.pptx");
    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
        zip.start_file("[Content_Types].xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"<?xml version=\"1.0\"?><Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\"/>")
            .unwrap();
        zip.finish().unwrap();
    }
    fs::write(&deck, buf).unwrap();

    let record = SlideDeckExtractor
        .extract(&deck, &tmp.path().join("media"))
        .unwrap();
    assert_eq!(record.content, "");
    assert_eq!(record.metadata["SlideCount"], "0");
    // Empty content means the validation gate drops it downstream.
    assert!(validate::validate(&record).is_err());
}

#[test]
fn pdf_scenario_images_and_info_dictionary() {
    let tmp = TempDir::new().unwrap();
    let pdf = tmp.path().join("minutes.pdf");
    fs::write(&pdf, pdf_with_image_and_info()).unwrap();

    let record = PdfExtractor
        .extract(&pdf, &tmp.path().join("media"))
        .unwrap();

    assert_eq!(record.file_type, FileType::Pdf);
    assert_eq!(record.metadata["PageCount"], "1");
    assert_eq!(record.metadata["Author"], "Grace Hopper");
    assert_eq!(record.metadata["DocumentTitle"], "Board Notes");
    assert_eq!(record.metadata["Subject"], "Minutes");
    assert_eq!(record.metadata["Producer"], "corpus-mill tests");
    assert_eq!(record.title, "Board Notes");

    // Raw XObject stream bytes, written with the fixed .png extension.
    assert_eq!(record.images.len(), 1);
    assert!(record.images[0].ends_with("minutes_image_1.png"));
    assert_eq!(fs::read(&record.images[0]).unwrap(), b"raw-image-stream-bytes");
}

#[test]
fn markdown_scenario_title_content_and_image() {
    let tmp = TempDir::new().unwrap();
    let md = tmp.path().join("hello.md");
    fs::write(&md, "# Title\n\nHello world.\n\n![alt](img.png)\n").unwrap();

    let out = tmp.path().join("out");
    let report = pipeline::run_extract(&Config::default(), &md, &out, None).unwrap();
    assert_eq!(report.extracted, 1);

    let corpus = serializer::load(&report.corpus_path.unwrap()).unwrap();
    let record = &corpus[0];
    assert_eq!(record.title, "Title");
    assert!(record.content.contains("Hello world."));
    assert_eq!(record.metadata["HeadingCount"], "1");
    assert_eq!(record.images.len(), 1);
    let expected = fs::canonicalize(tmp.path()).unwrap().join("img.png");
    assert_eq!(PathBuf::from(&record.images[0]), expected);
}

#[test]
fn merge_scenario_five_records_one_corrupt_source() {
    let tmp = TempDir::new().unwrap();
    let docs = tmp.path().join("docs");
    fs::create_dir_all(&docs).unwrap();
    for i in 0..3 {
        fs::write(
            docs.join(format!("a{}.md", i)),
            format!("# A{}\n\nbody a{}\n", i, i),
        )
        .unwrap();
    }
    let out_a = tmp.path().join("run-a");
    pipeline::run_extract(&Config::default(), &docs, &out_a, None).unwrap();

    let docs_b = tmp.path().join("docs-b");
    fs::create_dir_all(&docs_b).unwrap();
    for i in 0..2 {
        fs::write(
            docs_b.join(format!("b{}.md", i)),
            format!("# B{}\n\nbody b{}\n", i, i),
        )
        .unwrap();
    }
    let out_b = tmp.path().join("run-b");
    pipeline::run_extract(&Config::default(), &docs_b, &out_b, None).unwrap();

    let corrupt = tmp.path().join("corrupt.json");
    fs::write(&corrupt, "{{{ definitely not json").unwrap();

    let merged_path = tmp.path().join("merged.json");
    let report = merge::merge(
        &[
            out_a.join("search-index.json"),
            corrupt,
            out_b.join("search-index.json"),
        ],
        &merged_path,
    )
    .unwrap();

    assert_eq!(report.total, 5);
    assert_eq!(report.failures.len(), 1);
    let merged = serializer::load(&merged_path).unwrap();
    assert_eq!(merged.len(), 5);
    // Source order, then within-source order, is preserved.
    assert_eq!(merged[0].title, "A0");
    assert_eq!(merged[3].title, "B0");
}

#[test]
fn corpus_round_trips_field_for_field() {
    let tmp = TempDir::new().unwrap();
    let docs = tmp.path().join("docs");
    fs::create_dir_all(&docs).unwrap();
    fs::write(docs.join("deck.pptx"), two_slide_deck()).unwrap();
    fs::write(docs.join("note.md"), "# Note\n\nSome body text.\n").unwrap();

    let out = tmp.path().join("out");
    let report = pipeline::run_extract(&Config::default(), &docs, &out, None).unwrap();
    assert_eq!(report.extracted, 2);

    let corpus_path = report.corpus_path.unwrap();
    let records = serializer::load(&corpus_path).unwrap();
    let json = serializer::to_json(&records).unwrap();
    assert_eq!(serializer::from_json(&json).unwrap(), records);
}

#[test]
fn extension_dispatch_covers_all_three_formats() {
    let registry = ExtractorRegistry::new();
    for (ext, file_type) in [
        ("pptx", FileType::Pptx),
        ("pdf", FileType::Pdf),
        ("md", FileType::Md),
    ] {
        assert_eq!(registry.find(ext).unwrap().file_type(), file_type);
    }
}

#[test]
fn repeated_extraction_overwrites_media_instead_of_duplicating() {
    let tmp = TempDir::new().unwrap();
    let deck = tmp.path().join("update.pptx");
    fs::write(&deck, two_slide_deck()).unwrap();
    let media_dir = tmp.path().join("media");

    let first = SlideDeckExtractor.extract(&deck, &media_dir).unwrap();
    let second = SlideDeckExtractor.extract(&deck, &media_dir).unwrap();
    assert_eq!(first.images, second.images);
    // Same deterministic names, so the media dir holds one image and
    // one audio file, not four entries.
    assert_eq!(fs::read_dir(&media_dir).unwrap().count(), 2);
    // Each extraction call produced a distinct record identity.
    assert_ne!(first.id, second.id);
}

#[test]
fn records_in_corpus_follow_sorted_file_order() {
    let tmp = TempDir::new().unwrap();
    let docs = tmp.path().join("docs");
    fs::create_dir_all(&docs).unwrap();
    for name in ["zebra.md", "alpha.md", "mango.md"] {
        fs::write(
            docs.join(name),
            format!("# {}\n\nbody\n", name.trim_end_matches(".md")),
        )
        .unwrap();
    }
    let out = tmp.path().join("out");
    let report = pipeline::run_extract(&Config::default(), &docs, &out, None).unwrap();
    let records = serializer::load(&report.corpus_path.unwrap()).unwrap();
    let titles: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["alpha", "mango", "zebra"]);
}

#[test]
fn unique_ids_across_a_batch() {
    let tmp = TempDir::new().unwrap();
    let docs = tmp.path().join("docs");
    fs::create_dir_all(&docs).unwrap();
    for i in 0..4 {
        fs::write(docs.join(format!("d{}.md", i)), format!("# D{}\n\nx\n", i)).unwrap();
    }
    let out = tmp.path().join("out");
    let report = pipeline::run_extract(&Config::default(), &docs, &out, None).unwrap();
    let records = serializer::load(&report.corpus_path.unwrap()).unwrap();
    let mut ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 4);
}
