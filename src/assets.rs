//! Asset persistence for embedded binary payloads.
//!
//! Every extractor funnels its embedded images, audio, and video through
//! [`write_asset`], which maps a MIME-style content type to an extension
//! and persists the bytes under a deterministic name so repeated runs
//! over the same source file overwrite instead of accumulating.

use std::fs;
use std::path::{Path, PathBuf};

/// Kind of embedded asset, used in the deterministic filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Image,
    Audio,
    Video,
}

impl AssetKind {
    fn label(self) -> &'static str {
        match self {
            AssetKind::Image => "image",
            AssetKind::Audio => "audio",
            AssetKind::Video => "video",
        }
    }
}

/// Per-document asset counters, threaded through a single extraction
/// call. Scoped per document so batch extraction stays parallelizable;
/// a counter value is never reused within one extraction pass.
#[derive(Debug, Default)]
pub struct AssetCounters {
    image: u32,
    audio: u32,
    video: u32,
}

impl AssetCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next 1-based counter for `kind`.
    pub fn next(&mut self, kind: AssetKind) -> u32 {
        let slot = match kind {
            AssetKind::Image => &mut self.image,
            AssetKind::Audio => &mut self.audio,
            AssetKind::Video => &mut self.video,
        };
        *slot += 1;
        *slot
    }
}

/// Maps a MIME-style content type to a file extension.
///
/// Image types use exact matches; audio/video container formats are
/// matched by substring because OOXML packages declare them with vendor
/// prefixes (`audio/x-wav`, `video/x-ms-wmv`). Unknown types fall back
/// to `.bin`.
pub fn extension_for(content_type: &str) -> &'static str {
    let ct = content_type.trim().to_ascii_lowercase();
    match ct.as_str() {
        "image/png" => return ".png",
        "image/jpeg" | "image/jpg" => return ".jpg",
        "image/gif" => return ".gif",
        "image/bmp" => return ".bmp",
        "image/tiff" => return ".tiff",
        _ => {}
    }
    for (needle, ext) in [
        ("mp3", ".mp3"),
        ("wav", ".wav"),
        ("mp4", ".mp4"),
        ("avi", ".avi"),
        ("wmv", ".wmv"),
        ("mpeg", ".mpeg"),
    ] {
        if ct.contains(needle) {
            return ext;
        }
    }
    ".bin"
}

/// Writes one asset to `{out_dir}/{base_name}_{kind}_{counter}{ext}`,
/// creating `out_dir` (and missing ancestors) idempotently.
///
/// Failure here is fatal for this one asset only; callers log and
/// continue with the rest of the document.
pub fn write_asset(
    bytes: &[u8],
    content_type: &str,
    base_name: &str,
    kind: AssetKind,
    counter: u32,
    out_dir: &Path,
) -> std::io::Result<PathBuf> {
    fs::create_dir_all(out_dir)?;
    let ext = extension_for(content_type);
    let path = out_dir.join(format!("{}_{}_{}{}", base_name, kind.label(), counter, ext));
    fs::write(&path, bytes)?;
    Ok(path)
}
