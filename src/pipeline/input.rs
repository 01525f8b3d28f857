//! Input resolution: validate a user-supplied path and detect what it holds.
//!
//! ## Why sniff magic bytes instead of trusting extensions?
//!
//! Scanned material arrives with unreliable names — `scan.tmp`, `upload`,
//! `page_04` — and a wrong guess here produces a pdfium crash or a confusing
//! decoder error deep inside the pipeline. Checking the leading bytes (`%PDF`
//! for PDFs, the format signatures the image crate knows for rasters) costs
//! one small read and turns every misidentified input into a precise error
//! before any heavy library is involved.

use crate::error::ScanError;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// How many leading bytes are read for format sniffing. Longest signature the
/// image crate matches is well under this.
const SNIFF_LEN: usize = 32;

/// What kind of document an input file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    /// A PDF document; one image per page after rasterisation.
    Pdf,
    /// A single raster image; treated as exactly one page.
    Image,
}

/// A validated local input file with its detected kind.
#[derive(Debug, Clone)]
pub struct ResolvedInput {
    path: PathBuf,
    kind: InputKind,
}

impl ResolvedInput {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> InputKind {
        self.kind
    }
}

/// Detect the input kind from the leading bytes of a file or buffer.
///
/// Returns `None` when the bytes match neither a PDF header nor any raster
/// format signature known to the image crate.
pub fn sniff_kind(bytes: &[u8]) -> Option<InputKind> {
    if bytes.starts_with(b"%PDF") {
        return Some(InputKind::Pdf);
    }
    if image::guess_format(bytes).is_ok() {
        return Some(InputKind::Image);
    }
    None
}

/// Resolve a local file path, validating existence, readability, and format.
pub fn resolve_input(path_str: &str) -> Result<ResolvedInput, ScanError> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(ScanError::FileNotFound { path });
    }

    let mut file = match std::fs::File::open(&path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ScanError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(ScanError::FileNotFound { path });
        }
    };

    let mut head = [0u8; SNIFF_LEN];
    let mut read = 0;
    // Short files are fine: read as much as is there.
    while read < SNIFF_LEN {
        match file.read(&mut head[read..]) {
            Ok(0) => break,
            Ok(n) => read += n,
            Err(e) => {
                return Err(ScanError::Internal(format!(
                    "reading '{}': {e}",
                    path.display()
                )))
            }
        }
    }

    match sniff_kind(&head[..read]) {
        Some(kind) => {
            debug!("Resolved input {} as {:?}", path.display(), kind);
            Ok(ResolvedInput { path, kind })
        }
        None => {
            let mut magic = [0u8; 4];
            let n = read.min(4);
            magic[..n].copy_from_slice(&head[..n]);
            Err(ScanError::UnsupportedInput { path, magic })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    fn temp_file_with(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(bytes).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn sniffs_pdf_header() {
        assert_eq!(sniff_kind(b"%PDF-1.7\n%\xe2\xe3"), Some(InputKind::Pdf));
    }

    #[test]
    fn sniffs_png_signature() {
        assert_eq!(sniff_kind(PNG_MAGIC), Some(InputKind::Image));
    }

    #[test]
    fn sniffs_jpeg_signature() {
        assert_eq!(
            sniff_kind(&[0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10]),
            Some(InputKind::Image)
        );
    }

    #[test]
    fn rejects_unknown_bytes() {
        assert_eq!(sniff_kind(b"MZ\x00\x01 not a scan"), None);
        assert_eq!(sniff_kind(b""), None);
    }

    #[test]
    fn resolve_detects_pdf_file() {
        let f = temp_file_with(b"%PDF-1.4\nrest of the document");
        let resolved = resolve_input(f.path().to_str().unwrap()).unwrap();
        assert_eq!(resolved.kind(), InputKind::Pdf);
        assert_eq!(resolved.path(), f.path());
    }

    #[test]
    fn resolve_detects_image_file() {
        let f = temp_file_with(PNG_MAGIC);
        let resolved = resolve_input(f.path().to_str().unwrap()).unwrap();
        assert_eq!(resolved.kind(), InputKind::Image);
    }

    #[test]
    fn resolve_rejects_unknown_format() {
        let f = temp_file_with(b"GARBAGE CONTENT");
        let err = resolve_input(f.path().to_str().unwrap());
        assert!(matches!(err, Err(ScanError::UnsupportedInput { .. })));
    }

    #[test]
    fn resolve_rejects_missing_file() {
        let err = resolve_input("/nonexistent/definitely/missing.pdf");
        assert!(matches!(err, Err(ScanError::FileNotFound { .. })));
    }

    #[test]
    fn resolve_handles_tiny_file() {
        let f = temp_file_with(b"%P");
        let err = resolve_input(f.path().to_str().unwrap());
        assert!(matches!(err, Err(ScanError::UnsupportedInput { .. })));
    }
}
