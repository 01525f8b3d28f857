//! Text recognition: one image in, recognised text out.
//!
//! ## Why a trait seam here?
//!
//! Everything upstream (rasterisation) and downstream (assembly) is pure data
//! plumbing; the OCR engine is the single external collaborator. Hiding it
//! behind [`OcrEngine`] keeps the pipeline testable without an installed
//! Tesseract and lets embedders swap in their own recogniser while reusing
//! the rest of the crate unchanged.
//!
//! ## Why a fresh `LepTess` per page?
//!
//! `LepTess` wraps raw Tesseract handles and is not `Sync`, while
//! [`TesseractEngine`] must be shareable (`Arc<dyn OcrEngine>`). Constructing
//! the handle per call keeps the engine plain data; initialisation is a few
//! milliseconds against seconds of recognition per scanned page, and a bad
//! language pack still fails fast because construction verifies one
//! initialisation up front.

use crate::error::ScanError;
use image::DynamicImage;
use leptess::LepTess;
use std::io::Cursor;
use std::path::Path;

/// Result type for engine calls: the error is page-level and recoverable, so
/// any displayable error will do.
pub type OcrResult = Result<String, Box<dyn std::error::Error + Send + Sync>>;

/// An OCR engine that recognises text in a single page image.
///
/// Implementations must be `Send + Sync`: one engine instance is shared
/// across every page of a run (and across documents in a batch).
pub trait OcrEngine: Send + Sync {
    /// Recognise the text in `image`.
    ///
    /// A returned error marks this page as failed; the caller substitutes an
    /// empty string and continues with the next page.
    fn recognize(&self, image: &DynamicImage) -> OcrResult;
}

/// The default engine: Tesseract via leptess.
///
/// `language` is passed to Tesseract verbatim, so composite identifiers like
/// `"ben+eng"` select several recognition models at once. `datapath`
/// overrides Tesseract's model search directory (the `--tessdata-dir` of the
/// command-line tool).
#[derive(Debug)]
pub struct TesseractEngine {
    language: String,
    datapath: Option<String>,
}

impl TesseractEngine {
    /// Create an engine, verifying Tesseract can initialise for `language`.
    ///
    /// Failing here (rather than on the first page) turns a missing language
    /// pack into a fatal, actionable error before any rasterisation work.
    pub fn new(language: &str, tessdata_dir: Option<&Path>) -> Result<Self, ScanError> {
        let datapath = match tessdata_dir {
            Some(dir) => Some(
                dir.to_str()
                    .ok_or_else(|| {
                        ScanError::InvalidConfig(format!(
                            "tessdata path is not valid UTF-8: {}",
                            dir.display()
                        ))
                    })?
                    .to_string(),
            ),
            None => None,
        };

        let _verify = LepTess::new(datapath.as_deref(), language).map_err(|e| {
            ScanError::OcrInit {
                language: language.to_string(),
                detail: e.to_string(),
            }
        })?;

        Ok(Self {
            language: language.to_string(),
            datapath,
        })
    }

    /// The language identifier this engine was built with.
    pub fn language(&self) -> &str {
        &self.language
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(&self, image: &DynamicImage) -> OcrResult {
        let mut lt = LepTess::new(self.datapath.as_deref(), &self.language)
            .map_err(|e| format!("tesseract init: {e}"))?;

        // leptess expects encoded image data; PNG is lossless and cheap.
        let mut png_buf = Cursor::new(Vec::new());
        image
            .write_to(&mut png_buf, image::ImageFormat::Png)
            .map_err(|e| format!("png encode: {e}"))?;

        lt.set_image_from_mem(png_buf.get_ref())
            .map_err(|e| format!("set image: {e}"))?;

        let text = lt
            .get_utf8_text()
            .map_err(|e| format!("read recognised text: {e}"))?;
        Ok(text)
    }
}
