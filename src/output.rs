//! Result types returned by the extraction entry points.
//!
//! [`ExtractedDocument`] is deliberately richer than a plain `Vec<String>`:
//! callers get per-page text *and* per-page errors plus timing stats, so a
//! batch driver can report partial success precisely instead of guessing from
//! an assembled blob. Everything here serialises with serde so the CLI can
//! emit machine-readable JSON.

use crate::error::PageError;
use serde::{Deserialize, Serialize};

/// Recognised text for a single page.
///
/// A page that failed OCR keeps its slot: `text` is empty and `error` records
/// what went wrong. The invariant "one entry per source page, in physical
/// order" therefore holds even for partially failed documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageText {
    /// 1-indexed page number within the source document.
    pub page_num: usize,
    /// Recognised text; empty when `error` is set.
    pub text: String,
    /// The page-level failure, if recognition did not succeed.
    pub error: Option<PageError>,
}

impl PageText {
    /// True when the page produced no usable text (failed or genuinely blank).
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Ordered per-page text recognised from one source document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedDocument {
    /// Label identifying the source, normally the input file name.
    pub source: String,
    /// One entry per page, in physical page order.
    pub pages: Vec<PageText>,
    /// Timing and success counters for this run.
    pub stats: ExtractionStats,
}

impl ExtractedDocument {
    /// All page texts joined with a blank line, in page order.
    ///
    /// Failed pages contribute their empty string, so the join is not a
    /// filter: a failed page leaves a visible gap rather than silently
    /// shifting the following text up.
    pub fn joined_text(&self) -> String {
        self.pages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// True when every page is blank after trimming.
    ///
    /// Blank documents are legal extraction results; the e-book assembler is
    /// the layer that decides to skip them.
    pub fn is_blank(&self) -> bool {
        self.pages.iter().all(PageText::is_blank)
    }

    /// Iterate over the errors of failed pages.
    pub fn page_errors(&self) -> impl Iterator<Item = &PageError> {
        self.pages.iter().filter_map(|p| p.error.as_ref())
    }
}

/// Counters and timings for one extraction run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Pages in the source document.
    pub total_pages: usize,
    /// Pages recognised without error.
    pub recognised_pages: usize,
    /// Pages that failed OCR or image encoding.
    pub failed_pages: usize,
    /// Wall-clock duration of the whole run in milliseconds.
    pub total_duration_ms: u64,
    /// Time spent rasterising / decoding input in milliseconds.
    pub render_duration_ms: u64,
    /// Time spent in the OCR engine in milliseconds.
    pub ocr_duration_ms: u64,
}

/// What `inspect` reports about an input without running OCR.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInfo {
    /// Detected input kind ("pdf" or "image").
    pub kind: crate::pipeline::input::InputKind,
    /// Number of pages OCR would process (1 for a single image).
    pub page_count: usize,
}
