//! Error types for the scan2book library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ScanError`] — **Fatal**: the run cannot produce this artifact at all
//!   (bad input file, wrong password, Tesseract not initialised, container
//!   write failure). Returned as `Err(ScanError)` from the top-level
//!   `extract*` and compile functions.
//!
//! * [`PageError`] — **Non-fatal**: a single page failed to recognise but all
//!   other pages are fine. Stored inside [`crate::output::PageText`] so
//!   callers can inspect partial success rather than losing the whole
//!   document to one bad page; the page itself keeps its slot with empty
//!   text.
//!
//! The separation lets callers decide their own tolerance: abort on the first
//! page failure, log and continue, or collect all errors for a post-run report.
//! Batch drivers scope [`ScanError`] per input file and keep going.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the scan2book library.
///
/// Page-level failures use [`PageError`] and are stored in
/// [`crate::output::PageText`] rather than propagated here.
#[derive(Debug, Error)]
pub enum ScanError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is neither a PDF nor a raster image.
    #[error("File is not a PDF or a supported image (PNG/JPEG): '{path}'\nFirst bytes: {magic:?}")]
    UnsupportedInput { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}\nTry repairing with: qpdf --decrypt input.pdf output.pdf")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// pdfium-render returned an error for a specific page.
    ///
    /// Rasterisation failures are fatal for the whole document: a partially
    /// rasterised PDF would silently violate the one-text-per-page contract.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RenderFailed { page: usize, detail: String },

    // ── Image errors ──────────────────────────────────────────────────────
    /// A single-image input could not be decoded.
    #[error("Failed to decode image '{path}': {detail}")]
    ImageDecodeFailed { path: PathBuf, detail: String },

    // ── OCR errors ────────────────────────────────────────────────────────
    /// Tesseract could not be initialised for the configured language.
    #[error(
        "Tesseract failed to initialise for language '{language}': {detail}\n\
Check that the language data is installed (e.g. tesseract-ocr-ben for 'ben'),\n\
or point --tessdata at a directory containing <lang>.traineddata files."
    )]
    OcrInit { language: String, detail: String },

    // ── Compilation errors ────────────────────────────────────────────────
    /// Every candidate chapter was blank; the book write was aborted.
    #[error("No valid content: all {total} source documents produced blank text, nothing to compile")]
    NoValidContent { total: usize },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The EPUB zip container could not be assembled.
    #[error("EPUB container error: {0}")]
    EpubContainer(#[from] zip::result::ZipError),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
scan2book needs a pdfium shared library at runtime. You can:\n\
  • Install it from your distribution (libpdfium) or a pdfium-binaries release.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single page.
///
/// Stored alongside [`crate::output::PageText`] when a page fails. The page
/// keeps its position in the output with empty text; the overall extraction
/// always continues.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// The OCR engine failed on this page.
    #[error("Page {page}: OCR failed: {detail}")]
    OcrFailed { page: usize, detail: String },
}
