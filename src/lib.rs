//! # scan2book
//!
//! Turn scanned PDFs and images into text, XHTML, or EPUB books with
//! Tesseract OCR.
//!
//! ## Why this crate?
//!
//! A book scanned at a library arrives as a folder of image-only PDFs with no
//! text layer, so ordinary PDF text extractors return nothing for them. This
//! crate rasterises each page via pdfium, reads the bitmaps with Tesseract
//! (any installed language pack, including composites such as `ben+eng` for
//! mixed Bengali/English pages), and compiles the recognised text into
//! reading-order artifacts: plain text, standalone XHTML pages, or a
//! chaptered EPUB.
//!
//! ## Pipeline Overview
//!
//! ```text
//! book-3.pdf  book-4-7.pdf  book-8-11.pdf …
//!  │
//!  ├─ 1. Order      sort sources by the page range in their file names
//!  ├─ 2. Render     rasterise each page via pdfium (or decode a lone image)
//!  ├─ 3. Recognise  Tesseract per page; a failed page logs and yields ""
//!  ├─ 4. Reflow     blank-line paragraph detection
//!  └─ 5. Compile    text / XHTML / EPUB (one chapter per source document)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scan2book::{extract, ExtractionConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::builder()
//!         .language("ben+eng")
//!         .build()?;
//!     let doc = extract("book-4-7.pdf", &config)?;
//!     println!("{}", doc.joined_text());
//!     eprintln!(
//!         "{}/{} pages recognised",
//!         doc.stats.recognised_pages, doc.stats.total_pages
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `scan2book` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! scan2book = { version = "0.3", default-features = false }
//! ```
//!
//! ## Runtime requirements
//!
//! | Component | Needed for | Notes |
//! |-----------|------------|-------|
//! | pdfium | rasterising PDFs | system library, or point `PDFIUM_LIB_PATH` at a downloaded binary |
//! | tesseract + leptonica | page recognition | install the language packs you pass as `--language` |
//!
//! A composite language such as `ben+eng` needs **every** named pack present
//! in the tessdata directory; engine construction fails up front when one is
//! missing, before any page is rendered.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod compile;
pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use compile::order::collect_pdfs;
pub use compile::{
    join_documents, render_xhtml, write_atomic, BookMeta, Chapter, ChapterTitlePolicy, EpubBook,
};
pub use config::{ExtractionConfig, ExtractionConfigBuilder};
pub use error::{PageError, ScanError};
pub use extract::{extract, extract_bytes, inspect};
pub use output::{DocumentInfo, ExtractedDocument, ExtractionStats, PageText};
pub use pipeline::input::InputKind;
pub use pipeline::ocr::{OcrEngine, OcrResult, TesseractEngine};
pub use progress::{ExtractionObserver, NoopObserver, ObserverHandle};
