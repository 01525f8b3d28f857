//! Pipeline stages for turning a scanned document into per-page text.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. a different OCR engine) without touching
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ ocr
//! (path)   (pdfium)  (tesseract)
//! ```
//!
//! 1. [`input`]  — validate the user-supplied path and sniff whether it is a
//!    PDF or a single raster image from its magic bytes
//! 2. [`render`] — rasterise every PDF page to a `DynamicImage`
//! 3. [`ocr`]    — recognise one image at a time through the [`ocr::OcrEngine`]
//!    trait; the default engine drives Tesseract via leptess
//!
//! The whole pipeline is synchronous and single-threaded: pages flow through
//! strictly in physical order, one at a time.

pub mod input;
pub mod ocr;
pub mod render;
