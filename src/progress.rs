//! Observer trait for per-page extraction events.
//!
//! Inject an [`Arc<dyn ExtractionObserver>`] via
//! [`crate::config::ExtractionConfigBuilder::observer`] to receive real-time
//! events as the pipeline recognises each page.
//!
//! # Why an observer instead of channels?
//!
//! The observer approach is the least-invasive integration point: callers can
//! forward events to a terminal progress bar, a GUI widget showing each page's
//! text as it arrives, a log file, or a database record — without the library
//! knowing anything about how the host application communicates. The pipeline
//! itself is single-threaded and invokes the observer strictly in page order;
//! the trait is still `Send + Sync` so one observer can be shared across
//! documents in a batch run.
//!
//! # Example
//!
//! ```rust
//! use scan2book::{ExtractionObserver, ExtractionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingObserver {
//!     completed: Arc<AtomicUsize>,
//! }
//!
//! impl ExtractionObserver for CountingObserver {
//!     fn on_page_complete(&self, page_num: usize, total_pages: usize, text: &str) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Page {}/{} done ({} chars)", page_num, total_pages, text.chars().count());
//!     }
//! }
//!
//! let counter = Arc::new(CountingObserver {
//!     completed: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = ExtractionConfig::builder()
//!     .observer(counter as Arc<dyn ExtractionObserver>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the extraction pipeline as it processes each page.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Events arrive in page order from a single thread;
/// `on_page_complete` carries the recognised text so interactive hosts can
/// surface each page as soon as it is available.
pub trait ExtractionObserver: Send + Sync {
    /// Called once after rasterisation, before any page is recognised.
    ///
    /// # Arguments
    /// * `total_pages` — number of pages that will be processed
    fn on_document_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called just before a page is handed to the OCR engine.
    ///
    /// # Arguments
    /// * `page_num`    — 1-indexed page number
    /// * `total_pages` — total pages in the document
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when a page is successfully recognised.
    ///
    /// # Arguments
    /// * `page_num`    — 1-indexed page number
    /// * `total_pages` — total pages
    /// * `text`        — the recognised text for this page
    fn on_page_complete(&self, page_num: usize, total_pages: usize, text: &str) {
        let _ = (page_num, total_pages, text);
    }

    /// Called when OCR fails on a page.
    ///
    /// The page keeps its slot in the output with empty text; the run
    /// continues with the next page.
    ///
    /// # Arguments
    /// * `page_num`    — 1-indexed page number
    /// * `total_pages` — total pages
    /// * `error`       — human-readable error description
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        let _ = (page_num, total_pages, error);
    }

    /// Called once after all pages have been attempted.
    ///
    /// # Arguments
    /// * `total_pages`   — total pages in the document
    /// * `success_count` — pages recognised without error
    fn on_document_complete(&self, total_pages: usize, success_count: usize) {
        let _ = (total_pages, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no observer is configured.
pub struct NoopObserver;

impl ExtractionObserver for NoopObserver {}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ObserverHandle = Arc<dyn ExtractionObserver>;
