//! Extraction entry points: one source document in, per-page text out.
//!
//! ## Why one eager API?
//!
//! A scanned book page takes seconds of OCR; the bookkeeping around it is
//! microseconds. Streaming or partial APIs would buy nothing here, so the
//! module offers plain synchronous calls: wait for every page, then return a
//! complete [`ExtractedDocument`]. Callers that want page-by-page feedback
//! attach an [`crate::progress::ExtractionObserver`] instead.

use crate::config::ExtractionConfig;
use crate::error::{PageError, ScanError};
use crate::output::{DocumentInfo, ExtractedDocument, ExtractionStats, PageText};
use crate::pipeline::ocr::{OcrEngine, TesseractEngine};
use crate::pipeline::{input, render};
use image::DynamicImage;
use std::io::Write;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Extract text from a PDF or image file.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input_str` — Local path to a PDF or a PNG/JPEG image
/// * `config`    — Extraction configuration
///
/// # Returns
/// `Ok(ExtractedDocument)` on success, even if some pages failed OCR
/// (check `doc.stats.failed_pages`; failed pages hold empty text).
///
/// # Errors
/// Returns `Err(ScanError)` only for document-level failures:
/// - File not found / permission denied / unrecognised format
/// - Corrupt or password-protected PDF, rasterisation failure
/// - Tesseract could not initialise for the configured language
///
/// # Example
/// ```rust,no_run
/// use scan2book::{extract, ExtractionConfig};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ExtractionConfig::builder().language("ben+eng").build()?;
/// let doc = extract("scan-12-15.pdf", &config)?;
/// for page in &doc.pages {
///     println!("--- page {} ---\n{}", page.page_num, page.text);
/// }
/// # Ok(())
/// # }
/// ```
pub fn extract(
    input_str: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<ExtractedDocument, ScanError> {
    let total_start = Instant::now();
    let input_str = input_str.as_ref();
    info!("Starting extraction: {}", input_str);

    // ── Step 1: Resolve input ────────────────────────────────────────────
    let resolved = input::resolve_input(input_str)?;
    let source = resolved
        .path()
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input_str.to_string());

    // ── Step 2: Get/create OCR engine ────────────────────────────────────
    let engine = resolve_engine(config)?;

    // ── Step 3: Rasterise PDF pages / decode the single image ────────────
    let render_start = Instant::now();
    let images = match resolved.kind() {
        input::InputKind::Pdf => render::rasterize_pdf(resolved.path(), config)?,
        input::InputKind::Image => {
            let img =
                image::open(resolved.path()).map_err(|e| ScanError::ImageDecodeFailed {
                    path: resolved.path().to_path_buf(),
                    detail: e.to_string(),
                })?;
            vec![(0, img)]
        }
    };
    let render_duration_ms = render_start.elapsed().as_millis() as u64;
    info!(
        "Prepared {} page image(s) in {}ms",
        images.len(),
        render_duration_ms
    );

    // ── Step 4: Recognise pages sequentially ─────────────────────────────
    let ocr_start = Instant::now();
    let pages = recognize_pages(&images, engine.as_ref(), config);
    let ocr_duration_ms = ocr_start.elapsed().as_millis() as u64;

    // ── Step 5: Compute stats ────────────────────────────────────────────
    let recognised = pages.iter().filter(|p| p.error.is_none()).count();
    let failed = pages.len() - recognised;
    let stats = ExtractionStats {
        total_pages: pages.len(),
        recognised_pages: recognised,
        failed_pages: failed,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        render_duration_ms,
        ocr_duration_ms,
    };

    info!(
        "Extraction complete: {}/{} pages, {}ms total",
        recognised,
        pages.len(),
        stats.total_duration_ms
    );

    Ok(ExtractedDocument {
        source,
        pages,
        stats,
    })
}

/// Extract text from in-memory document bytes.
///
/// Internally the library writes `bytes` to a managed [`tempfile`] and cleans
/// it up automatically on return or panic. `label` becomes the document's
/// `source` (the temp file's random name would be meaningless downstream,
/// e.g. for chapter titles).
///
/// This is the API for data arriving from an upload, a database, or any
/// other non-filesystem source.
pub fn extract_bytes(
    bytes: &[u8],
    label: impl Into<String>,
    config: &ExtractionConfig,
) -> Result<ExtractedDocument, ScanError> {
    let mut tmp = tempfile::NamedTempFile::new()
        .map_err(|e| ScanError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| ScanError::Internal(format!("tempfile write: {e}")))?;
    let path = tmp.path().to_string_lossy().to_string();
    // `tmp` is dropped (and the file deleted) when `extract` returns
    let mut doc = extract(&path, config)?;
    doc.source = label.into();
    Ok(doc)
}

/// Report what an input holds without running OCR.
///
/// Does not require an installed Tesseract; PDFs are opened only to count
/// pages.
pub fn inspect(input_str: impl AsRef<str>) -> Result<DocumentInfo, ScanError> {
    let resolved = input::resolve_input(input_str.as_ref())?;
    let page_count = match resolved.kind() {
        input::InputKind::Pdf => render::pdf_page_count(resolved.path(), None)?,
        input::InputKind::Image => 1,
    };
    Ok(DocumentInfo {
        kind: resolved.kind(),
        page_count,
    })
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Resolve the OCR engine, most-specific first.
///
/// 1. **Pre-built engine** (`config.engine`) — the caller constructed it;
///    used as-is. This is the seam for tests and custom recognisers.
/// 2. **Tesseract from config** — built from `language` + `tessdata_dir`,
///    verifying initialisation so a missing language pack fails before any
///    rendering work.
fn resolve_engine(config: &ExtractionConfig) -> Result<Arc<dyn OcrEngine>, ScanError> {
    if let Some(ref engine) = config.engine {
        return Ok(Arc::clone(engine));
    }
    Ok(Arc::new(TesseractEngine::new(
        &config.language,
        config.tessdata_dir.as_deref(),
    )?))
}

/// Recognise every page image in order, catching per-page failures.
///
/// A page that fails keeps its slot with empty text and a recorded
/// [`PageError`]; the output length always equals `images.len()`.
fn recognize_pages(
    images: &[(usize, DynamicImage)],
    engine: &dyn OcrEngine,
    config: &ExtractionConfig,
) -> Vec<PageText> {
    let total_pages = images.len();
    if let Some(ref obs) = config.observer {
        obs.on_document_start(total_pages);
    }

    let mut pages = Vec::with_capacity(total_pages);
    let mut recognised = 0usize;

    for (idx, image) in images {
        let page_num = idx + 1;
        if let Some(ref obs) = config.observer {
            obs.on_page_start(page_num, total_pages);
        }

        match engine.recognize(image) {
            Ok(text) => {
                debug!("Page {} recognised ({} chars)", page_num, text.chars().count());
                if let Some(ref obs) = config.observer {
                    obs.on_page_complete(page_num, total_pages, &text);
                }
                recognised += 1;
                pages.push(PageText {
                    page_num,
                    text,
                    error: None,
                });
            }
            Err(e) => {
                let error = PageError::OcrFailed {
                    page: page_num,
                    detail: e.to_string(),
                };
                warn!("{error}");
                if let Some(ref obs) = config.observer {
                    obs.on_page_error(page_num, total_pages, &error.to_string());
                }
                pages.push(PageText {
                    page_num,
                    text: String::new(),
                    error: Some(error),
                });
            }
        }
    }

    if let Some(ref obs) = config.observer {
        obs.on_document_complete(total_pages, recognised);
    }

    pages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ocr::OcrResult;
    use crate::progress::ExtractionObserver;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Replays a fixed script of page results, one per call.
    struct ScriptedEngine {
        script: Mutex<VecDeque<Result<String, String>>>,
    }

    impl ScriptedEngine {
        fn new(script: Vec<Result<String, String>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
            }
        }
    }

    impl OcrEngine for ScriptedEngine {
        fn recognize(&self, _image: &DynamicImage) -> OcrResult {
            match self.script.lock().unwrap().pop_front() {
                Some(Ok(text)) => Ok(text),
                Some(Err(detail)) => Err(detail.into()),
                None => Ok(String::new()),
            }
        }
    }

    struct CountingObserver {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
    }

    impl CountingObserver {
        fn new() -> Self {
            Self {
                starts: AtomicUsize::new(0),
                completes: AtomicUsize::new(0),
                errors: AtomicUsize::new(0),
            }
        }
    }

    impl ExtractionObserver for CountingObserver {
        fn on_page_start(&self, _page: usize, _total: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }
        fn on_page_complete(&self, _page: usize, _total: usize, _text: &str) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }
        fn on_page_error(&self, _page: usize, _total: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn dummy_images(n: usize) -> Vec<(usize, DynamicImage)> {
        (0..n)
            .map(|i| {
                (
                    i,
                    DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
                        4,
                        4,
                        image::Rgba([255, 255, 255, 255]),
                    )),
                )
            })
            .collect()
    }

    #[test]
    fn failed_page_keeps_its_slot() {
        let engine = ScriptedEngine::new(vec![
            Ok("page one".into()),
            Err("blurred beyond hope".into()),
            Ok("page three".into()),
        ]);
        let config = ExtractionConfig::default();
        let pages = recognize_pages(&dummy_images(3), &engine, &config);

        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].text, "page one");
        assert_eq!(pages[1].text, "");
        assert!(pages[1].error.is_some());
        assert_eq!(pages[2].text, "page three");
        assert_eq!(pages[2].page_num, 3);
    }

    #[test]
    fn observer_sees_every_page_event() {
        let obs = Arc::new(CountingObserver::new());
        let config = ExtractionConfig::builder()
            .observer(obs.clone())
            .build()
            .unwrap();
        let engine = ScriptedEngine::new(vec![
            Ok("a".into()),
            Err("nope".into()),
            Ok("c".into()),
        ]);

        let pages = recognize_pages(&dummy_images(3), &engine, &config);
        assert_eq!(pages.len(), 3);
        assert_eq!(obs.starts.load(Ordering::SeqCst), 3);
        assert_eq!(obs.completes.load(Ordering::SeqCst), 2);
        assert_eq!(obs.errors.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn injected_engine_takes_priority() {
        let engine: Arc<dyn OcrEngine> = Arc::new(ScriptedEngine::new(vec![]));
        let config = ExtractionConfig::builder()
            .engine(Arc::clone(&engine))
            // A bogus language would make TesseractEngine::new fail; the
            // injected engine must short-circuit before that.
            .language("zz-not-a-language")
            .build()
            .unwrap();
        assert!(resolve_engine(&config).is_ok());
    }

    #[test]
    fn extract_single_image_is_one_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.png");
        image::RgbaImage::from_pixel(16, 16, image::Rgba([250, 250, 250, 255]))
            .save_with_format(&path, image::ImageFormat::Png)
            .unwrap();

        let config = ExtractionConfig::builder()
            .engine(Arc::new(ScriptedEngine::new(vec![Ok("lone page".into())])))
            .build()
            .unwrap();

        let doc = extract(path.to_str().unwrap(), &config).unwrap();
        assert_eq!(doc.pages.len(), 1);
        assert_eq!(doc.pages[0].text, "lone page");
        assert_eq!(doc.source, "scan.png");
        assert_eq!(doc.stats.total_pages, 1);
        assert_eq!(doc.stats.recognised_pages, 1);
    }

    #[test]
    fn extract_bytes_applies_label() {
        let mut png = std::io::Cursor::new(Vec::new());
        image::RgbaImage::from_pixel(8, 8, image::Rgba([255, 255, 255, 255]))
            .write_to(&mut png, image::ImageFormat::Png)
            .unwrap();

        let config = ExtractionConfig::builder()
            .engine(Arc::new(ScriptedEngine::new(vec![Ok("from bytes".into())])))
            .build()
            .unwrap();

        let doc = extract_bytes(png.get_ref(), "upload-7.png", &config).unwrap();
        assert_eq!(doc.source, "upload-7.png");
        assert_eq!(doc.pages[0].text, "from bytes");
    }

    #[test]
    fn inspect_reports_image_as_one_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.png");
        image::RgbaImage::from_pixel(4, 4, image::Rgba([0, 0, 0, 255]))
            .save_with_format(&path, image::ImageFormat::Png)
            .unwrap();

        let info = inspect(path.to_str().unwrap()).unwrap();
        assert_eq!(info.page_count, 1);
        assert_eq!(info.kind, input::InputKind::Image);
    }
}
