//! Configuration types for text extraction.
//!
//! All extraction behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share configs across calls, log them, and diff two runs to
//! understand why their outputs differ.
//!
//! # Design choice: builder over constructor
//! A many-field constructor is unreadable and breaks on every new field.
//! The builder pattern lets callers set only what they care about and rely on
//! well-documented defaults for the rest.

use crate::error::ScanError;
use crate::pipeline::ocr::OcrEngine;
use crate::progress::ObserverHandle;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for one extraction run.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use scan2book::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .language("ben+eng")
///     .max_rendered_pixels(3000)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Tesseract language identifier. Default: `"eng"`.
    ///
    /// Passed through to the OCR engine verbatim, so composite identifiers
    /// work exactly as on the `tesseract` command line: `"ben+eng"` recognises
    /// Bengali and English on the same page. Every language named here must
    /// have a `<lang>.traineddata` file visible to Tesseract, either in its
    /// default data directory or under [`tessdata_dir`](Self::tessdata_dir).
    pub language: String,

    /// Directory containing `*.traineddata` model files. Default: `None`.
    ///
    /// `None` uses Tesseract's compiled-in default search path. Set this when
    /// shipping custom or better-trained models alongside the application
    /// rather than installing them system-wide.
    pub tessdata_dir: Option<PathBuf>,

    /// Maximum rendered page dimension (width or height) in pixels. Default: 4000.
    ///
    /// A safety cap on rasterisation. Recognition accuracy improves with
    /// resolution up to roughly 300 DPI and then plateaus, while memory cost
    /// keeps growing quadratically — an A0 poster rendered without a cap could
    /// allocate a 13 000 × 18 000 px bitmap. The cap bounds either dimension
    /// and scales the other proportionally.
    pub max_rendered_pixels: u32,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Pre-constructed OCR engine. Default: `None`.
    ///
    /// `None` constructs a Tesseract engine from `language` and `tessdata_dir`
    /// on first use. Supplying an engine overrides both fields; it is the seam
    /// for custom recognisers and for tests that must not depend on an
    /// installed Tesseract.
    pub engine: Option<Arc<dyn OcrEngine>>,

    /// Observer notified of per-page progress. Default: `None` (no-op).
    pub observer: Option<ObserverHandle>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            tessdata_dir: None,
            max_rendered_pixels: 4000,
            password: None,
            engine: None,
            observer: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("language", &self.language)
            .field("tessdata_dir", &self.tessdata_dir)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("engine", &self.engine.as_ref().map(|_| "<dyn OcrEngine>"))
            .field(
                "observer",
                &self.observer.as_ref().map(|_| "<dyn ExtractionObserver>"),
            )
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn language(mut self, lang: impl Into<String>) -> Self {
        self.config.language = lang.into();
        self
    }

    pub fn tessdata_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.tessdata_dir = Some(dir.into());
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.clamp(256, 8192);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn engine(mut self, engine: Arc<dyn OcrEngine>) -> Self {
        self.config.engine = Some(engine);
        self
    }

    pub fn observer(mut self, observer: ObserverHandle) -> Self {
        self.config.observer = Some(observer);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ScanError> {
        let c = &self.config;
        if c.language.trim().is_empty() {
            return Err(ScanError::InvalidConfig(
                "OCR language must not be empty".into(),
            ));
        }
        if c.max_rendered_pixels < 256 {
            return Err(ScanError::InvalidConfig(format!(
                "max_rendered_pixels must be ≥ 256, got {}",
                c.max_rendered_pixels
            )));
        }
        Ok(self.config)
    }
}
