//! PDF rasterisation: render every page to a `DynamicImage` via pdfium.
//!
//! ## Why cap pixels, not DPI?
//!
//! Page sizes vary wildly: an A0 poster rendered at a fixed DPI could produce
//! a 12,000 × 17,000 px image. `max_rendered_pixels` caps the longest edge
//! regardless of physical page size, keeping memory bounded while staying
//! comfortably above the ~300 DPI point where Tesseract accuracy plateaus for
//! ordinary book pages.
//!
//! ## Why is any render failure fatal?
//!
//! The extraction contract promises one text per page in physical order. A
//! page that cannot even be rasterised has no image to recognise, and
//! substituting a hole would break the page-count invariant silently. The
//! caller is better served by a document-level error it can log and skip.

use crate::config::ExtractionConfig;
use crate::error::ScanError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Bind to the pdfium shared library.
///
/// `PDFIUM_LIB_PATH` may point at a directory holding the platform library;
/// otherwise the system-wide library is used.
fn bind_pdfium() -> Result<Pdfium, ScanError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(dir) if !dir.is_empty() => {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&dir))
                .or_else(|_| Pdfium::bind_to_system_library())
        }
        _ => Pdfium::bind_to_system_library(),
    };
    bindings
        .map(Pdfium::new)
        .map_err(|e| ScanError::PdfiumBindingFailed(format!("{e:?}")))
}

/// Load a document, mapping pdfium's load errors onto the input taxonomy.
fn load_document<'a>(
    pdfium: &'a Pdfium,
    pdf_path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, ScanError> {
    pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let err_str = format!("{e:?}");
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                ScanError::WrongPassword {
                    path: pdf_path.to_path_buf(),
                }
            } else {
                ScanError::PasswordRequired {
                    path: pdf_path.to_path_buf(),
                }
            }
        } else {
            ScanError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: err_str,
            }
        }
    })
}

/// Rasterise every page of a PDF into an image, in physical page order.
///
/// # Returns
/// A vector of `(page_index_0based, DynamicImage)` tuples, one per page.
pub fn rasterize_pdf(
    pdf_path: &Path,
    config: &ExtractionConfig,
) -> Result<Vec<(usize, DynamicImage)>, ScanError> {
    let pdfium = bind_pdfium()?;
    let document = load_document(&pdfium, pdf_path, config.password.as_deref())?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);

    let max_pixels = config.max_rendered_pixels;
    let render_config = PdfRenderConfig::new()
        .set_target_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32);

    let mut results = Vec::with_capacity(total_pages);

    for idx in 0..total_pages {
        let page = pages.get(idx as u16).map_err(|e| ScanError::RenderFailed {
            page: idx + 1,
            detail: format!("{e:?}"),
        })?;

        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| ScanError::RenderFailed {
                page: idx + 1,
                detail: format!("{e:?}"),
            })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            idx + 1,
            image.width(),
            image.height()
        );

        results.push((idx, image));
    }

    Ok(results)
}

/// Number of pages in a PDF, without rendering anything.
pub fn pdf_page_count(pdf_path: &Path, password: Option<&str>) -> Result<usize, ScanError> {
    let pdfium = bind_pdfium()?;
    let document = load_document(&pdfium, pdf_path, password)?;
    Ok(document.pages().len() as usize)
}
