//! Page-range ordering for scanned source documents.
//!
//! Scan batches arrive as one PDF per chunk of pages, named after the pages
//! they cover: `book-3.pdf`, `book-12-15.pdf`. Lexicographic order shuffles
//! them (`a-100` before `a-12` before `a-3`), so compilation sorts on the
//! numeric range instead.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ScanError;

/// The last integer or dash-separated range immediately before the `.pdf`
/// suffix.
static RE_PAGE_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)(?:-(\d+))?\.pdf$").unwrap());

/// Sort key for file names with no parseable page range. `u64::MAX` places
/// them after every well-formed name; the sort being stable keeps them in
/// encounter order relative to each other.
const MALFORMED: (u64, u64) = (u64::MAX, u64::MAX);

/// Parse the page range out of a file name.
///
/// `book-7.pdf` yields `(7, 7)`, `book-7-9.pdf` yields `(7, 9)`. Returns
/// `None` when no range is present or the digits overflow `u64`.
pub fn page_range(file_name: &str) -> Option<(u64, u64)> {
    let caps = RE_PAGE_RANGE.captures(file_name)?;
    let start: u64 = caps.get(1)?.as_str().parse().ok()?;
    let end: u64 = match caps.get(2) {
        Some(m) => m.as_str().parse().ok()?,
        None => start,
    };
    Some((start, end))
}

fn sort_key(path: &Path) -> (u64, u64) {
    path.file_name()
        .and_then(|n| n.to_str())
        .and_then(page_range)
        .unwrap_or(MALFORMED)
}

/// Order `paths` by `(start, end)` page range, well-formed names first.
pub fn sort_by_page_range(paths: &mut [PathBuf]) {
    paths.sort_by_key(|p| sort_key(p));
}

/// Collect every `.pdf` file directly under `dir`, in page-range order.
///
/// Matching is on the literal `.pdf` extension; subdirectories are not
/// descended into. Directory entries are taken in file-name order before the
/// range sort, so names without a range land in a deterministic position on
/// every run.
pub fn collect_pdfs(dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
    if !dir.exists() {
        return Err(ScanError::FileNotFound {
            path: dir.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(dir).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => ScanError::PermissionDenied {
            path: dir.to_path_buf(),
        },
        _ => ScanError::Internal(format!("Cannot list '{}': {e}", dir.display())),
    })?;

    let mut pdfs = Vec::new();
    for entry in entries {
        let entry = entry
            .map_err(|e| ScanError::Internal(format!("Cannot list '{}': {e}", dir.display())))?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "pdf") {
            pdfs.push(path);
        }
    }

    pdfs.sort();
    sort_by_page_range(&mut pdfs);
    Ok(pdfs)
}
