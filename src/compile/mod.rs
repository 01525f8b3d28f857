//! Compilation stage: recognised text to deliverable artifacts.
//!
//! Extraction (the [`crate::pipeline`] side) produces one
//! [`ExtractedDocument`] per source file. This module turns a sequence of
//! those documents into the three artifact forms:
//!
//! - plain text: [`join_documents`]
//! - a standalone XHTML page: [`render_xhtml`]
//! - an EPUB book: [`EpubBook`]
//!
//! [`order`] decides which source files take part and in what sequence,
//! [`paragraphs`] reflows raw line-oriented text, and [`markup`] keeps the
//! produced XML well-formed whatever the recogniser emitted. All artifact
//! writes go through [`write_atomic`], so an interrupted run never leaves a
//! partial file at the destination.

pub mod epub;
pub mod markup;
pub mod order;
pub mod paragraphs;

use std::io::Write as _;
use std::path::Path;

use crate::error::ScanError;
use crate::output::ExtractedDocument;

pub use epub::{BookMeta, Chapter, ChapterTitlePolicy, EpubBook};

/// Concatenate the text of `docs` in the order given, separated by blank
/// lines.
///
/// No filtering happens here: a document that recognised nothing contributes
/// an empty segment, which collapses into the separators around it.
pub fn join_documents(docs: &[ExtractedDocument]) -> String {
    docs.iter()
        .map(|d| d.joined_text())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Render recognised text as a minimal standalone XHTML document.
///
/// The page declares its encoding, carries an empty title, and holds one
/// `<p>` per reflowed paragraph with all reserved characters escaped.
pub fn render_xhtml(text: &str) -> String {
    let body = paragraphs::split_paragraphs(text)
        .into_iter()
        .map(|p| markup::Element::new("p").text(p))
        .collect();
    markup::serialize_document(&markup::page_shell("", body))
}

/// Write `bytes` to `path` via a temp file in the same directory, creating
/// parent directories as needed.
///
/// The temp file is renamed into place only after a complete write; on any
/// failure it is removed automatically and the destination stays untouched.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ScanError> {
    let fail = |source: std::io::Error| ScanError::OutputWrite {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(fail)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(fail)?;
    tmp.write_all(bytes).map_err(fail)?;
    tmp.persist(path).map_err(|e| fail(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{ExtractionStats, PageText};

    fn doc(source: &str, text: &str) -> ExtractedDocument {
        ExtractedDocument {
            source: source.to_string(),
            pages: vec![PageText {
                page_num: 1,
                text: text.to_string(),
                error: None,
            }],
            stats: ExtractionStats::default(),
        }
    }

    #[test]
    fn join_documents_separates_with_blank_line() {
        let docs = [doc("a.pdf", "First."), doc("b.pdf", "Second.")];
        assert_eq!(join_documents(&docs), "First.\n\nSecond.");
    }

    #[test]
    fn join_documents_keeps_blank_segments() {
        let docs = [doc("a.pdf", "A"), doc("b.pdf", ""), doc("c.pdf", "C")];
        assert_eq!(join_documents(&docs), "A\n\n\n\nC");
    }

    #[test]
    fn render_xhtml_wraps_paragraphs() {
        let page = render_xhtml("one\ntwo\n\nthree & four");
        assert!(page.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(page.contains("<title></title>"));
        assert!(page.contains("<p>one two</p>"));
        assert!(page.contains("<p>three &amp; four</p>"));
    }

    #[test]
    fn render_xhtml_of_blank_text_has_empty_body() {
        let page = render_xhtml("  \n \n");
        assert!(!page.contains("<p>"));
    }

    #[test]
    fn write_atomic_creates_parents_and_leaves_no_staging() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deep/nested/out.txt");
        write_atomic(&path, b"hello").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello");

        let entries: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn write_atomic_reports_destination_path_on_failure() {
        // Writing below a file cannot succeed.
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        let err = write_atomic(&blocker.join("out.txt"), b"y").unwrap_err();
        match err {
            ScanError::OutputWrite { path, .. } => {
                assert!(path.ends_with("out.txt"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
