//! EPUB assembly and container writing.
//!
//! ## Why build the container by hand?
//!
//! An EPUB is a zip archive with three small XML documents (package manifest,
//! EPUB 3 nav, legacy NCX) plus one XHTML file per chapter. Writing those
//! directly keeps full control over the things this crate actually cares
//! about: chapter order, the skip rule for blank sources, and the guarantee
//! that no output file appears when there is nothing to compile.
//!
//! The produced container is EPUB 3 with an NCX alongside the nav document,
//! so both current and older readers can navigate it.

use std::collections::HashSet;
use std::io::{Seek, Write};
use std::path::Path;

use tracing::{info, warn};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::compile::markup::{escape_xml, page_shell, serialize_document, Element};
use crate::compile::paragraphs::split_paragraphs;
use crate::error::ScanError;
use crate::output::ExtractedDocument;

const MIMETYPE: &str = "application/epub+zip";

/// `dcterms:modified` is mandatory in EPUB 3. A fixed stamp keeps repeated
/// builds of the same book byte-identical.
const MODIFIED: &str = "2025-01-01T00:00:00Z";

const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

// ── Metadata ────────────────────────────────────────────────────────────────

/// Book-level metadata carried into the package document.
#[derive(Debug, Clone)]
pub struct BookMeta {
    pub title: String,
    /// BCP 47 language tag for `dc:language`.
    pub language: String,
    pub author: Option<String>,
    /// Package identifier. When absent a fresh `urn:uuid:` value is minted
    /// at assembly time.
    pub identifier: Option<String>,
}

impl BookMeta {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            language: "en".to_string(),
            author: None,
            identifier: None,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }
}

/// How chapter titles are derived during assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChapterTitlePolicy {
    /// Title each chapter after the stem of the source file it came from.
    #[default]
    SourceStem,
    /// Repeat the book title on every chapter.
    BookTitle,
}

// ── Chapters ────────────────────────────────────────────────────────────────

/// One spine entry: a title, an identifier, and the body markup.
///
/// The identifier doubles as the chapter's file stem and manifest id; it is
/// sanitised and de-duplicated when the chapter joins an [`EpubBook`], so the
/// value passed to [`Chapter::new`] is only a hint.
#[derive(Debug, Clone)]
pub struct Chapter {
    title: String,
    id: String,
    body: Vec<Element>,
}

impl Chapter {
    pub fn new(title: impl Into<String>, id_hint: impl Into<String>, body: Vec<Element>) -> Self {
        Self {
            title: title.into(),
            id: id_hint.into(),
            body,
        }
    }

    /// Build a chapter from raw recognised text, reflowing it into `<p>`
    /// paragraphs. Returns `None` when the text holds no paragraphs at all,
    /// which is the signal to skip the source document.
    pub fn from_text(title: impl Into<String>, id_hint: &str, text: &str) -> Option<Self> {
        let paragraphs = split_paragraphs(text);
        if paragraphs.is_empty() {
            return None;
        }
        let body = paragraphs
            .into_iter()
            .map(|p| Element::new("p").text(p))
            .collect();
        Some(Self::new(title, id_hint, body))
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// File name of this chapter inside the container, relative to `OEBPS/`.
    pub fn file_name(&self) -> String {
        format!("{}.xhtml", self.id)
    }
}

/// Force `hint` into a valid XML id / portable file stem: ASCII alphanumerics
/// plus `-` and `_`, starting with a letter or underscore.
fn sanitize_id(hint: &str) -> String {
    let mut id: String = hint
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if id.is_empty() {
        id.push_str("chapter");
    }
    if !id.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        id.insert(0, '_');
    }
    id
}

fn source_stem(source: &str) -> String {
    Path::new(source)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.to_string())
}

// ── Book ────────────────────────────────────────────────────────────────────

/// An assembled book, ready to be serialised as an EPUB container.
///
/// A book always holds at least one chapter; assembly fails with
/// [`ScanError::NoValidContent`] before any output exists otherwise.
#[derive(Debug, Clone)]
pub struct EpubBook {
    meta: BookMeta,
    identifier: String,
    chapters: Vec<Chapter>,
}

impl EpubBook {
    /// Assemble a book from extracted documents, one chapter per document,
    /// in the order given.
    ///
    /// Documents whose text is blank are skipped with a warning. When every
    /// document is blank there is nothing to compile and assembly fails.
    pub fn assemble(
        docs: &[ExtractedDocument],
        meta: BookMeta,
        titles: ChapterTitlePolicy,
    ) -> Result<Self, ScanError> {
        let mut chapters = Vec::new();
        for doc in docs {
            let stem = source_stem(&doc.source);
            let title = match titles {
                ChapterTitlePolicy::SourceStem => stem.clone(),
                ChapterTitlePolicy::BookTitle => meta.title.clone(),
            };
            match Chapter::from_text(title, &stem, &doc.joined_text()) {
                Some(chapter) => chapters.push(chapter),
                None => warn!("Skipping '{}': no recognised text to compile", doc.source),
            }
        }
        if chapters.is_empty() {
            return Err(ScanError::NoValidContent { total: docs.len() });
        }
        Self::new(meta, chapters)
    }

    /// Build a book from pre-constructed chapters.
    ///
    /// Chapter id hints are sanitised here and de-duplicated with numeric
    /// suffixes; `nav` and `ncx` are reserved for the fixed manifest entries.
    pub fn new(meta: BookMeta, mut chapters: Vec<Chapter>) -> Result<Self, ScanError> {
        if chapters.is_empty() {
            return Err(ScanError::NoValidContent { total: 0 });
        }

        let mut used: HashSet<String> =
            HashSet::from(["nav".to_string(), "ncx".to_string()]);
        for chapter in &mut chapters {
            let base = sanitize_id(&chapter.id);
            let mut id = base.clone();
            let mut n = 2;
            while !used.insert(id.clone()) {
                id = format!("{base}-{n}");
                n += 1;
            }
            chapter.id = id;
        }

        let identifier = meta
            .identifier
            .clone()
            .unwrap_or_else(|| format!("urn:uuid:{}", uuid::Uuid::new_v4()));

        Ok(Self {
            meta,
            identifier,
            chapters,
        })
    }

    pub fn meta(&self) -> &BookMeta {
        &self.meta
    }

    /// The resolved package identifier (`dc:identifier`).
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn chapter_count(&self) -> usize {
        self.chapters.len()
    }

    /// Table of contents as `(title, href)` pairs, one per chapter. The nav
    /// document itself never appears here.
    pub fn toc_entries(&self) -> Vec<(String, String)> {
        self.chapters
            .iter()
            .map(|c| (c.title.clone(), c.file_name()))
            .collect()
    }

    // ── Serialisation ───────────────────────────────────────────────────────

    /// Write the complete EPUB container to `writer`.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<(), ScanError> {
        let mut zip = ZipWriter::new(writer);
        let stored =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        let deflated =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        // The mimetype entry must be first and uncompressed or readers
        // reject the container.
        zip.start_file("mimetype", stored)?;
        zip.write_all(MIMETYPE.as_bytes()).map_err(zip_io)?;

        zip.start_file("META-INF/container.xml", deflated)?;
        zip.write_all(CONTAINER_XML.as_bytes()).map_err(zip_io)?;

        zip.start_file("OEBPS/content.opf", deflated)?;
        zip.write_all(self.package_document().as_bytes())
            .map_err(zip_io)?;

        zip.start_file("OEBPS/toc.ncx", deflated)?;
        zip.write_all(self.ncx_document().as_bytes()).map_err(zip_io)?;

        zip.start_file("OEBPS/nav.xhtml", deflated)?;
        zip.write_all(self.nav_document().as_bytes()).map_err(zip_io)?;

        for chapter in &self.chapters {
            zip.start_file(format!("OEBPS/{}", chapter.file_name()), deflated)?;
            zip.write_all(chapter_document(chapter).as_bytes())
                .map_err(zip_io)?;
        }

        zip.finish()?;
        Ok(())
    }

    /// Write the EPUB to `path`, creating parent directories as needed.
    ///
    /// The container is staged in memory and lands on disk atomically, so a
    /// failed write never leaves a truncated book behind.
    pub fn write_file(&self, path: &Path) -> Result<(), ScanError> {
        let mut buf = Vec::new();
        self.write_to(std::io::Cursor::new(&mut buf))?;
        super::write_atomic(path, &buf)?;
        info!(
            "Wrote EPUB ({} chapters) to '{}'",
            self.chapter_count(),
            path.display()
        );
        Ok(())
    }

    /// `content.opf`: metadata, manifest, and spine. The nav document is the
    /// first spine entry so readers open on the table of contents.
    fn package_document(&self) -> String {
        let mut opf = String::with_capacity(1024);
        opf.push_str(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="BookId">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
"#,
        );
        opf.push_str(&format!(
            "    <dc:identifier id=\"BookId\">{}</dc:identifier>\n",
            escape_xml(&self.identifier)
        ));
        opf.push_str(&format!(
            "    <dc:title>{}</dc:title>\n",
            escape_xml(&self.meta.title)
        ));
        opf.push_str(&format!(
            "    <dc:language>{}</dc:language>\n",
            escape_xml(&self.meta.language)
        ));
        if let Some(author) = &self.meta.author {
            opf.push_str(&format!(
                "    <dc:creator>{}</dc:creator>\n",
                escape_xml(author)
            ));
        }
        opf.push_str(&format!(
            "    <meta property=\"dcterms:modified\">{MODIFIED}</meta>\n"
        ));
        opf.push_str("  </metadata>\n  <manifest>\n");
        opf.push_str(
            "    <item id=\"ncx\" href=\"toc.ncx\" media-type=\"application/x-dtbncx+xml\"/>\n",
        );
        opf.push_str(
            "    <item id=\"nav\" href=\"nav.xhtml\" media-type=\"application/xhtml+xml\" properties=\"nav\"/>\n",
        );
        // Chapter ids are sanitised to [A-Za-z0-9_-]; safe to splice as-is.
        for chapter in &self.chapters {
            opf.push_str(&format!(
                "    <item id=\"{}\" href=\"{}\" media-type=\"application/xhtml+xml\"/>\n",
                chapter.id,
                chapter.file_name()
            ));
        }
        opf.push_str("  </manifest>\n  <spine toc=\"ncx\">\n    <itemref idref=\"nav\"/>\n");
        for chapter in &self.chapters {
            opf.push_str(&format!("    <itemref idref=\"{}\"/>\n", chapter.id));
        }
        opf.push_str("  </spine>\n</package>\n");
        opf
    }

    /// `toc.ncx`: the legacy navigation map, one flat navPoint per chapter.
    fn ncx_document(&self) -> String {
        let mut ncx = String::with_capacity(1024);
        ncx.push_str(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE ncx PUBLIC "-//NISO//DTD ncx 2005-1//EN" "http://www.daisy.org/z3986/2005/ncx-2005-1.dtd">
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head>
"#,
        );
        ncx.push_str(&format!(
            "    <meta name=\"dtb:uid\" content=\"{}\"/>\n",
            escape_xml(&self.identifier)
        ));
        ncx.push_str(
            r#"    <meta name="dtb:depth" content="1"/>
    <meta name="dtb:totalPageCount" content="0"/>
    <meta name="dtb:maxPageNumber" content="0"/>
  </head>
  <docTitle>
"#,
        );
        ncx.push_str(&format!(
            "    <text>{}</text>\n",
            escape_xml(&self.meta.title)
        ));
        ncx.push_str("  </docTitle>\n  <navMap>\n");
        for (index, chapter) in self.chapters.iter().enumerate() {
            let order = index + 1;
            ncx.push_str(&format!(
                "    <navPoint id=\"navpoint-{order}\" playOrder=\"{order}\">\n"
            ));
            ncx.push_str(&format!(
                "      <navLabel>\n        <text>{}</text>\n      </navLabel>\n",
                escape_xml(&chapter.title)
            ));
            ncx.push_str(&format!(
                "      <content src=\"{}\"/>\n",
                chapter.file_name()
            ));
            ncx.push_str("    </navPoint>\n");
        }
        ncx.push_str("  </navMap>\n</ncx>\n");
        ncx
    }

    /// `nav.xhtml`: the EPUB 3 navigation document.
    fn nav_document(&self) -> String {
        let mut list = Element::new("ol");
        for chapter in &self.chapters {
            list.push(
                Element::new("li").child(
                    Element::new("a")
                        .attr("href", chapter.file_name())
                        .text(&chapter.title),
                ),
            );
        }
        let nav = Element::new("nav")
            .attr("epub:type", "toc")
            .attr("id", "toc")
            .child(Element::new("h1").text(&self.meta.title))
            .child(list);
        serialize_document(&page_shell(&self.meta.title, vec![nav]))
    }
}

fn chapter_document(chapter: &Chapter) -> String {
    serialize_document(&page_shell(&chapter.title, chapter.body.clone()))
}

fn zip_io(e: std::io::Error) -> ScanError {
    ScanError::EpubContainer(e.into())
}
