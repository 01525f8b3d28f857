//! CLI binary for scan2book.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig`, drives batch runs over a source folder, and writes
//! the requested artifact.

use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use scan2book::{
    collect_pdfs, extract, join_documents, render_xhtml, write_atomic, BookMeta,
    ChapterTitlePolicy, EpubBook, ExtractedDocument, ExtractionConfig, ExtractionObserver,
    ObserverHandle, TesseractEngine,
};

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress observer using indicatif ────────────────────────────────────

/// Terminal progress observer: a live bar plus one log line per page.
///
/// A batch run recognises several documents back to back with the same
/// observer, so the bar is resized on every `on_document_start` and reset
/// (not finished) when a document completes; [`CliProgressObserver::finish`]
/// clears it once the whole run is done.
struct CliProgressObserver {
    /// The single progress bar anchored at the bottom of the terminal.
    bar: ProgressBar,
    /// Per-page wall-clock start times for elapsed reporting.
    start_times: Mutex<HashMap<usize, Instant>>,
    /// Count of pages that failed recognition, across all documents.
    errors: AtomicUsize,
}

impl CliProgressObserver {
    /// Create an observer whose bar length is set dynamically by
    /// `on_document_start` (called before any page is recognised).
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_document_start

        // Initial style: spinner only (no counter until we know the total).
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening input…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            errors: AtomicUsize::new(0),
        })
    }

    /// Switch to the full progress-bar style once `total` is known.
    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Recognising");
        self.bar.reset_eta();
    }

    /// Print a line above the live bar.
    fn println(&self, msg: String) {
        self.bar.println(msg);
    }

    fn pages_failed(&self) -> usize {
        self.errors.load(Ordering::SeqCst)
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ExtractionObserver for CliProgressObserver {
    fn on_document_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
    }

    fn on_page_start(&self, page_num: usize, _total_pages: usize) {
        self.start_times
            .lock()
            .unwrap()
            .insert(page_num, Instant::now());
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total_pages: usize, text: &str) {
        let elapsed_ms = self
            .start_times
            .lock()
            .unwrap()
            .remove(&page_num)
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0);

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<12}  {}",
            green("✓"),
            page_num,
            total_pages,
            dim(&format!("{:>6} chars", text.chars().count())),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        let elapsed_ms = self
            .start_times
            .lock()
            .unwrap()
            .remove(&page_num)
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0);

        self.errors.fetch_add(1, Ordering::SeqCst);

        // Truncate very long error messages to keep output tidy.
        let msg: String = if error.chars().count() > 80 {
            error.chars().take(79).chain(std::iter::once('\u{2026}')).collect()
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            red("✗"),
            page_num,
            total_pages,
            red(&msg),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
        self.bar.inc(1);
    }

    fn on_document_complete(&self, _total_pages: usize, _success_count: usize) {
        // The next document in the batch reuses the bar.
        self.bar.reset();
        self.bar.set_prefix("Preparing");
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Recognise a single scan to stdout (English)
  scan2book text scan.pdf

  # Bengali/English book split into page-range PDFs, one text file
  scan2book text scans/ --language ben+eng -o book.txt

  # One standalone XHTML page per source PDF
  scan2book xhtml scans/ --language ben+eng --skip-existing

  # Bind the whole folder into an EPUB
  scan2book epub scans/ "আমার বই" "Author Name" --language ben+eng

  # Machine-readable per-page output
  scan2book text scan.pdf --json > scan.json

RECOGNITION LANGUAGES:
  --language takes any Tesseract language pack id, or a composite joined
  with '+':
      eng        English (default)
      ben        Bengali
      ben+eng    both scripts on the same page
  Every named pack must exist as <tessdata>/<lang>.traineddata; composites
  fail up front when one is missing.

SOURCE FILE ORDERING:
  Folder inputs are ordered by the page range in each file name:
      book-3.pdf   book-4-7.pdf   book-8-11.pdf
  sort as 3, 4-7, 8-11. Names carrying no trailing number sort after all
  numbered ones, in name order.

ENVIRONMENT VARIABLES:
  SCAN2BOOK_LANGUAGE     Default for --language
  SCAN2BOOK_TESSDATA     Default for --tessdata
  TESSDATA_PREFIX        Standard Tesseract fallback when --tessdata is unset
  PDFIUM_LIB_PATH        Path to an existing pdfium shared library
  RUST_LOG               Log filtering (tracing EnvFilter syntax)

SETUP:
  1. Install Tesseract and packs:  apt install tesseract-ocr tesseract-ocr-ben
  2. Provide pdfium:               system package, or PDFIUM_LIB_PATH=/path/to/libpdfium.so
  3. Recognise:                    scan2book text scans/ --language ben+eng -o book.txt
"#;

/// Turn scanned PDFs and images into text, XHTML, or EPUB books.
#[derive(Parser, Debug)]
#[command(
    name = "scan2book",
    version,
    about = "Turn scanned PDFs and images into text, XHTML, or EPUB books with Tesseract OCR",
    long_about = "Recognise scanned, image-only PDFs (or plain images) with Tesseract and compile \
the text into reading-order artifacts: concatenated plain text, one standalone XHTML page per \
source, or a chaptered EPUB. Folder inputs are ordered by the page range in each file name.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Tesseract language pack id; composites like ben+eng pass through.
    #[arg(long, global = true, env = "SCAN2BOOK_LANGUAGE", default_value = "eng")]
    language: String,

    /// Directory holding .traineddata packs (default: Tesseract's own search).
    #[arg(long, global = true, env = "SCAN2BOOK_TESSDATA")]
    tessdata: Option<PathBuf>,

    /// Cap on the longest rendered page edge, in pixels (256–8192).
    #[arg(long, global = true, env = "SCAN2BOOK_MAX_PIXELS", default_value_t = 4000,
          value_parser = clap::value_parser!(u32).range(256..=8192))]
    max_pixels: u32,

    /// PDF user password for encrypted documents.
    #[arg(long, global = true, env = "SCAN2BOOK_PASSWORD")]
    password: Option<String>,

    /// Disable the progress bar.
    #[arg(long, global = true, env = "SCAN2BOOK_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "SCAN2BOOK_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "SCAN2BOOK_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Recognise one file, or a whole folder, and emit plain text.
    Text {
        /// A PDF or image file, or a folder of scanned PDFs.
        input: String,

        /// Write text to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Emit the structured per-page results as JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Recognise every PDF in a folder into standalone XHTML pages.
    Xhtml {
        /// Folder of scanned PDFs.
        folder: PathBuf,

        /// Output directory (default: <FOLDER>/xhtml_output).
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Skip sources whose XHTML output already exists.
        #[arg(long)]
        skip_existing: bool,
    },

    /// Recognise every PDF in a folder and bind them into one EPUB.
    Epub {
        /// Folder of scanned PDFs; one chapter per file, in page order.
        folder: PathBuf,

        /// Book title (also names the output file).
        title: Option<String>,

        /// Book author.
        author: Option<String>,

        /// Write the EPUB here instead of <TITLE>.epub / book.epub.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Chapter titling: source file stem, or the book title on every chapter.
        #[arg(long, value_enum, default_value = "stem")]
        chapter_titles: ChapterTitlesArg,

        /// BCP 47 tag for the book's dc:language metadata.
        #[arg(long, default_value = "en")]
        language_tag: String,

        /// Explicit dc:identifier (default: a fresh urn:uuid).
        #[arg(long)]
        identifier: Option<String>,
    },
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum ChapterTitlesArg {
    Stem,
    Book,
}

impl From<ChapterTitlesArg> for ChapterTitlePolicy {
    fn from(v: ChapterTitlesArg) -> Self {
        match v {
            ChapterTitlesArg::Stem => ChapterTitlePolicy::SourceStem,
            ChapterTitlesArg::Book => ChapterTitlePolicy::BookTitle,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active; the
    // bar provides all the feedback that matters to the user.
    let json_mode = matches!(cli.command, Command::Text { json: true, .. });
    let show_progress = !cli.quiet && !cli.no_progress && !json_mode;
    let filter = if cli.quiet || show_progress {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    // In verbose mode we always want all logs regardless of progress.
    let filter = if cli.verbose { "debug" } else { filter };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Observer + config ────────────────────────────────────────────────
    let progress = if show_progress {
        Some(CliProgressObserver::new_dynamic())
    } else {
        None
    };
    let observer = progress
        .clone()
        .map(|p| p as Arc<dyn ExtractionObserver>);
    let config = build_config(&cli, observer)?;

    let outcome = match &cli.command {
        Command::Text {
            input,
            output,
            json,
        } => run_text(input, output.as_deref(), *json, &cli, &config, progress.as_deref()),
        Command::Xhtml {
            folder,
            output_dir,
            skip_existing,
        } => run_xhtml(
            folder,
            output_dir.as_deref(),
            *skip_existing,
            &cli,
            &config,
            progress.as_deref(),
        ),
        Command::Epub {
            folder,
            title,
            author,
            output,
            chapter_titles,
            language_tag,
            identifier,
        } => {
            let mut meta = BookMeta::new(title.as_deref().unwrap_or("Untitled"))
                .with_language(language_tag.as_str());
            if let Some(author) = author {
                meta = meta.with_author(author.as_str());
            }
            if let Some(identifier) = identifier {
                meta = meta.with_identifier(identifier.as_str());
            }
            let out = output
                .clone()
                .unwrap_or_else(|| PathBuf::from(default_epub_name(title.as_deref())));
            run_epub(
                folder,
                meta,
                chapter_titles.clone().into(),
                &out,
                &cli,
                &config,
                progress.as_deref(),
            )
        }
    };

    if let Some(ref p) = progress {
        p.finish();
    }
    outcome
}

/// Map CLI args to `ExtractionConfig`, constructing the shared OCR engine
/// eagerly so that a missing language pack fails before any PDF is touched.
fn build_config(cli: &Cli, observer: Option<ObserverHandle>) -> Result<ExtractionConfig> {
    let engine = TesseractEngine::new(&cli.language, cli.tessdata.as_deref())?;

    let mut builder = ExtractionConfig::builder()
        .language(cli.language.as_str())
        .max_rendered_pixels(cli.max_pixels)
        .engine(Arc::new(engine));

    if let Some(ref dir) = cli.tessdata {
        builder = builder.tessdata_dir(dir.as_path());
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.as_str());
    }
    if let Some(observer) = observer {
        builder = builder.observer(observer);
    }

    builder.build().context("Invalid configuration")
}

/// Derive the default EPUB file name from the book title.
fn default_epub_name(title: Option<&str>) -> String {
    match title {
        Some(t) if !t.trim().is_empty() => {
            let joined = t.split_whitespace().collect::<Vec<_>>().join("_");
            format!("{joined}.epub")
        }
        _ => "book.epub".to_string(),
    }
}

/// Extract every PDF in `folder` in page order, logging and skipping files
/// that fail. Errors out when the folder holds no PDFs or every file failed.
fn extract_folder(
    folder: &Path,
    config: &ExtractionConfig,
    progress: Option<&CliProgressObserver>,
) -> Result<(Vec<ExtractedDocument>, usize)> {
    let pdfs = collect_pdfs(folder)?;
    if pdfs.is_empty() {
        anyhow::bail!("No .pdf files found in '{}'", folder.display());
    }

    let mut docs = Vec::new();
    let mut failed = 0usize;
    for pdf in &pdfs {
        announce_file(progress, pdf);
        match extract(pdf.to_string_lossy(), config) {
            Ok(doc) => docs.push(doc),
            Err(e) => {
                failed += 1;
                report_file_error(progress, pdf, &e);
            }
        }
    }

    if docs.is_empty() {
        anyhow::bail!("All {failed} source files in '{}' failed", folder.display());
    }
    Ok((docs, failed))
}

fn announce_file(progress: Option<&CliProgressObserver>, pdf: &Path) {
    let name = pdf
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| pdf.display().to_string());
    match progress {
        Some(p) => p.println(format!("{} {}", cyan("▶"), bold(&name))),
        None => info!("Processing '{}'", pdf.display()),
    }
}

fn report_file_error(progress: Option<&CliProgressObserver>, pdf: &Path, e: &scan2book::ScanError) {
    match progress {
        Some(p) => p.println(format!("  {} {}", red("✗"), red(&e.to_string()))),
        None => error!("Failed to process '{}': {e}", pdf.display()),
    }
}

// ── Subcommand runners ───────────────────────────────────────────────────────

fn run_text(
    input: &str,
    output: Option<&Path>,
    json: bool,
    cli: &Cli,
    config: &ExtractionConfig,
    progress: Option<&CliProgressObserver>,
) -> Result<()> {
    let path = Path::new(input);
    let folder_mode = path.is_dir();
    let (docs, _failed) = if folder_mode {
        extract_folder(path, config, progress)?
    } else {
        (vec![extract(input, config)?], 0)
    };

    // JSON shape follows the input: one object for a file, an array for a
    // folder (even a folder holding a single PDF).
    let rendered = if json {
        if folder_mode {
            serde_json::to_string_pretty(&docs).context("Failed to serialise output")?
        } else {
            serde_json::to_string_pretty(&docs[0]).context("Failed to serialise output")?
        }
    } else {
        join_documents(&docs)
    };

    match output {
        Some(path) => {
            write_atomic(path, rendered.as_bytes())?;
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(rendered.as_bytes())
                .context("Failed to write to stdout")?;
            // Ensure a trailing newline on stdout.
            if !rendered.ends_with('\n') {
                handle.write_all(b"\n").ok();
            }
        }
    }

    if !cli.quiet {
        let total: usize = docs.iter().map(|d| d.stats.total_pages).sum();
        let recognised: usize = docs.iter().map(|d| d.stats.recognised_pages).sum();
        let ms: u64 = docs.iter().map(|d| d.stats.total_duration_ms).sum();
        let dest = output
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "stdout".to_string());
        eprintln!(
            "{}  {}/{} pages  {}ms  →  {}",
            if recognised == total { green("✔") } else { cyan("⚠") },
            recognised,
            total,
            ms,
            bold(&dest),
        );
    }
    Ok(())
}

fn run_xhtml(
    folder: &Path,
    output_dir: Option<&Path>,
    skip_existing: bool,
    cli: &Cli,
    config: &ExtractionConfig,
    progress: Option<&CliProgressObserver>,
) -> Result<()> {
    let out_dir = output_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| folder.join("xhtml_output"));

    let pdfs = collect_pdfs(folder)?;
    if pdfs.is_empty() {
        anyhow::bail!("No .pdf files found in '{}'", folder.display());
    }

    let mut written = 0usize;
    let mut skipped = 0usize;
    let mut failed = 0usize;
    for pdf in &pdfs {
        let mut out = out_dir.join(pdf.file_name().unwrap_or_default());
        out.set_extension("xhtml");

        if skip_existing && out.exists() {
            skipped += 1;
            info!("Skipping '{}': output already exists", pdf.display());
            continue;
        }

        announce_file(progress, pdf);
        match extract(pdf.to_string_lossy(), config) {
            Ok(doc) => {
                let page = render_xhtml(&doc.joined_text());
                write_atomic(&out, page.as_bytes())
                    .with_context(|| format!("Failed to write '{}'", out.display()))?;
                written += 1;
                match progress {
                    Some(p) => p.println(format!("  {} {}", green("✓"), dim(&out.display().to_string()))),
                    None => info!("XHTML file created: '{}'", out.display()),
                }
            }
            Err(e) => {
                failed += 1;
                report_file_error(progress, pdf, &e);
            }
        }
    }

    if written == 0 && skipped == 0 {
        anyhow::bail!("All {failed} source files in '{}' failed", folder.display());
    }

    if !cli.quiet {
        eprintln!(
            "{}  {} XHTML file(s)  →  {}  {}",
            if failed == 0 { green("✔") } else { cyan("⚠") },
            written,
            bold(&out_dir.display().to_string()),
            dim(&format!("({skipped} skipped, {failed} failed)")),
        );
    }
    Ok(())
}

fn run_epub(
    folder: &Path,
    meta: BookMeta,
    titles: ChapterTitlePolicy,
    out: &Path,
    cli: &Cli,
    config: &ExtractionConfig,
    progress: Option<&CliProgressObserver>,
) -> Result<()> {
    let (docs, failed) = extract_folder(folder, config, progress)?;

    let book = EpubBook::assemble(&docs, meta, titles)?;
    book.write_file(out)?;

    if !cli.quiet {
        let pages_failed = progress.map(CliProgressObserver::pages_failed).unwrap_or(0);
        eprintln!(
            "{}  {} chapter(s)  →  {}  {}",
            if failed == 0 && pages_failed == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            book.chapter_count(),
            bold(&out.display().to_string()),
            dim(&format!("({failed} file(s) failed, {pages_failed} page(s) failed)")),
        );
    }
    Ok(())
}
