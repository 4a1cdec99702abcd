//! CLI binary for mcq-extract.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ParseConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use mcq_extract::{
    extract_text_from_path, parse_questions_from_annotated, ExtractionProgressCallback,
    PageSelection, PageStrategy, ParseConfig, ParsedQuestion, ProgressCallback,
    TextEncoding,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar plus one log line per page.
struct CliProgressCallback {
    bar: ProgressBar,
    page_started: std::sync::Mutex<Option<Instant>>,
    ocr_pages: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            page_started: std::sync::Mutex::new(None),
            ocr_pages: AtomicUsize::new(0),
        })
    }

    fn elapsed_secs(&self) -> f64 {
        self.page_started
            .lock()
            .ok()
            .and_then(|mut started| started.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_extraction_start(&self, total_pages: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ");
        self.bar.set_length(total_pages as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Extracting");
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Reading {total_pages} pages…"))
        ));
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        if let Ok(mut started) = self.page_started.lock() {
            *started = Some(Instant::now());
        }
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(
        &self,
        page_num: usize,
        total: usize,
        strategy: PageStrategy,
        chars: usize,
    ) {
        if strategy == PageStrategy::Ocr {
            self.ocr_pages.fetch_add(1, Ordering::SeqCst);
        }
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<7}  {}  {}",
            green("✓"),
            page_num,
            total,
            strategy,
            dim(&format!("{chars:>5} chars")),
            dim(&format!("{:.1}s", self.elapsed_secs())),
        ));
        self.bar.inc(1);
    }

    fn on_extraction_complete(&self, total_pages: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} pages read ({} via OCR)",
            green("✔"),
            bold(&total_pages.to_string()),
            self.ocr_pages.load(Ordering::SeqCst)
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Questions from a digital or scanned PDF, human-readable
  mcq-extract exam.pdf

  # JSON to a file
  mcq-extract exam.pdf -o questions.json

  # Photo of an exam sheet, English OCR model
  mcq-extract --lang eng photo.jpg --json

  # Only accept question numbers printed in red
  mcq-extract --require-red answer-key.pdf

  # Inspect the extracted text, with [[RED]]…[[/RED]] markers
  mcq-extract --text-only --pages 2-3 exam.pdf

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH   Path to an existing libpdfium shared library
  RUST_LOG          Override the log filter (e.g. mcq_extract=debug)
"#;

/// Extract multiple-choice questions from PDFs, images and text files.
#[derive(Parser, Debug)]
#[command(
    name = "mcq-extract",
    version,
    about = "Extract multiple-choice questions from PDFs, images and text files",
    long_about = "Extract numbered multiple-choice questions (A)–D) options) from digital PDFs, \
scanned PDFs, images and plain text. Digital pages use the PDF text layer; pages with too \
little text and standalone images go through tesseract OCR. Words printed in red are tracked \
so answer keys can be recovered.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Input file: .pdf, .png/.jpg/.jpeg/.bmp/.tif/.tiff/.webp, or .txt/.md/.csv.
    input: PathBuf,

    /// Write to this file instead of stdout: JSON questions, or the
    /// extracted text with --text-only.
    #[arg(short, long, env = "MCQ_OUTPUT")]
    output: Option<PathBuf>,

    /// Print questions as JSON (implied by --output).
    #[arg(long, env = "MCQ_JSON")]
    json: bool,

    /// Print the extracted text instead of parsing questions.
    #[arg(long)]
    text_only: bool,

    /// Tesseract language model(s), `+`-joined.
    #[arg(long, env = "MCQ_OCR_LANG", default_value = "spa+eng")]
    lang: String,

    /// OCR rasterisation DPI for scanned PDF pages (72–1200).
    #[arg(long, env = "MCQ_OCR_DPI", default_value_t = 300,
          value_parser = clap::value_parser!(u32).range(72..=1200))]
    dpi: u32,

    /// Native text length below which a PDF page is OCR'd.
    #[arg(long, env = "MCQ_MIN_DIGITAL_CHARS", default_value_t = 35)]
    min_digital_chars: usize,

    /// Minimum question text length in characters.
    #[arg(long, env = "MCQ_MIN_QUESTION_CHARS", default_value_t = 5)]
    min_question_chars: usize,

    /// Keep runs of blank lines instead of collapsing them.
    #[arg(long, env = "MCQ_KEEP_BLANK_LINES")]
    keep_blank_lines: bool,

    /// Only accept question numbers printed in red (when any are).
    #[arg(long, env = "MCQ_REQUIRE_RED")]
    require_red: bool,

    /// Page selection: all, 5, 3-15, or 1,3,5,7.
    #[arg(long, env = "MCQ_PAGES", default_value = "all")]
    pages: String,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "MCQ_PASSWORD")]
    password: Option<String>,

    /// Encodings tried for text files, in order.
    #[arg(long, env = "MCQ_ENCODINGS", default_value = "utf-8,utf-8-sig,latin-1")]
    encodings: String,

    /// Path to the tesseract binary.
    #[arg(long, env = "MCQ_TESSERACT", default_value = "tesseract")]
    tesseract: String,

    /// Kill a tesseract run after this many seconds.
    #[arg(long, env = "MCQ_OCR_TIMEOUT")]
    ocr_timeout: Option<u64>,

    /// Disable progress bar.
    #[arg(long, env = "MCQ_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "MCQ_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "MCQ_QUIET")]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let is_pdf = cli
        .input
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    let show_progress = is_pdf && !cli.quiet && !cli.no_progress && !cli.verbose;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ExtractionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Extract ──────────────────────────────────────────────────────────
    let started = Instant::now();
    let text = extract_text_from_path(&cli.input, &config)
        .with_context(|| format!("Failed to extract text from {}", cli.input.display()))?;

    if cli.text_only {
        let rendered = format!("{text}\n");
        return emit(cli.output.as_deref(), rendered.as_bytes());
    }

    // ── Parse ────────────────────────────────────────────────────────────
    let questions = parse_questions_from_annotated(&text, &config);

    if cli.json || cli.output.is_some() {
        let json =
            serde_json::to_string_pretty(&questions).context("Failed to serialise output")?;
        emit(cli.output.as_deref(), format!("{json}\n").as_bytes())?;
    } else {
        emit(None, render_listing(&questions).as_bytes())?;
    }

    if !cli.quiet {
        let answered = questions.iter().filter(|q| q.correct_option.is_some()).count();
        eprintln!(
            "{}  {} questions ({} with answer)  {}ms{}",
            green("✔"),
            bold(&questions.len().to_string()),
            answered,
            started.elapsed().as_millis(),
            cli.output
                .as_ref()
                .map(|p| format!("  →  {}", bold(&p.display().to_string())))
                .unwrap_or_default(),
        );
    }
    Ok(())
}

/// Map CLI args to `ParseConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ParseConfig> {
    let encodings = cli
        .encodings
        .split(',')
        .filter(|e| !e.trim().is_empty())
        .map(|e| e.parse::<TextEncoding>())
        .collect::<Result<Vec<_>, _>>()
        .context("Invalid --encodings")?;

    let mut builder = ParseConfig::builder()
        .ocr_lang(&cli.lang)
        .ocr_dpi(cli.dpi)
        .min_digital_chars(cli.min_digital_chars)
        .min_question_chars(cli.min_question_chars)
        .collapse_blank_lines(!cli.keep_blank_lines)
        .require_red_question_number(cli.require_red)
        .pages(parse_pages(&cli.pages)?)
        .text_encodings(encodings)
        .tesseract_path(&cli.tesseract);

    if let Some(pwd) = &cli.password {
        builder = builder.password(pwd);
    }
    if let Some(secs) = cli.ocr_timeout {
        builder = builder.ocr_timeout_secs(secs);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Parse `--pages` string into `PageSelection`.
fn parse_pages(s: &str) -> Result<PageSelection> {
    let s = s.trim().to_lowercase();

    if s == "all" {
        return Ok(PageSelection::All);
    }

    // Range: "3-15"
    if let Some((start, end)) = s.split_once('-') {
        let start: usize = start
            .trim()
            .parse()
            .context("Invalid start page in range")?;
        let end: usize = end.trim().parse().context("Invalid end page in range")?;
        if start < 1 {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {start})");
        }
        if start > end {
            anyhow::bail!("Invalid page range '{start}-{end}': start must be <= end");
        }
        return Ok(PageSelection::Range(start, end));
    }

    // Set: "1,3,5,7"
    if s.contains(',') {
        let pages: Vec<usize> = s
            .split(',')
            .map(|p| {
                p.trim()
                    .parse::<usize>()
                    .with_context(|| format!("Invalid page number: '{}'", p.trim()))
            })
            .collect::<Result<Vec<_>>>()?;
        if let Some(&p) = pages.iter().find(|&&p| p < 1) {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {p})");
        }
        return Ok(PageSelection::Set(pages));
    }

    // Single page: "5"
    let page: usize = s.parse().context("Invalid page number")?;
    if page < 1 {
        anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {page})");
    }
    Ok(PageSelection::Single(page))
}

/// Human-readable listing; the correct option, when known, is ticked.
fn render_listing(questions: &[ParsedQuestion]) -> String {
    let mut out = String::new();
    for (i, q) in questions.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, q.question));
        for (j, opt) in q.options.iter().enumerate() {
            let tick = if q.correct_option == Some(j) { "✓" } else { " " };
            out.push_str(&format!("   {tick} {opt}\n"));
        }
        out.push('\n');
    }
    out
}

/// Write to `path` atomically (temp file + rename), or to stdout.
fn emit(path: Option<&Path>, bytes: &[u8]) -> Result<()> {
    let Some(path) = path else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        return handle
            .write_all(bytes)
            .context("Failed to write to stdout");
    };

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    tmp.write_all(bytes).context("Failed to write output")?;
    tmp.persist(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
