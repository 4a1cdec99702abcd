//! Public entry points.
//!
//! [`parse_questions_from_file`] is the one-call API: it materialises the
//! input, dispatches on the extension, extracts annotated text and parses it.
//! The extraction and parsing halves are exposed separately so callers can
//! inspect the intermediate text (`--text-only` in the CLI) or feed text from
//! elsewhere.

use crate::annotated::AnnotatedText;
use crate::config::ParseConfig;
use crate::error::McqError;
use crate::output::ParsedQuestion;
use crate::pipeline::block::parse_block;
use crate::pipeline::format::DocumentFormat;
use crate::pipeline::input::{materialize, FileSource};
use crate::pipeline::normalize::normalize;
use crate::pipeline::ocr::ocr_image;
use crate::pipeline::plain::read_plain_text;
use crate::pipeline::pdf::extract_pdf;
use crate::pipeline::resplit::resplit;
use crate::pipeline::segment::segment;
use image::ImageError;
use std::borrow::Cow;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Extract every multiple-choice question from a PDF, image or text file.
///
/// `source` is a path or an upload (see [`FileSource`]). Uploads are copied
/// to a temp file that is removed before this function returns, whether it
/// succeeds or fails. `config = None` uses [`ParseConfig::default()`].
///
/// # Errors
/// Only for inputs that cannot be processed at all: missing file, unknown
/// extension, PDF/OCR failure, undecodable text. Blocks that do not parse
/// are dropped silently.
///
/// # Example
/// ```rust,no_run
/// use mcq_extract::parse_questions_from_file;
///
/// let questions = parse_questions_from_file("exam.pdf", None)?;
/// for q in &questions {
///     println!("{} -> {:?}", q.question, q.correct_answer());
/// }
/// # Ok::<(), mcq_extract::McqError>(())
/// ```
pub fn parse_questions_from_file<'a>(
    source: impl Into<FileSource<'a>>,
    config: Option<&ParseConfig>,
) -> Result<Vec<ParsedQuestion>, McqError> {
    let started = Instant::now();
    let config = resolve_config(config);
    let source = source.into();
    info!("Starting extraction: {source:?}");

    // ── Step 1: Local file (temp copy lives until the end of this scope) ──
    let local = materialize(&source)?;

    // ── Step 2: Text ──────────────────────────────────────────────────────
    let text = extract_text_from_path(local.path(), &config)?;

    // ── Step 3: Questions ─────────────────────────────────────────────────
    let questions = parse_questions_from_annotated(&text, &config);
    info!(
        "Extracted {} questions in {}ms",
        questions.len(),
        started.elapsed().as_millis()
    );
    Ok(questions)
}

/// Extract annotated text from a local file, picking the strategy by extension.
pub fn extract_text_from_path(
    path: &Path,
    config: &ParseConfig,
) -> Result<AnnotatedText, McqError> {
    match DocumentFormat::from_path(path)? {
        DocumentFormat::Pdf => extract_text_from_pdf(path, config),
        DocumentFormat::Image => extract_text_from_image(path, config),
        DocumentFormat::PlainText => extract_text_from_plain_text_file(path, config),
    }
}

/// Text of a PDF, page by page, from the text layer or OCR.
///
/// The result's `Display` form carries `[[RED]]…[[/RED]]` markers around
/// words rendered in red.
pub fn extract_text_from_pdf(
    path: &Path,
    config: &ParseConfig,
) -> Result<AnnotatedText, McqError> {
    if !path.exists() {
        return Err(McqError::NotFound {
            path: path.to_path_buf(),
        });
    }
    extract_pdf(path, config)
}

/// OCR text of an image, with red words tagged from pixel colour.
pub fn extract_text_from_image(
    path: &Path,
    config: &ParseConfig,
) -> Result<AnnotatedText, McqError> {
    let image = image::open(path).map_err(|e| match e {
        ImageError::IoError(io) if io.kind() == ErrorKind::NotFound => McqError::NotFound {
            path: path.to_path_buf(),
        },
        other => McqError::extraction(format!(
            "cannot decode image '{}': {other}",
            path.display()
        )),
    })?;
    debug!(
        "Loaded image {} ({}x{})",
        path.display(),
        image.width(),
        image.height()
    );
    let text = ocr_image(&image, None, config)?;
    Ok(normalize(&text, config.collapse_blank_lines))
}

/// Decoded text of a plain-text file. Never carries red spans.
pub fn extract_text_from_plain_text_file(
    path: &Path,
    config: &ParseConfig,
) -> Result<AnnotatedText, McqError> {
    read_plain_text(path, config)
}

/// Parse questions from text.
///
/// `text` may be plain or carry `[[RED]]…[[/RED]]` markers (as rendered by
/// the `extract_text_from_*` functions); markers become colour provenance
/// and never appear in the output. Pure: the same input and configuration
/// always give the same result.
pub fn parse_questions_from_text(text: &str, config: Option<&ParseConfig>) -> Vec<ParsedQuestion> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    let config = resolve_config(config);
    parse_questions_from_annotated(&AnnotatedText::from_marked(text), &config)
}

/// Parse questions from already-annotated text.
pub fn parse_questions_from_annotated(
    text: &AnnotatedText,
    config: &ParseConfig,
) -> Vec<ParsedQuestion> {
    if text.is_blank() {
        return Vec::new();
    }
    let prepared = resplit(&normalize(text, config.collapse_blank_lines));
    let blocks = segment(&prepared, config.require_red_question_number);
    let total = blocks.len();

    let questions: Vec<ParsedQuestion> = blocks
        .iter()
        .filter_map(|b| parse_block(b, config.min_question_chars))
        .collect();
    debug!(
        blocks = total,
        accepted = questions.len(),
        "Parsed question blocks"
    );
    questions
}

fn resolve_config(config: Option<&ParseConfig>) -> Cow<'_, ParseConfig> {
    match config {
        Some(c) => Cow::Borrowed(c),
        None => Cow::Owned(ParseConfig::default()),
    }
}
