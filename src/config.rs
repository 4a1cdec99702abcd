//! Configuration types for question extraction.
//!
//! All extraction behaviour is controlled through [`ParseConfig`], built via
//! [`ParseConfigBuilder`] or taken as-is from [`ParseConfig::default()`].
//! The six core knobs (`ocr_lang`, `ocr_dpi`, `min_digital_chars`,
//! `min_question_chars`, `collapse_blank_lines`,
//! `require_red_question_number`) default to the values the parsing
//! heuristics were tuned for; everything else is an operational extra.

use crate::error::McqError;
use crate::pipeline::ocr::{CancellationFlag, OcrEngine};
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Configuration for a question-extraction run.
///
/// # Example
/// ```rust
/// use mcq_extract::ParseConfig;
///
/// let config = ParseConfig::builder()
///     .ocr_lang("eng")
///     .ocr_dpi(200)
///     .require_red_question_number(true)
///     .build()
///     .unwrap();
/// assert_eq!(config.min_digital_chars, 35);
/// ```
#[derive(Clone)]
pub struct ParseConfig {
    /// Tesseract language model(s), `+`-joined. Default: `"spa+eng"`.
    pub ocr_lang: String,

    /// Raster resolution used when a PDF page is routed to OCR. Default: 300.
    pub ocr_dpi: u32,

    /// Whitespace-collapsed native text length below which a PDF page is
    /// treated as scanned and sent to OCR. Default: 35.
    pub min_digital_chars: usize,

    /// Minimum accepted question-text length, in characters. Default: 5.
    pub min_question_chars: usize,

    /// Collapse runs of blank lines to a single blank line. Default: true.
    pub collapse_blank_lines: bool,

    /// Only accept question numbers rendered in red, provided the document
    /// has at least one red question number. Default: false.
    pub require_red_question_number: bool,

    /// PDF page selection. Default: all pages.
    pub pages: PageSelection,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Encodings tried, in order, for plain-text inputs.
    /// Default: UTF-8, UTF-8 with signature, Latin-1.
    pub text_encodings: Vec<TextEncoding>,

    /// Path to the tesseract binary. Default: `"tesseract"` (resolved via PATH).
    pub tesseract_path: String,

    /// Kill the OCR process after this many seconds. Default: no limit.
    pub ocr_timeout_secs: Option<u64>,

    /// Cooperative cancellation for long OCR runs.
    pub cancel: Option<CancellationFlag>,

    /// Pre-constructed OCR engine. Takes precedence over `tesseract_path`.
    pub ocr_engine: Option<Arc<dyn OcrEngine>>,

    /// Per-page progress events for PDF extraction.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            ocr_lang: "spa+eng".to_string(),
            ocr_dpi: 300,
            min_digital_chars: 35,
            min_question_chars: 5,
            collapse_blank_lines: true,
            require_red_question_number: false,
            pages: PageSelection::default(),
            password: None,
            text_encodings: TextEncoding::default_chain(),
            tesseract_path: "tesseract".to_string(),
            ocr_timeout_secs: None,
            cancel: None,
            ocr_engine: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ParseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseConfig")
            .field("ocr_lang", &self.ocr_lang)
            .field("ocr_dpi", &self.ocr_dpi)
            .field("min_digital_chars", &self.min_digital_chars)
            .field("min_question_chars", &self.min_question_chars)
            .field("collapse_blank_lines", &self.collapse_blank_lines)
            .field(
                "require_red_question_number",
                &self.require_red_question_number,
            )
            .field("pages", &self.pages)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("text_encodings", &self.text_encodings)
            .field("tesseract_path", &self.tesseract_path)
            .field("ocr_timeout_secs", &self.ocr_timeout_secs)
            .field("ocr_engine", &self.ocr_engine.as_ref().map(|_| "<dyn OcrEngine>"))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl ParseConfig {
    /// Create a new builder for `ParseConfig`.
    pub fn builder() -> ParseConfigBuilder {
        ParseConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ParseConfig`].
#[derive(Debug)]
pub struct ParseConfigBuilder {
    config: ParseConfig,
}

impl ParseConfigBuilder {
    pub fn ocr_lang(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_lang = lang.into();
        self
    }

    pub fn ocr_dpi(mut self, dpi: u32) -> Self {
        self.config.ocr_dpi = dpi;
        self
    }

    pub fn min_digital_chars(mut self, n: usize) -> Self {
        self.config.min_digital_chars = n;
        self
    }

    pub fn min_question_chars(mut self, n: usize) -> Self {
        self.config.min_question_chars = n;
        self
    }

    pub fn collapse_blank_lines(mut self, v: bool) -> Self {
        self.config.collapse_blank_lines = v;
        self
    }

    pub fn require_red_question_number(mut self, v: bool) -> Self {
        self.config.require_red_question_number = v;
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn text_encodings(mut self, encodings: Vec<TextEncoding>) -> Self {
        self.config.text_encodings = encodings;
        self
    }

    pub fn tesseract_path(mut self, path: impl Into<String>) -> Self {
        self.config.tesseract_path = path.into();
        self
    }

    pub fn ocr_timeout_secs(mut self, secs: u64) -> Self {
        self.config.ocr_timeout_secs = Some(secs);
        self
    }

    pub fn cancel(mut self, flag: CancellationFlag) -> Self {
        self.config.cancel = Some(flag);
        self
    }

    pub fn ocr_engine(mut self, engine: Arc<dyn OcrEngine>) -> Self {
        self.config.ocr_engine = Some(engine);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ParseConfig, McqError> {
        let c = &self.config;
        if !(72..=1200).contains(&c.ocr_dpi) {
            return Err(McqError::InvalidConfig(format!(
                "OCR DPI must be 72–1200, got {}",
                c.ocr_dpi
            )));
        }
        if c.ocr_lang.trim().is_empty() {
            return Err(McqError::InvalidConfig(
                "OCR language must not be empty".into(),
            ));
        }
        if c.text_encodings.is_empty() {
            return Err(McqError::InvalidConfig(
                "At least one text encoding is required".into(),
            ));
        }
        if c.ocr_timeout_secs == Some(0) {
            return Err(McqError::InvalidConfig(
                "OCR timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Specifies which pages of a PDF to extract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSelection {
    /// Extract all pages (default).
    #[default]
    All,
    /// Extract a single page (1-indexed).
    Single(usize),
    /// Extract a contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Extract specific pages (1-indexed, deduplicated).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Expand the selection into a sorted, deduplicated list of 0-indexed page numbers.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = match self {
            PageSelection::All => (0..total_pages).collect(),
            PageSelection::Single(p) => {
                if *p >= 1 && *p <= total_pages {
                    vec![p - 1]
                } else {
                    vec![]
                }
            }
            PageSelection::Range(start, end) => {
                let s = (*start).max(1) - 1;
                let e = (*end).min(total_pages);
                (s..e).collect()
            }
            PageSelection::Set(pages) => pages
                .iter()
                .filter(|&&p| p >= 1 && p <= total_pages)
                .map(|p| p - 1)
                .collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}

/// A text encoding tried by the plain-text reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextEncoding {
    /// Strict UTF-8.
    Utf8,
    /// UTF-8 preceded by a byte-order mark; the mark is dropped.
    Utf8Sig,
    /// ISO-8859-1. Every byte sequence decodes.
    Latin1,
}

impl TextEncoding {
    /// The fallback chain used when no encodings are configured explicitly.
    pub fn default_chain() -> Vec<TextEncoding> {
        vec![TextEncoding::Utf8, TextEncoding::Utf8Sig, TextEncoding::Latin1]
    }

    /// Canonical label, as used in error messages and CLI flags.
    pub fn label(self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Utf8Sig => "utf-8-sig",
            TextEncoding::Latin1 => "latin-1",
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for TextEncoding {
    type Err = McqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" => Ok(TextEncoding::Utf8),
            "utf-8-sig" | "utf8-sig" => Ok(TextEncoding::Utf8Sig),
            "latin-1" | "latin1" | "iso-8859-1" => Ok(TextEncoding::Latin1),
            other => Err(McqError::InvalidConfig(format!(
                "Unknown text encoding '{other}' (expected utf-8, utf-8-sig or latin-1)"
            ))),
        }
    }
}
