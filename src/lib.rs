//! # mcq-extract
//!
//! Recover multiple-choice questions from exam documents: digital PDFs,
//! scanned PDFs, photos and plain text.
//!
//! ## Why this crate?
//!
//! Exam sheets arrive in every shape. Digital PDFs have a text layer but mark
//! the answer key in red ink; scans have no text at all; OCR glues several
//! options onto one line. This crate reconciles the three extraction paths
//! (native PDF text, OCR, plain decode) into one line stream that remembers
//! which words were red, repairs merged lines, and parses numbered questions
//! with `A)`–`D)` options into [`ParsedQuestion`] records, picking the
//! correct option from explicit cues (`Respuesta: B`), inline markers
//! (`*`, `✓`, `(correcta)`) or nothing at all.
//!
//! ## Pipeline Overview
//!
//! ```text
//! file / upload
//!  │
//!  ├─ 1. Input     materialise a local file (temp copy for uploads)
//!  ├─ 2. Format    pdf / image / text by extension
//!  ├─ 3. Extract   PDF text layer + red glyphs, or OCR + red pixels, or decode
//!  ├─ 4. Normalize line endings, invisible chars, blank-line runs
//!  ├─ 5. Resplit   "1) Q? A) x B) y" → one line per question/option
//!  ├─ 6. Segment   one block per numbered question
//!  └─ 7. Parse     question text, options, best-effort answer index
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mcq_extract::{parse_questions_from_file, ParseConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ParseConfig::builder().ocr_lang("spa").build()?;
//!     for q in parse_questions_from_file("exam.pdf", Some(&config))? {
//!         println!("{}", q.question);
//!         for opt in &q.options {
//!             println!("  {opt}");
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Text can be parsed directly, without any extraction backend:
//!
//! ```rust
//! use mcq_extract::parse_questions_from_text;
//!
//! let qs = parse_questions_from_text("12) What is 2+2? A) 3 B) 4 C) 5 D) 6 Respuesta: B", None);
//! assert_eq!(qs[0].options, ["A) 3", "B) 4", "C) 5", "D) 6"]);
//! assert_eq!(qs[0].correct_option, Some(1));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `mcq-extract` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! ## Runtime requirements
//!
//! PDF input needs a pdfium shared library (`PDFIUM_LIB_PATH`, the working
//! directory, or the system search path). Images and scanned pages need the
//! `tesseract` binary, or a custom [`OcrEngine`] set on the config.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod annotated;
pub mod config;
pub mod convert;
pub mod error;
pub mod geometry;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use annotated::{AnnotatedLine, AnnotatedText, Span};
pub use config::{PageSelection, ParseConfig, ParseConfigBuilder, TextEncoding};
pub use convert::{
    extract_text_from_image, extract_text_from_path, extract_text_from_pdf,
    extract_text_from_plain_text_file, parse_questions_from_annotated, parse_questions_from_file,
    parse_questions_from_text,
};
pub use error::McqError;
pub use output::ParsedQuestion;
pub use pipeline::input::{FileSource, MemoryUpload, Uploadable};
pub use pipeline::ocr::{CancellationFlag, OcrEngine, OcrWord, TesseractCli};
pub use progress::{
    ExtractionProgressCallback, NoopProgressCallback, PageStrategy, ProgressCallback,
};
