//! Error types for the mcq-extract library.
//!
//! Only one error type exists because only one failure mode escalates:
//! [`McqError`] means the input cannot be processed at all (missing file,
//! unknown extension, corrupt PDF, OCR engine crash, undecodable text).
//!
//! Problems inside a single question block are never errors. A block that is
//! too short or has fewer than two options is dropped, and an ambiguous answer
//! key leaves [`crate::output::ParsedQuestion::correct_option`] as `None`.
//! A document full of noise still yields whatever questions could be
//! recovered.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the mcq-extract library.
#[derive(Debug, Error)]
pub enum McqError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The file source has an unusable shape (empty path, upload without a filename).
    #[error("Invalid input: {detail}\nPass a file path or an upload that exposes a filename.")]
    InvalidInput { detail: String },

    /// Path input does not exist.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    NotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Extension is not one of the accepted categories.
    #[error(
        "Unsupported format '{extension}'. Use a PDF (.pdf), an image \
         (.png/.jpg/.jpeg/.bmp/.tif/.tiff/.webp) or plain text (.txt/.md/.csv)."
    )]
    UnsupportedFormat { extension: String },

    /// Reading the input file failed after it was found.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Creating or filling the temporary copy of an upload failed.
    #[error("Failed to create temporary copy of '{filename}': {source}")]
    TempFileFailed {
        filename: String,
        #[source]
        source: std::io::Error,
    },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// PDF parsing, page rendering or OCR failed.
    ///
    /// `page` is the 1-indexed page for PDF failures, `None` for standalone
    /// images and whole-document failures.
    #[error("{}", extraction_message(.page, .detail))]
    ExtractionFailure { page: Option<usize>, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// None of the configured text encodings could decode the file.
    #[error("Could not decode '{path}' as any of: {tried}")]
    DecodingFailure { path: PathBuf, tried: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
You can:\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n\
  • Place libpdfium next to the working directory.\n\
  • Install pdfium system-wide.\n"
    )]
    PdfiumBindingFailed(String),
}

fn extraction_message(page: &Option<usize>, detail: &str) -> String {
    match page {
        Some(p) => format!("Extraction failed on page {p}: {detail}"),
        None => format!("Extraction failed: {detail}"),
    }
}

impl McqError {
    /// Shorthand for a page-scoped extraction failure.
    pub(crate) fn page_failure(page: usize, detail: impl Into<String>) -> Self {
        McqError::ExtractionFailure {
            page: Some(page),
            detail: detail.into(),
        }
    }

    /// Shorthand for an extraction failure not tied to a page.
    pub(crate) fn extraction(detail: impl Into<String>) -> Self {
        McqError::ExtractionFailure {
            page: None,
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_failure_mentions_page() {
        let e = McqError::page_failure(3, "render glitch");
        let msg = e.to_string();
        assert!(msg.contains("page 3"), "got: {msg}");
        assert!(msg.contains("render glitch"));
    }

    #[test]
    fn extraction_failure_without_page() {
        let e = McqError::extraction("tesseract exited with 1");
        let msg = e.to_string();
        assert!(!msg.contains("page"), "got: {msg}");
        assert!(msg.contains("tesseract exited with 1"));
    }

    #[test]
    fn unsupported_format_lists_categories() {
        let e = McqError::UnsupportedFormat {
            extension: ".docx".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains(".docx"));
        assert!(msg.contains("PDF"));
        assert!(msg.contains("image"));
        assert!(msg.contains("plain text"));
    }

    #[test]
    fn read_failed_keeps_source() {
        use std::error::Error as _;
        let e = McqError::ReadFailed {
            path: PathBuf::from("/tmp/x.txt"),
            source: std::io::Error::other("disk on fire"),
        };
        assert!(e.source().is_some());
        assert!(e.to_string().contains("disk on fire"));
    }
}
