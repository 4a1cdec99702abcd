//! Format dispatch by file extension.

use crate::error::McqError;
use std::path::Path;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tif", "tiff", "webp"];
const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "csv"];

/// Extraction strategy selected for an input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Image,
    PlainText,
}

impl DocumentFormat {
    /// Classify `path` by its lower-cased extension.
    pub fn from_path(path: &Path) -> Result<Self, McqError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "pdf" => Ok(DocumentFormat::Pdf),
            e if IMAGE_EXTENSIONS.contains(&e) => Ok(DocumentFormat::Image),
            e if TEXT_EXTENSIONS.contains(&e) => Ok(DocumentFormat::PlainText),
            "" => Err(McqError::UnsupportedFormat {
                extension: "(none)".into(),
            }),
            other => Err(McqError::UnsupportedFormat {
                extension: format!(".{other}"),
            }),
        }
    }
}
