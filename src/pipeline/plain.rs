//! Plain-text reading with an ordered encoding fallback chain.
//!
//! No colour information exists on this path; every span is plain.

use crate::annotated::AnnotatedText;
use crate::config::{ParseConfig, TextEncoding};
use crate::error::McqError;
use crate::pipeline::normalize::normalize;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Read and normalise a text file.
pub fn read_plain_text(path: &Path, config: &ParseConfig) -> Result<AnnotatedText, McqError> {
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => McqError::NotFound {
            path: path.to_path_buf(),
        },
        ErrorKind::PermissionDenied => McqError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => McqError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    let text = decode(&bytes, &config.text_encodings).ok_or_else(|| McqError::DecodingFailure {
        path: path.to_path_buf(),
        tried: config
            .text_encodings
            .iter()
            .map(|e| e.label())
            .collect::<Vec<_>>()
            .join(", "),
    })?;

    Ok(normalize(
        &AnnotatedText::from_plain(&text),
        config.collapse_blank_lines,
    ))
}

/// Decode with the first encoding that accepts the bytes.
pub fn decode(bytes: &[u8], encodings: &[TextEncoding]) -> Option<String> {
    encodings.iter().find_map(|&enc| {
        let decoded = decode_as(bytes, enc);
        if decoded.is_some() {
            debug!(encoding = %enc, "Decoded plain text");
        }
        decoded
    })
}

fn decode_as(bytes: &[u8], encoding: TextEncoding) -> Option<String> {
    match encoding {
        TextEncoding::Utf8 => std::str::from_utf8(bytes).ok().map(str::to_owned),
        TextEncoding::Utf8Sig => {
            let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
            std::str::from_utf8(body).ok().map(str::to_owned)
        }
        TextEncoding::Latin1 => Some(bytes.iter().map(|&b| char::from(b)).collect()),
    }
}
