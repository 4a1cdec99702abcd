//! Input materialisation: turn a path or an upload into a local file.
//!
//! ## Why copy uploads to a temp file?
//!
//! pdfium, tesseract and the image decoders all want a file-system path.
//! Uploads are saved into a uniquely named temp file whose suffix mirrors
//! the original extension (format dispatch keys off it). The temp file is
//! owned by [`Materialized::Temporary`] and deleted when that value is
//! dropped, so cleanup happens on success, on `?` early returns and on
//! unwinding alike. Path inputs are never deleted.

use crate::error::McqError;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tracing::debug;

/// Something that can be written to a local path, like a web upload.
pub trait Uploadable {
    /// Original filename, used for the temp file's extension.
    fn filename(&self) -> Option<&str>;

    /// Write the full contents to `path`, replacing whatever is there.
    fn save(&self, path: &Path) -> io::Result<()>;
}

/// An upload already held in memory.
#[derive(Debug, Clone)]
pub struct MemoryUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl MemoryUpload {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }
}

impl Uploadable for MemoryUpload {
    fn filename(&self) -> Option<&str> {
        Some(&self.filename)
    }

    fn save(&self, path: &Path) -> io::Result<()> {
        std::fs::write(path, &self.bytes)
    }
}

/// Where the document comes from.
pub enum FileSource<'a> {
    /// An existing file. Never deleted.
    Path(PathBuf),
    /// An upload, copied to a temp file for the duration of the call.
    Upload(&'a dyn Uploadable),
}

impl<'a> std::fmt::Debug for FileSource<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileSource::Path(p) => f.debug_tuple("Path").field(p).finish(),
            FileSource::Upload(u) => f.debug_tuple("Upload").field(&u.filename()).finish(),
        }
    }
}

impl From<PathBuf> for FileSource<'_> {
    fn from(p: PathBuf) -> Self {
        FileSource::Path(p)
    }
}

impl From<&Path> for FileSource<'_> {
    fn from(p: &Path) -> Self {
        FileSource::Path(p.to_path_buf())
    }
}

impl From<&str> for FileSource<'_> {
    fn from(p: &str) -> Self {
        FileSource::Path(PathBuf::from(p))
    }
}

impl From<String> for FileSource<'_> {
    fn from(p: String) -> Self {
        FileSource::Path(PathBuf::from(p))
    }
}

impl<'a, U: Uploadable> From<&'a U> for FileSource<'a> {
    fn from(u: &'a U) -> Self {
        FileSource::Upload(u)
    }
}

/// A local file ready for extraction.
#[derive(Debug)]
pub enum Materialized {
    /// The caller's own file.
    Local(PathBuf),
    /// A temp copy of an upload; deleted on drop.
    Temporary { path: PathBuf, _temp: TempPath },
}

impl Materialized {
    pub fn path(&self) -> &Path {
        match self {
            Materialized::Local(p) => p,
            Materialized::Temporary { path, .. } => path,
        }
    }

    /// Whether this value deletes the file when dropped.
    pub fn owns_file(&self) -> bool {
        matches!(self, Materialized::Temporary { .. })
    }
}

/// Resolve `source` to a local file.
pub fn materialize(source: &FileSource<'_>) -> Result<Materialized, McqError> {
    match source {
        FileSource::Path(path) => resolve_local(path),
        FileSource::Upload(upload) => save_upload(*upload),
    }
}

fn resolve_local(path: &Path) -> Result<Materialized, McqError> {
    if path.as_os_str().is_empty() {
        return Err(McqError::InvalidInput {
            detail: "empty path".into(),
        });
    }
    if !path.exists() {
        return Err(McqError::NotFound {
            path: path.to_path_buf(),
        });
    }
    debug!("Resolved local input: {}", path.display());
    Ok(Materialized::Local(path.to_path_buf()))
}

fn save_upload(upload: &dyn Uploadable) -> Result<Materialized, McqError> {
    let filename = upload
        .filename()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| McqError::InvalidInput {
            detail: "upload has no filename".into(),
        })?;

    let suffix = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_else(|| ".tmp".to_string());

    let temp_failed = |source: io::Error| McqError::TempFileFailed {
        filename: filename.to_string(),
        source,
    };

    let temp = tempfile::Builder::new()
        .prefix("mcq-")
        .suffix(&suffix)
        .tempfile()
        .map_err(temp_failed)?
        .into_temp_path();

    // On failure `temp` is dropped here and the half-written file removed.
    upload.save(&temp).map_err(temp_failed)?;

    let path = temp.to_path_buf();
    debug!("Saved upload '{}' to {}", filename, path.display());
    Ok(Materialized::Temporary { path, _temp: temp })
}
