//! pdfium plumbing: library binding, document loading, page rasterisation.
//!
//! ## Binding order
//!
//! 1. `PDFIUM_LIB_PATH`, when set, must point at a pdfium shared library.
//! 2. A pdfium library in the working directory.
//! 3. The system library search path.
//!
//! The first binding that succeeds wins. Rendering is synchronous and runs on
//! the calling thread, one page at a time.

use crate::error::McqError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::debug;

/// PDF user space is 72 points per inch.
const POINTS_PER_INCH: f32 = 72.0;

/// Bind to a pdfium library.
pub fn bind_pdfium() -> Result<Pdfium, McqError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(path) if !path.trim().is_empty() => {
            debug!("Binding pdfium from PDFIUM_LIB_PATH={path}");
            Pdfium::bind_to_library(&path).map_err(|e| {
                McqError::PdfiumBindingFailed(format!("PDFIUM_LIB_PATH '{path}': {e:?}"))
            })?
        }
        _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| McqError::PdfiumBindingFailed(format!("{e:?}")))?,
    };
    Ok(Pdfium::new(bindings))
}

/// Open a PDF, mapping password problems to their own errors.
pub fn open_document<'a>(
    pdfium: &'a Pdfium,
    path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, McqError> {
    pdfium.load_pdf_from_file(path, password).map_err(|e| {
        let detail = format!("{e:?}");
        if detail.contains("Password") || detail.contains("password") {
            if password.is_some() {
                McqError::WrongPassword {
                    path: path.to_path_buf(),
                }
            } else {
                McqError::PasswordRequired {
                    path: path.to_path_buf(),
                }
            }
        } else {
            McqError::extraction(format!("cannot open '{}': {detail}", path.display()))
        }
    })
}

/// Render one page at `dpi`.
pub fn render_page(page: &PdfPage, dpi: u32) -> Result<DynamicImage, String> {
    let config = PdfRenderConfig::new().scale_page_by_factor(dpi as f32 / POINTS_PER_INCH);
    let bitmap = page
        .render_with_config(&config)
        .map_err(|e| format!("rendering at {dpi} DPI: {e:?}"))?;
    let image = bitmap.as_image();
    debug!("Rendered page at {dpi} DPI → {}x{} px", image.width(), image.height());
    Ok(image)
}
