//! Progress-callback trait for per-page extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ParseConfigBuilder::progress_callback`] to receive events
//! while a PDF is processed. Pages are handled strictly in order on the
//! calling thread, so events arrive in page order.
//!
//! # Example
//!
//! ```rust
//! use mcq_extract::{ExtractionProgressCallback, PageStrategy, ParseConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct OcrCounter {
//!     ocr_pages: AtomicUsize,
//! }
//!
//! impl ExtractionProgressCallback for OcrCounter {
//!     fn on_page_complete(&self, _page: usize, _total: usize, strategy: PageStrategy, _chars: usize) {
//!         if strategy == PageStrategy::Ocr {
//!             self.ocr_pages.fetch_add(1, Ordering::SeqCst);
//!         }
//!     }
//! }
//!
//! let counter = Arc::new(OcrCounter { ocr_pages: AtomicUsize::new(0) });
//! let config = ParseConfig::builder()
//!     .progress_callback(counter as Arc<dyn ExtractionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::fmt;
use std::sync::Arc;

/// How a PDF page's text was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStrategy {
    /// Native text layer, with colour-aware word reconstruction.
    Digital,
    /// Page rasterised and read by the OCR engine.
    Ocr,
}

impl fmt::Display for PageStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageStrategy::Digital => f.write_str("digital"),
            PageStrategy::Ocr => f.write_str("ocr"),
        }
    }
}

/// Called by the PDF extractor as it processes each page.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once before the first page, with the number of selected pages.
    fn on_extraction_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called before a page's native text is inspected.
    ///
    /// * `page_num`    : 1-indexed page number
    /// * `total_pages` : pages selected for extraction
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when a page's text has been recovered.
    ///
    /// * `strategy` : whether the text layer or OCR produced the page
    /// * `chars`    : character count of the recovered page text
    fn on_page_complete(
        &self,
        page_num: usize,
        total_pages: usize,
        strategy: PageStrategy,
        chars: usize,
    ) {
        let _ = (page_num, total_pages, strategy, chars);
    }

    /// Called once after the last page.
    fn on_extraction_complete(&self, total_pages: usize) {
        let _ = total_pages;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ParseConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;
