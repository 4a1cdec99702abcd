//! Pipeline stages for question extraction.
//!
//! Each submodule implements exactly one step, so every stage can be tested
//! on its own and the extraction backends can change without touching the
//! parser.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ format ──┬─▶ pdf ──┬─▶ (render ▶ ocr)  ┐
//!                    ├─▶ ocr   │                   ├─▶ normalize ▶ resplit ▶ segment ▶ block
//!                    └─▶ plain ┘                   ┘
//! ```
//!
//! 1. [`input`]   : path or upload → local file (temp copies removed on drop)
//! 2. [`format`]  : extension → PDF / image / plain text
//! 3. [`pdf`]     : per page: text layer with red tagging, or OCR fallback
//! 4. [`render`]  : pdfium binding, document loading, page rasterisation
//! 5. [`ocr`]     : OCR word boxes → lines, red tagging from pixels
//! 6. [`plain`]   : decode with an encoding fallback chain
//! 7. [`normalize`]: invisible characters, trailing whitespace, blank runs
//! 8. [`resplit`] : split lines holding several questions/options
//! 9. [`segment`] : one block per question start
//! 10. [`block`]  : block → question, options and answer
//!
//! [`classify`] holds the line patterns shared by `segment` and `block`.

pub mod block;
pub mod classify;
pub mod format;
pub mod input;
pub mod normalize;
pub mod ocr;
pub mod pdf;
pub mod plain;
pub mod render;
pub mod resplit;
pub mod segment;
