//! PDF extraction: per-page choice between the text layer and OCR.
//!
//! ## Strategy per page
//!
//! 1. Read the native text layer and measure it with whitespace collapsed.
//! 2. At or above `min_digital_chars`, rebuild the page from glyph boxes:
//!    glyphs become words, red glyph boxes tag overlapping words, and words
//!    are regrouped into lines top-to-bottom, left-to-right.
//! 3. Below the threshold the page is rendered at `ocr_dpi` and read by OCR.
//!
//! Pages are processed strictly in order and joined with one blank line.
//! The glyph → word → line steps are pure functions over [`Glyph`] so they
//! are tested without pdfium.

use crate::annotated::{AnnotatedLine, AnnotatedText};
use crate::config::ParseConfig;
use crate::error::McqError;
use crate::geometry::{is_red_rgb, overlaps_any, BoundingBox, RED_OVERLAP_RATIO};
use crate::pipeline::normalize::join_pages;
use crate::pipeline::ocr::ocr_image;
use crate::pipeline::render::{bind_pdfium, open_document, render_page};
use crate::progress::{NoopProgressCallback, PageStrategy, ProgressCallback};
use pdfium_render::prelude::*;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Horizontal gap (points) that splits two glyphs into separate words.
const WORD_GAP: f32 = 2.0;
/// Vertical distance (points) within which words share a line.
const LINE_TOLERANCE: f32 = 3.0;

/// One character from the text layer, in top-down page coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub ch: Option<char>,
    pub bbox: Option<BoundingBox>,
    pub red: bool,
}

/// A word rebuilt from consecutive glyphs.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub text: String,
    pub bbox: BoundingBox,
}

/// Extract every selected page of the PDF at `path`.
pub fn extract_pdf(path: &Path, config: &ParseConfig) -> Result<AnnotatedText, McqError> {
    let pdfium = bind_pdfium()?;
    let document = open_document(&pdfium, path, config.password.as_deref())?;
    let pages = document.pages();
    let total_pages = pages.len() as usize;
    let indices = config.pages.to_indices(total_pages);
    let selected = indices.len();
    info!("PDF loaded: {total_pages} pages, {selected} selected");

    let progress: ProgressCallback = config
        .progress_callback
        .clone()
        .unwrap_or_else(|| Arc::new(NoopProgressCallback));
    progress.on_extraction_start(selected);

    let mut page_texts = Vec::with_capacity(selected);
    for idx in indices {
        let page_num = idx + 1;
        progress.on_page_start(page_num, selected);

        let page = pages
            .get(idx as u16)
            .map_err(|e| McqError::page_failure(page_num, format!("{e:?}")))?;
        let (text, strategy) = extract_page(&page, page_num, config)?;

        let chars = text.plain_text().chars().count();
        debug!(page = page_num, %strategy, chars, "Page extracted");
        progress.on_page_complete(page_num, selected, strategy, chars);
        page_texts.push(text);
    }

    progress.on_extraction_complete(selected);
    Ok(join_pages(page_texts, config.collapse_blank_lines))
}

fn extract_page(
    page: &PdfPage,
    page_num: usize,
    config: &ParseConfig,
) -> Result<(AnnotatedText, PageStrategy), McqError> {
    let text_layer = page
        .text()
        .map_err(|e| McqError::page_failure(page_num, format!("reading text layer: {e:?}")))?;
    let native = text_layer.all();
    let native_chars = collapsed_len(&native);

    if native_chars >= config.min_digital_chars {
        let glyphs = collect_glyphs(&text_layer, page.height().value);
        let text = reconstruct_digital(&glyphs).unwrap_or_else(|| {
            debug!(page = page_num, "No positioned words; using plain text layer");
            AnnotatedText::from_plain(native.trim())
        });
        return Ok((text, PageStrategy::Digital));
    }

    debug!(
        page = page_num,
        native_chars,
        threshold = config.min_digital_chars,
        "Too little native text; routing page to OCR"
    );
    let image = render_page(page, config.ocr_dpi)
        .map_err(|detail| McqError::page_failure(page_num, detail))?;
    let text = ocr_image(&image, Some(config.ocr_dpi), config).map_err(|e| on_page(e, page_num))?;
    Ok((text, PageStrategy::Ocr))
}

/// Attach the page number to extraction failures that lack one.
fn on_page(err: McqError, page_num: usize) -> McqError {
    match err {
        McqError::ExtractionFailure { page: None, detail } => {
            McqError::page_failure(page_num, detail)
        }
        other => other,
    }
}

/// Character count after collapsing whitespace runs to one space and trimming.
pub fn collapsed_len(text: &str) -> usize {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return 0;
    }
    words.iter().map(|w| w.chars().count()).sum::<usize>() + words.len() - 1
}

fn collect_glyphs(text: &PdfPageText, page_height: f32) -> Vec<Glyph> {
    text.chars()
        .iter()
        .map(|ch| {
            let bbox = ch.loose_bounds().ok().map(|r| {
                BoundingBox::new(
                    r.left().value,
                    page_height - r.top().value,
                    r.right().value,
                    page_height - r.bottom().value,
                )
            });
            let red = ch
                .fill_color()
                .map(|c| is_red_rgb(c.red(), c.green(), c.blue()))
                .unwrap_or(false);
            Glyph {
                ch: ch.unicode_char(),
                bbox,
                red,
            }
        })
        .collect()
}

/// Rebuild a page from glyphs, or `None` when no positioned word exists.
pub fn reconstruct_digital(glyphs: &[Glyph]) -> Option<AnnotatedText> {
    let words = build_words(glyphs);
    if words.is_empty() {
        return None;
    }
    let red_boxes: Vec<BoundingBox> = glyphs
        .iter()
        .filter(|g| g.red)
        .filter_map(|g| g.bbox)
        .collect();
    let tagged = words
        .into_iter()
        .map(|w| {
            let red = overlaps_any(&w.bbox, &red_boxes, RED_OVERLAP_RATIO);
            (w, red)
        })
        .collect();
    Some(assemble_lines(tagged))
}

/// Group consecutive visible glyphs into words. Whitespace, control
/// characters, glyphs without bounds, a horizontal gap wider than
/// [`WORD_GAP`] or a vertical jump beyond [`LINE_TOLERANCE`] end a word.
pub fn build_words(glyphs: &[Glyph]) -> Vec<Word> {
    let mut words = Vec::new();
    let mut current: Option<(Word, f32)> = None;

    for glyph in glyphs {
        let visible = match (glyph.ch, glyph.bbox) {
            (Some(c), Some(b)) if !c.is_whitespace() && !c.is_control() => Some((c, b)),
            _ => None,
        };
        let Some((c, bbox)) = visible else {
            words.extend(current.take().map(|(w, _)| w));
            continue;
        };

        let breaks = current.as_ref().is_some_and(|(word, last_x1)| {
            bbox.x0 - last_x1 > WORD_GAP || (bbox.top - word.bbox.top).abs() > LINE_TOLERANCE
        });
        if breaks {
            words.extend(current.take().map(|(w, _)| w));
        }

        match current.as_mut() {
            Some((word, last_x1)) => {
                word.text.push(c);
                word.bbox = word.bbox.union(&bbox);
                *last_x1 = bbox.x1;
            }
            None => {
                current = Some((
                    Word {
                        text: c.to_string(),
                        bbox,
                    },
                    bbox.x1,
                ))
            }
        }
    }
    words.extend(current.map(|(w, _)| w));
    words
}

/// Order words top-to-bottom, then group those whose top lies within
/// [`LINE_TOLERANCE`] of the line's first word. Each line reads left to right.
pub fn assemble_lines(mut words: Vec<(Word, bool)>) -> AnnotatedText {
    words.sort_by(|(a, _), (b, _)| {
        a.bbox
            .top
            .total_cmp(&b.bbox.top)
            .then(a.bbox.x0.total_cmp(&b.bbox.x0))
    });

    let mut lines: Vec<(f32, Vec<(Word, bool)>)> = Vec::new();
    for (word, red) in words {
        match lines.last_mut() {
            Some((top, members)) if (word.bbox.top - *top).abs() <= LINE_TOLERANCE => {
                members.push((word, red))
            }
            _ => lines.push((word.bbox.top, vec![(word, red)])),
        }
    }

    let mut text = AnnotatedText::new();
    for (_, mut members) in lines {
        members.sort_by(|(a, _), (b, _)| a.bbox.x0.total_cmp(&b.bbox.x0));
        let mut line = AnnotatedLine::new();
        for (word, red) in &members {
            line.push_word(&word.text, *red);
        }
        text.push_line(line);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Lay out `text` as 5-point-wide glyphs starting at `x`, on baseline row `top`.
    /// Spaces advance the pen without emitting a bounded glyph.
    fn glyphs(text: &str, x: f32, top: f32, red: bool) -> Vec<Glyph> {
        let mut out = Vec::new();
        let mut pen = x;
        for c in text.chars() {
            let bbox = (!c.is_whitespace()).then(|| BoundingBox::new(pen, top, pen + 5.0, top + 10.0));
            out.push(Glyph {
                ch: Some(c),
                bbox,
                red: red && !c.is_whitespace(),
            });
            pen += 5.0;
        }
        out
    }

    fn word(text: &str, x0: f32, top: f32) -> Word {
        Word {
            text: text.into(),
            bbox: BoundingBox::new(x0, top, x0 + 10.0, top + 10.0),
        }
    }

    #[test]
    fn collapsed_len_counts_single_spaces() {
        assert_eq!(collapsed_len("  a   b\n\nc  "), 5);
        assert_eq!(collapsed_len(" \n\t "), 0);
        assert_eq!(collapsed_len("¿Qué?"), 5);
    }

    #[test]
    fn words_split_on_spaces_and_gaps() {
        let mut g = glyphs("12) Capital", 0.0, 0.0, false);
        // Same line, but 20 points further right.
        g.extend(glyphs("Lima", 120.0, 0.0, false));
        let words = build_words(&g);
        let texts: Vec<_> = words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, vec!["12)", "Capital", "Lima"]);
        assert_eq!(words[0].bbox, BoundingBox::new(0.0, 0.0, 15.0, 10.0));
    }

    #[test]
    fn words_split_on_line_change_without_whitespace() {
        let mut g = glyphs("uno", 0.0, 0.0, false);
        g.extend(glyphs("dos", 15.0, 20.0, false));
        let texts: Vec<_> = build_words(&g).into_iter().map(|w| w.text).collect();
        assert_eq!(texts, vec!["uno", "dos"]);
    }

    #[test]
    fn unbounded_glyph_ends_word() {
        let mut g = glyphs("ab", 0.0, 0.0, false);
        g.push(Glyph {
            ch: Some('c'),
            bbox: None,
            red: false,
        });
        g.extend(glyphs("d", 10.0, 0.0, false));
        let texts: Vec<_> = build_words(&g).into_iter().map(|w| w.text).collect();
        assert_eq!(texts, vec!["ab", "d"]);
    }

    #[test]
    fn red_glyphs_tag_whole_words() {
        let mut g = glyphs("3)", 0.0, 0.0, true);
        g.extend(glyphs(" Pregunta", 10.0, 0.0, false));
        g.push(Glyph {
            ch: Some('\n'),
            bbox: None,
            red: false,
        });
        g.extend(glyphs("A) Uno", 0.0, 20.0, false));
        g.extend(glyphs(" B) Dos", 30.0, 20.0, false));
        // Only the first glyph of "correcta" is red: 1/8 of the word.
        g.extend(glyphs("c", 70.0, 20.0, true));
        g.extend(glyphs("orrecta", 75.0, 20.0, false));

        let text = reconstruct_digital(&g).unwrap();
        assert_eq!(
            text.to_string(),
            "[[RED]]3)[[/RED]] Pregunta\nA) Uno B) Dos correcta"
        );
    }

    #[test]
    fn no_words_means_no_reconstruction() {
        let g = glyphs("   ", 0.0, 0.0, false);
        assert!(reconstruct_digital(&g).is_none());
    }

    #[test]
    fn assemble_groups_by_top_with_tolerance() {
        let words = vec![
            (word("B)", 0.0, 31.0), false),
            (word("Capital?", 40.0, 1.5), false),
            (word("1)", 0.0, 0.0), true),
            (word("Quito", 20.0, 29.0), false),
            (word("A)", 0.0, 15.0), false),
        ];
        let text = assemble_lines(words);
        assert_eq!(
            text.to_string(),
            "[[RED]]1)[[/RED]] Capital?\nA)\nB) Quito"
        );
    }

    #[test]
    fn jittered_line_still_reads_left_to_right() {
        let words = vec![
            (word("dos", 20.0, 0.0), false),
            (word("uno", 0.0, 2.0), false),
        ];
        assert_eq!(assemble_lines(words).to_string(), "uno dos");
    }

    #[test]
    fn on_page_fills_missing_page() {
        let e = on_page(McqError::extraction("ocr broke"), 4);
        assert!(matches!(e, McqError::ExtractionFailure { page: Some(4), .. }));
        let e = on_page(McqError::page_failure(2, "x"), 4);
        assert!(matches!(e, McqError::ExtractionFailure { page: Some(2), .. }));
    }
}
