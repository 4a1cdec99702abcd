//! Line resplitting: undo OCR/PDF line merges before segmentation.
//!
//! OCR engines and PDF text layers regularly glue several logical lines
//! together: `"12) What is 2+2? A) 3 B) 4 C) 5 D) 6"`. Segmentation is line
//! based, so every embedded question number (`\s+NN)` / `\s+NN.` followed by
//! whitespace) and every embedded option label (`\s+A)` followed by
//! whitespace) becomes the start of a new line here.
//!
//! Matching runs on provenance-free text and the line is cut by byte offset,
//! so red spans survive the split whichever part of `12)` they cover.

use crate::annotated::{AnnotatedLine, AnnotatedText};
use once_cell::sync::Lazy;
use regex::Regex;

static RE_EMBEDDED_QUESTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+(\d{1,4}[.)])").unwrap());

static RE_EMBEDDED_OPTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+([A-Da-d]\))").unwrap());

/// Split merged lines. Blank lines are kept (as empty lines); every other
/// output line is trimmed and non-empty.
pub fn resplit(text: &AnnotatedText) -> AnnotatedText {
    let mut out = AnnotatedText::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_blank() {
            out.push_line(AnnotatedLine::new());
            continue;
        }
        let line = line.map_text(unify_dashes);
        for piece in split_line(&line) {
            out.push_line(piece);
        }
    }
    out
}

fn unify_dashes(s: &str) -> String {
    s.replace(['—', '–'], "-")
}

fn split_line(line: &AnnotatedLine) -> Vec<AnnotatedLine> {
    let text = line.text();
    let mut cuts = split_points(&text, &RE_EMBEDDED_QUESTION);
    cuts.extend(split_points(&text, &RE_EMBEDDED_OPTION));
    cuts.sort_unstable();
    cuts.dedup();

    let mut bounds = Vec::with_capacity(cuts.len() + 2);
    bounds.push(0);
    bounds.extend(cuts);
    bounds.push(text.len());

    bounds
        .windows(2)
        .map(|w| line.slice(w[0]..w[1]).trim())
        .filter(|piece| !piece.is_blank())
        .collect()
}

/// Byte offsets where an embedded token starts. The token must be followed
/// by whitespace, which is left unconsumed so adjacent tokens
/// (`"A) B) C) x"`) all match.
fn split_points(text: &str, re: &Regex) -> Vec<usize> {
    re.captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .filter(|token| {
            text[token.end()..]
                .chars()
                .next()
                .is_some_and(char::is_whitespace)
        })
        .map(|token| token.start())
        .filter(|&start| start > 0)
        .collect()
}
