//! Single-pass line classification.
//!
//! Every pattern the parser reacts to lives here so segmentation and block
//! extraction agree on what a question start, an option start, an explicit
//! answer line and an inline "correct" cue look like. All functions take the
//! provenance-free line text; colour questions are asked separately against
//! the byte ranges these functions return.

use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

// Question start: "4) ", "25. ", "  12) ".
static RE_QUESTION_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d{1,4})[.)]\s+").unwrap());

// Option start, optionally preceded by an inline prefix marker: "A) x", "b)x", "*C) x".
static RE_OPTION_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:(?:\*|->|=>|✓|✔|☑|✅)\s*)?([A-Da-d])\)\s*(.*)$").unwrap()
});

// "Respuesta: B", "correcta - c". Not anchored.
static RE_EXPLICIT_ANSWER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(respuesta|correcta)\s*[:\-]\s*([A-D])").unwrap());

static RE_CORRECT_INLINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\(correcta\)|\[correcta\]|\bcorrecta\b|\bcorrecto\b|\bresp(?:uesta)?\b)")
        .unwrap()
});

static RE_CORRECT_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\*|->|=>|✓|✔|☑|✅)").unwrap());

/// A line that opens a new question block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionStart {
    /// The printed question number.
    pub number: u32,
    /// Byte range of the numeral and its closing `)`/`.`.
    pub marker: Range<usize>,
    /// Byte offset where the question text begins.
    pub body_start: usize,
}

/// Match the question-start pattern at the beginning of `line`.
pub fn question_start(line: &str) -> Option<QuestionStart> {
    let caps = RE_QUESTION_START.captures(line)?;
    let digits = caps.get(1)?;
    let whole = caps.get(0)?;
    Some(QuestionStart {
        number: digits.as_str().parse().unwrap_or(0),
        marker: digits.start()..digits.end() + 1,
        body_start: whole.end(),
    })
}

/// A line that opens a new option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionStart<'a> {
    /// Upper-case label, `A`–`D`.
    pub label: char,
    pub body: &'a str,
}

/// Match the option-start pattern at the beginning of `line`.
pub fn option_start(line: &str) -> Option<OptionStart<'_>> {
    let caps = RE_OPTION_START.captures(line)?;
    let label = caps.get(1)?.as_str().chars().next()?.to_ascii_uppercase();
    let body = caps.get(2).map(|m| m.as_str().trim()).unwrap_or("");
    Some(OptionStart { label, body })
}

/// An explicit answer cue found somewhere in a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExplicitAnswer {
    /// Byte offset where the cue begins.
    pub start: usize,
    /// Option index named by the cue (`A` → 0).
    pub index: usize,
}

/// First explicit answer cue in `line`, if any.
pub fn explicit_answer(line: &str) -> Option<ExplicitAnswer> {
    let caps = RE_EXPLICIT_ANSWER.captures(line)?;
    let label = caps.get(2)?.as_str().chars().next()?;
    Some(ExplicitAnswer {
        start: caps.get(0)?.start(),
        index: label_to_index(label)?,
    })
}

/// Whether `text` carries an inline "this option is correct" cue.
pub fn has_correct_marker(text: &str) -> bool {
    RE_CORRECT_PREFIX.is_match(text) || RE_CORRECT_INLINE.is_match(text)
}

/// Map an option label to its position (`A`/`a` → 0 … `D`/`d` → 3).
pub fn label_to_index(label: char) -> Option<usize> {
    match label.to_ascii_uppercase() {
        'A' => Some(0),
        'B' => Some(1),
        'C' => Some(2),
        'D' => Some(3),
        _ => None,
    }
}

/// What a non-initial block line contributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// Opens a new option.
    Option(OptionStart<'a>),
    /// Extends the open option, or the question text if none is open.
    Continuation(&'a str),
    /// Nothing left once the explicit answer cue is cut away.
    Empty,
}

/// A classified block line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifiedLine<'a> {
    /// Option index named by an explicit answer cue on this line.
    pub answer: Option<usize>,
    pub kind: LineKind<'a>,
    /// Inline correct cue anywhere on the line, answer cue included.
    pub marked_correct: bool,
}

/// Classify one trimmed, provenance-free block line.
///
/// The explicit answer search runs on every line. The cue and whatever
/// follows it are cut before the option-start test, so
/// `"D) 6 Respuesta: B"` yields option `D` with body `6`. The inline
/// marker test still sees the whole line, so the cue flags the option
/// it sits on (or the open one, for a cue-only line).
pub fn classify(line: &str) -> ClassifiedLine<'_> {
    let answer = explicit_answer(line);
    let content = match answer {
        Some(a) => line[..a.start].trim(),
        None => line.trim(),
    };

    let kind = if let Some(opt) = option_start(content) {
        LineKind::Option(opt)
    } else if content.is_empty() {
        LineKind::Empty
    } else {
        LineKind::Continuation(content)
    };

    let marked_correct = has_correct_marker(line.trim())
        || match kind {
            LineKind::Option(opt) => has_correct_marker(content) || has_correct_marker(opt.body),
            LineKind::Continuation(_) | LineKind::Empty => false,
        };

    ClassifiedLine {
        answer: answer.map(|a| a.index),
        kind,
        marked_correct,
    }
}
