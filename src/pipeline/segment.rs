//! Block segmentation: one block per detected question.
//!
//! A one-state machine over the resplit line stream. The only state is the
//! open block; a question-start line closes it and opens the next one, any
//! other line is appended to it, and lines before the first question start
//! are discarded.
//!
//! ## Enforce-red mode
//!
//! With `require_red_question_number` on, the whole stream is scanned first.
//! If at least one question start has a red numeral, question starts whose
//! numeral is *not* red are dropped outright: they neither open a block nor
//! extend the previous one, so their text disappears from the output. If no
//! red numeral exists anywhere the flag has no effect.

use crate::annotated::{AnnotatedLine, AnnotatedText};
use crate::pipeline::classify::{question_start, QuestionStart};
use tracing::debug;

/// The raw lines of one candidate question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Number printed before the question, kept for diagnostics only.
    pub number: u32,
    /// First line is the question text with its numbering removed and no
    /// provenance; later lines are kept as found.
    pub lines: Vec<AnnotatedLine>,
}

/// Whether `line` is a question start whose numeral overlaps red text.
pub fn has_red_question_number(line: &AnnotatedLine) -> bool {
    red_start(line, &line.text()).is_some()
}

fn red_start(line: &AnnotatedLine, text: &str) -> Option<QuestionStart> {
    question_start(text).filter(|q| line.is_red_at(q.marker.clone()))
}

/// Split a normalised, resplit line stream into question blocks.
pub fn segment(text: &AnnotatedText, require_red_question_number: bool) -> Vec<Block> {
    let enforce_red =
        require_red_question_number && text.lines().iter().any(has_red_question_number);
    if require_red_question_number {
        debug!(enforce_red, "Red question-number mode requested");
    }

    let mut blocks = Vec::new();
    let mut current: Option<Block> = None;

    for line in text.lines() {
        let line = line.trim_end();
        let plain = line.text();

        if let Some(start) = question_start(&plain) {
            if enforce_red && red_start(&line, &plain).is_none() {
                debug!(number = start.number, "Dropping non-red question start");
                continue;
            }
            if let Some(done) = current.take() {
                blocks.push(done);
            }
            current = Some(Block {
                number: start.number,
                lines: vec![AnnotatedLine::plain(plain[start.body_start..].trim())],
            });
            continue;
        }

        if let Some(block) = current.as_mut() {
            block.lines.push(line);
        }
    }

    if let Some(done) = current {
        blocks.push(done);
    }

    debug!(blocks = blocks.len(), "Segmented question blocks");
    blocks
}
