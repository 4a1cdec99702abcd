//! Block extraction: one [`Block`] in, at most one [`ParsedQuestion`] out.
//!
//! Parsing never fails. A block that does not look like a question is
//! dropped, and an answer that cannot be pinned down is left as `None`.

use crate::output::ParsedQuestion;
use crate::pipeline::classify::{classify, LineKind};
use crate::pipeline::segment::Block;
use tracing::debug;

struct OptionDraft {
    label: char,
    body: String,
    marked_correct: bool,
}

impl OptionDraft {
    fn render(&self) -> String {
        collapse_whitespace(&format!("{}) {}", self.label, self.body))
    }
}

/// Parse a block into a question, or `None` when it is rejected.
pub fn parse_block(block: &Block, min_question_chars: usize) -> Option<ParsedQuestion> {
    let mut lines = block.lines.iter().map(|l| l.text());
    let mut question_parts: Vec<String> = lines
        .next()
        .map(|first| first.trim().to_string())
        .into_iter()
        .collect();
    let mut options: Vec<OptionDraft> = Vec::new();
    let mut explicit_answer: Option<usize> = None;

    for raw in lines {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let classified = classify(line);
        if classified.answer.is_some() {
            explicit_answer = classified.answer;
        }

        match classified.kind {
            LineKind::Option(opt) => options.push(OptionDraft {
                label: opt.label,
                body: opt.body.to_string(),
                marked_correct: classified.marked_correct,
            }),
            LineKind::Continuation(text) => match options.last_mut() {
                Some(open) => {
                    if !open.body.is_empty() {
                        open.body.push(' ');
                    }
                    open.body.push_str(text);
                    open.marked_correct |= classified.marked_correct;
                }
                None => question_parts.push(text.to_string()),
            },
            LineKind::Empty => {
                if let Some(open) = options.last_mut() {
                    open.marked_correct |= classified.marked_correct;
                }
            }
        }
    }

    let question = collapse_whitespace(&question_parts.join(" "));
    let (options, flags): (Vec<String>, Vec<bool>) = options
        .iter()
        .map(|o| (o.render(), o.marked_correct))
        .filter(|(text, _)| !text.is_empty())
        .unzip();

    if question.is_empty() || question.chars().count() < min_question_chars {
        debug!(number = block.number, "Dropping block: question text too short");
        return None;
    }
    if options.len() < 2 {
        debug!(
            number = block.number,
            options = options.len(),
            "Dropping block: fewer than two options"
        );
        return None;
    }

    let correct_option = resolve_correct(explicit_answer, &flags);
    Some(ParsedQuestion {
        question,
        options,
        correct_option,
    })
}

/// Explicit answer if it points at an existing option, else the single
/// inline-marked option, else nothing.
fn resolve_correct(explicit_answer: Option<usize>, flags: &[bool]) -> Option<usize> {
    if let Some(idx) = explicit_answer.filter(|&i| i < flags.len()) {
        return Some(idx);
    }
    let mut marked = flags.iter().enumerate().filter_map(|(i, &f)| f.then_some(i));
    match (marked.next(), marked.next()) {
        (Some(only), None) => Some(only),
        _ => None,
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
