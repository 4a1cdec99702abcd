//! Text normalisation: deterministic cleanup shared by every source.
//!
//! Rules (applied in order):
//! 1. Strip invisible Unicode (zero-width spaces/joiners, BOM, soft hyphens)
//! 2. Trim trailing whitespace per line
//! 3. Collapse runs of blank lines to one blank line and trim the ends
//!    (only when `collapse_blank_lines` is on)
//!
//! Line endings are already unified by the time text is an
//! [`AnnotatedText`]; the plain-string entry points unify them on the way in.

use crate::annotated::{AnnotatedLine, AnnotatedText};

/// Normalise a single source's text.
pub fn normalize(text: &AnnotatedText, collapse_blank_lines: bool) -> AnnotatedText {
    let lines: Vec<AnnotatedLine> = text
        .lines()
        .iter()
        .map(|line| line.map_text(remove_invisible_chars).trim_end())
        .collect();

    if !collapse_blank_lines {
        return AnnotatedText::from_lines(lines);
    }
    AnnotatedText::from_lines(trim_blank_edges(collapse_blank_lines_in(lines)))
}

/// Join per-page texts in document order, separated by one blank line,
/// skipping pages that produced nothing.
pub fn join_pages(pages: Vec<AnnotatedText>, collapse_blank_lines: bool) -> AnnotatedText {
    let mut joined = AnnotatedText::new();
    for page in pages.into_iter().filter(|p| !p.is_blank()) {
        if !joined.is_empty() {
            joined.push_line(AnnotatedLine::new());
        }
        for line in trim_blank_edges(page.into_lines()) {
            joined.push_line(line);
        }
    }
    normalize(&joined, collapse_blank_lines)
}

// ── Rule 1: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 3: Collapse blank-line runs ─────────────────────────────────────────

fn collapse_blank_lines_in(lines: Vec<AnnotatedLine>) -> Vec<AnnotatedLine> {
    let mut compact = Vec::with_capacity(lines.len());
    let mut last_blank = false;
    for line in lines {
        let blank = line.is_blank();
        if blank && last_blank {
            continue;
        }
        compact.push(if blank { AnnotatedLine::new() } else { line });
        last_blank = blank;
    }
    compact
}

fn trim_blank_edges(mut lines: Vec<AnnotatedLine>) -> Vec<AnnotatedLine> {
    while lines.last().is_some_and(AnnotatedLine::is_blank) {
        lines.pop();
    }
    let leading = lines.iter().take_while(|l| l.is_blank()).count();
    lines.drain(..leading);
    if let Some(first) = lines.first_mut() {
        *first = first.trim();
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(input: &str, collapse: bool) -> String {
        normalize(&AnnotatedText::from_marked(input), collapse).to_string()
    }

    #[test]
    fn trims_trailing_whitespace() {
        assert_eq!(norm("  hello   \nworld  ", false), "  hello\nworld");
    }

    #[test]
    fn unifies_line_endings() {
        assert_eq!(norm("a\r\nb\rc", true), "a\nb\nc");
    }

    #[test]
    fn collapses_blank_runs_and_trims_edges() {
        assert_eq!(norm("\n\n  a\n\n\n\n b\n   \n\nc\n\n", true), "a\n\n b\n\nc");
    }

    #[test]
    fn keeps_blank_runs_when_disabled() {
        assert_eq!(norm("a\n\n\nb\n", false), "a\n\n\nb\n");
    }

    #[test]
    fn removes_invisible_chars() {
        assert_eq!(norm("hello\u{200B}world\u{FEFF}foo\u{00AD}bar", true), "helloworldfoobar");
    }

    #[test]
    fn keeps_red_spans() {
        assert_eq!(
            norm("[[RED]]1)[[/RED]] Pregunta   \n\n\nA) x", true),
            "[[RED]]1)[[/RED]] Pregunta\n\nA) x"
        );
    }

    #[test]
    fn join_pages_separates_with_one_blank_line() {
        let pages = vec![
            AnnotatedText::from_plain("1) First?\nA) x\nB) y\n"),
            AnnotatedText::from_plain("   \n"),
            AnnotatedText::from_plain("2) Second?\nA) z\nB) w"),
        ];
        let joined = join_pages(pages, true);
        assert_eq!(
            joined.plain_text(),
            "1) First?\nA) x\nB) y\n\n2) Second?\nA) z\nB) w"
        );
    }

    #[test]
    fn join_pages_without_collapse_still_uses_single_separator() {
        let pages = vec![
            AnnotatedText::from_plain("\na\n\n"),
            AnnotatedText::from_plain("b"),
        ];
        assert_eq!(join_pages(pages, false).plain_text(), "a\n\nb");
    }
}
