//! Colour-provenance text: lines made of `(text, red)` spans.
//!
//! Extraction stages know which words were rendered in red; parsing stages
//! need to ask "is this question numeral red?" long after the words were
//! joined into lines. Instead of threading sentinel strings through the
//! pipeline, every line is an ordered list of [`Span`]s. Pattern matching
//! runs on [`AnnotatedLine::text`] and colour questions are answered by
//! byte-range overlap with [`AnnotatedLine::is_red_at`].
//!
//! The sentinel form `[[RED]]…[[/RED]]` survives only at the string
//! boundary: [`AnnotatedText`]'s `Display` renders it for debugging and
//! for the string-returning entry points, and [`AnnotatedText::from_marked`]
//! parses it back. Final output strings are always built from span text, so
//! markers cannot leak into a [`crate::ParsedQuestion`].

use std::fmt;
use std::ops::Range;

/// Opening sentinel of a red span in the marked string form.
pub const RED_START: &str = "[[RED]]";
/// Closing sentinel of a red span in the marked string form.
pub const RED_END: &str = "[[/RED]]";

/// A run of text sharing one colour provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub red: bool,
}

/// One physical line of text with colour provenance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotatedLine {
    spans: Vec<Span>,
}

impl AnnotatedLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// A line without any red text.
    pub fn plain(text: impl Into<String>) -> Self {
        let mut line = Self::new();
        line.push(&text.into(), false);
        line
    }

    /// Append text, merging with the previous span when the colour matches.
    pub fn push(&mut self, text: &str, red: bool) {
        if text.is_empty() {
            return;
        }
        match self.spans.last_mut() {
            Some(last) if last.red == red => last.text.push_str(text),
            _ => self.spans.push(Span {
                text: text.to_string(),
                red,
            }),
        }
    }

    /// Append a word, separated from existing content by a single plain space.
    pub fn push_word(&mut self, word: &str, red: bool) {
        if !self.spans.is_empty() {
            self.push(" ", false);
        }
        self.push(word, red);
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// Concatenated text of all spans, with no provenance.
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    pub fn is_blank(&self) -> bool {
        self.spans.iter().all(|s| s.text.trim().is_empty())
    }

    pub fn has_red(&self) -> bool {
        self.spans.iter().any(|s| s.red && !s.text.is_empty())
    }

    /// Whether any red span overlaps `range` (byte offsets into [`Self::text`]).
    pub fn is_red_at(&self, range: Range<usize>) -> bool {
        let mut offset = 0;
        for span in &self.spans {
            let span_range = offset..offset + span.text.len();
            offset = span_range.end;
            if span.red && span_range.start < range.end && range.start < span_range.end {
                return true;
            }
        }
        false
    }

    /// Sub-line covering `range` (byte offsets into [`Self::text`]).
    ///
    /// `range` must fall on char boundaries of the concatenated text.
    pub fn slice(&self, range: Range<usize>) -> AnnotatedLine {
        let mut out = AnnotatedLine::new();
        let mut offset = 0;
        for span in &self.spans {
            let start = offset;
            let end = offset + span.text.len();
            offset = end;
            let lo = range.start.max(start);
            let hi = range.end.min(end);
            if lo < hi {
                out.push(&span.text[lo - start..hi - start], span.red);
            }
        }
        out
    }

    /// Leading and trailing whitespace removed, provenance kept.
    pub fn trim(&self) -> AnnotatedLine {
        let text = self.text();
        let start = text.len() - text.trim_start().len();
        let end = text.trim_end().len();
        if start >= end {
            return AnnotatedLine::new();
        }
        self.slice(start..end)
    }

    /// Trailing whitespace removed, provenance kept.
    pub fn trim_end(&self) -> AnnotatedLine {
        let text = self.text();
        self.slice(0..text.trim_end().len())
    }

    /// Rewrite every span's text, keeping its colour.
    pub fn map_text(&self, f: impl Fn(&str) -> String) -> AnnotatedLine {
        let mut out = AnnotatedLine::new();
        for span in &self.spans {
            out.push(&f(&span.text), span.red);
        }
        out
    }

    /// Render in the `[[RED]]…[[/RED]]` marked form.
    pub fn to_marked(&self) -> String {
        let mut out = String::new();
        for span in &self.spans {
            if span.red {
                out.push_str(RED_START);
                out.push_str(&span.text);
                out.push_str(RED_END);
            } else {
                out.push_str(&span.text);
            }
        }
        out
    }
}

/// A sequence of annotated lines: a page, a document, or a parsing input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotatedText {
    lines: Vec<AnnotatedLine>,
}

impl AnnotatedText {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_lines(lines: Vec<AnnotatedLine>) -> Self {
        Self { lines }
    }

    /// Plain text without provenance; line endings are unified to `\n`.
    pub fn from_plain(text: &str) -> Self {
        let unified = text.replace("\r\n", "\n").replace('\r', "\n");
        Self {
            lines: unified.split('\n').map(AnnotatedLine::plain).collect(),
        }
    }

    /// Parse the marked string form. Unpaired sentinels toggle colour and are
    /// dropped; a red run may span several lines.
    pub fn from_marked(text: &str) -> Self {
        let unified = text.replace("\r\n", "\n").replace('\r', "\n");
        let mut lines = Vec::new();
        let mut current = AnnotatedLine::new();
        let mut red = false;
        let mut rest = unified.as_str();

        loop {
            let next = [(RED_START, true), (RED_END, false)]
                .into_iter()
                .filter_map(|(marker, on)| rest.find(marker).map(|i| (i, marker, on)))
                .min_by_key(|(i, _, _)| *i);

            let chunk = match next {
                Some((i, _, _)) => &rest[..i],
                None => rest,
            };
            for (n, piece) in chunk.split('\n').enumerate() {
                if n > 0 {
                    lines.push(std::mem::take(&mut current));
                }
                current.push(piece, red);
            }

            match next {
                Some((i, marker, on)) => {
                    red = on;
                    rest = &rest[i + marker.len()..];
                }
                None => break,
            }
        }
        lines.push(current);
        Self { lines }
    }

    pub fn lines(&self) -> &[AnnotatedLine] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<AnnotatedLine> {
        self.lines
    }

    pub fn push_line(&mut self, line: AnnotatedLine) {
        self.lines.push(line);
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// True when there are no lines or every line is whitespace.
    pub fn is_blank(&self) -> bool {
        self.lines.iter().all(AnnotatedLine::is_blank)
    }

    /// Text of every line joined by `\n`, with no provenance.
    pub fn plain_text(&self) -> String {
        self.lines
            .iter()
            .map(AnnotatedLine::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for AnnotatedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            f.write_str(&line.to_marked())?;
        }
        Ok(())
    }
}
