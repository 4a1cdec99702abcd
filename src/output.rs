//! Output record handed to the caller.

use serde::{Deserialize, Serialize};

/// One recovered multiple-choice question.
///
/// Invariants upheld by the parser:
/// - `question` is single-spaced and at least `min_question_chars` long;
/// - `options` has at least two entries, each shaped `"<A-D>) <body>"`;
/// - `correct_option`, when present, indexes into `options`.
///
/// `correct_option` is `None` when no answer cue was found or the cues were
/// ambiguous. That is a normal outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_option: Option<usize>,
}

impl ParsedQuestion {
    /// The option string marked correct, if any.
    pub fn correct_answer(&self) -> Option<&str> {
        self.correct_option
            .and_then(|i| self.options.get(i))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialises_with_null_for_unknown_answer() {
        let q = ParsedQuestion {
            question: "Capital of Peru?".into(),
            options: vec!["A) Lima".into(), "B) Cusco".into()],
            correct_option: None,
        };
        let json = serde_json::to_string(&q).unwrap();
        assert_eq!(
            json,
            r#"{"question":"Capital of Peru?","options":["A) Lima","B) Cusco"],"correct_option":null}"#
        );
        assert_eq!(q.correct_answer(), None);
    }

    #[test]
    fn correct_answer_resolves_index() {
        let q = ParsedQuestion {
            question: "2+2?".into(),
            options: vec!["A) 3".into(), "B) 4".into()],
            correct_option: Some(1),
        };
        assert_eq!(q.correct_answer(), Some("B) 4"));
    }
}
