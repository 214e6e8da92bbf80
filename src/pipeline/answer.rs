//! Answer extraction strategies.
//!
//! Both strategies normalize to the same shape: a bracketed positive integer
//! such as `"(2)"` or `"(02)"`, or an empty string when no answer can be
//! resolved. One marker grammar applies to both.

use regex::Regex;

use crate::model::FormRow;

/// A bracketed positive integer, leading zeros allowed.
const ANSWER_MARKER: &str = r"\((0*[1-9][0-9]*)\)";

/// Where the correct answer of a question is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerSource {
    /// A bracketed index embedded in the question text, e.g. `題目(2)`
    InlineMarker,
    /// The value of the row's designated correct control
    MarkedControl,
}

/// A question body split into display content and answer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedAnswer {
    /// Body with the answer marker removed, trimmed
    pub content: String,
    /// Bracketed answer, or empty
    pub answer: String,
    /// Correct control value exactly as written in the form row
    pub control_value: Option<String>,
}

impl ResolvedAnswer {
    /// Check if an answer was found.
    pub fn is_resolved(&self) -> bool {
        !self.answer.is_empty()
    }
}

/// Applies an [`AnswerSource`] to question bodies.
#[derive(Debug, Clone)]
pub struct AnswerExtractor {
    source: AnswerSource,
    marker: Regex,
    bare_marker: Regex,
}

impl AnswerExtractor {
    /// Create an extractor for the given strategy.
    pub fn new(source: AnswerSource) -> Self {
        Self {
            source,
            marker: Regex::new(ANSWER_MARKER).expect("valid answer marker pattern"),
            bare_marker: Regex::new(&format!("^{}$", ANSWER_MARKER))
                .expect("valid answer marker pattern"),
        }
    }

    /// The strategy in use.
    pub fn source(&self) -> AnswerSource {
        self.source
    }

    /// Resolve the answer of a question body.
    ///
    /// `form` carries the controls of a form row; it is ignored by the
    /// inline strategy.
    pub fn resolve(&self, body: &str, form: Option<&FormRow>) -> ResolvedAnswer {
        match self.source {
            AnswerSource::InlineMarker => self.inline(body),
            AnswerSource::MarkedControl => {
                let control_value = form.and_then(|f| f.correct.clone());
                ResolvedAnswer {
                    content: body.trim().to_string(),
                    answer: control_value
                        .as_deref()
                        .and_then(|v| self.bracket_control_value(v))
                        .unwrap_or_default(),
                    control_value,
                }
            }
        }
    }

    /// First bracketed integer in the body; every occurrence of it is removed.
    fn inline(&self, body: &str) -> ResolvedAnswer {
        match self.marker.find(body) {
            Some(m) => ResolvedAnswer {
                content: body.replace(m.as_str(), "").trim().to_string(),
                answer: m.as_str().to_string(),
                control_value: None,
            },
            None => ResolvedAnswer {
                content: body.trim().to_string(),
                answer: String::new(),
                control_value: None,
            },
        }
    }

    /// Normalize a control value such as `"2"` to `"(2)"`.
    ///
    /// Values that do not form an answer marker once bracketed yield `None`.
    fn bracket_control_value(&self, value: &str) -> Option<String> {
        let bracketed = format!("({})", value.trim());
        self.bare_marker.is_match(&bracketed).then_some(bracketed)
    }
}
