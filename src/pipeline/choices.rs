//! Option parsing for form-page rows.
//!
//! Every radio control yields exactly one option. Its label is resolved by
//! trying [`LabelStrategy::CHAIN`] in order; the first strategy producing a
//! non-empty label wins.

use std::collections::HashSet;

use regex::Regex;

use crate::error::Diagnostic;
use crate::model::{FormControl, FormRow, QuestionOption};

const NBSP: char = '\u{a0}';

/// One way of finding an option label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelStrategy {
    /// `(<n>) <label>` inside the control's enclosing fragment
    Fragment,
    /// `(<n>) <label>` or bare text in the node after the control
    TrailingSibling,
    /// `選項<value>`
    Placeholder,
}

impl LabelStrategy {
    /// Resolution order.
    pub const CHAIN: [LabelStrategy; 3] = [
        LabelStrategy::Fragment,
        LabelStrategy::TrailingSibling,
        LabelStrategy::Placeholder,
    ];
}

/// Parses the controls of a form row into options.
#[derive(Debug, Clone)]
pub struct ChoiceParser {
    marker: Regex,
}

impl ChoiceParser {
    /// Create a choice parser.
    pub fn new() -> Self {
        Self {
            marker: Regex::new(r"\((\d+)\)").expect("valid option marker pattern"),
        }
    }

    /// Build the options of question `number` from its row controls.
    ///
    /// Options keep control order. A repeated value is dropped.
    pub fn parse(
        &self,
        number: &str,
        form: &FormRow,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<QuestionOption> {
        let mut seen = HashSet::new();
        let mut options = Vec::with_capacity(form.controls.len());

        for control in &form.controls {
            if !seen.insert(control.value.as_str()) {
                diagnostics.push(Diagnostic::DuplicateOptionValue {
                    number: number.to_string(),
                    value: control.value.clone(),
                });
                continue;
            }

            let (strategy, text) = LabelStrategy::CHAIN
                .iter()
                .find_map(|&strategy| Some((strategy, self.label(strategy, control)?)))
                .unwrap_or_else(|| (LabelStrategy::Placeholder, placeholder(&control.value)));

            if strategy == LabelStrategy::Placeholder {
                diagnostics.push(Diagnostic::UnresolvedOptionText {
                    number: number.to_string(),
                    value: control.value.clone(),
                });
            }
            options.push(QuestionOption::new(control.value.clone(), text));
        }

        options
    }

    /// Apply a single strategy to a control.
    pub fn label(&self, strategy: LabelStrategy, control: &FormControl) -> Option<String> {
        match strategy {
            LabelStrategy::Fragment => self.fragment_label(&control.fragment, &control.value),
            LabelStrategy::TrailingSibling => control
                .trailing
                .as_deref()
                .and_then(|text| self.trailing_label(text)),
            LabelStrategy::Placeholder => Some(placeholder(&control.value)),
        }
    }

    /// Label after the `(<value>)` marker in the fragment, or after its first
    /// marker when no marker carries the value.
    ///
    /// The label ends at the next marker or at a double non-breaking space.
    fn fragment_label(&self, fragment: &str, value: &str) -> Option<String> {
        let markers: Vec<regex::Captures<'_>> = self.marker.captures_iter(fragment).collect();
        let index = markers
            .iter()
            .position(|caps| &caps[1] == value)
            .or_else(|| (!markers.is_empty()).then_some(0))?;

        let start = markers[index].get(0)?.end();
        let end = markers
            .get(index + 1)
            .and_then(|caps| caps.get(0))
            .map_or(fragment.len(), |m| m.start());

        let label = &fragment[start..end];
        let label = label.split("\u{a0}\u{a0}").next().unwrap_or(label);
        non_empty(collapse(label))
    }

    /// Text following the first marker of the sibling, or the whole sibling.
    fn trailing_label(&self, text: &str) -> Option<String> {
        let text = text.replace(NBSP, " ");
        let label = match self.marker.find(&text) {
            Some(m) => &text[m.end()..],
            None => text.as_str(),
        };
        non_empty(collapse(label))
    }
}

impl Default for ChoiceParser {
    fn default() -> Self {
        Self::new()
    }
}

fn placeholder(value: &str) -> String {
    format!("選項{}", value)
}

/// Collapse whitespace runs (non-breaking spaces included) to one space.
fn collapse(text: &str) -> String {
    text.split(|c: char| c.is_whitespace() || c == NBSP)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn non_empty(text: String) -> Option<String> {
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(controls: Vec<FormControl>) -> FormRow {
        FormRow {
            number: "5".to_string(),
            controls,
            correct: None,
        }
    }

    #[test]
    fn test_fragment_label() {
        let parser = ChoiceParser::new();
        let form = row(vec![
            FormControl::new("1", "(1)\u{a0}甲\u{a0}\u{a0}"),
            FormControl::new("2", "(2)\u{a0}乙 丙\u{a0}\u{a0}備註"),
        ]);
        let mut diagnostics = Vec::new();
        let options = parser.parse("5", &form, &mut diagnostics);

        assert_eq!(
            options,
            vec![QuestionOption::new("1", "甲"), QuestionOption::new("2", "乙 丙")]
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_shared_fragment_picks_matching_marker() {
        let parser = ChoiceParser::new();
        let fragment = "題目 (1) 是 (2) 否";
        let form = row(vec![
            FormControl::new("1", fragment),
            FormControl::new("2", fragment),
        ]);
        let options = parser.parse("5", &form, &mut Vec::new());
        assert_eq!(options[0].text, "是");
        assert_eq!(options[1].text, "否");
    }

    #[test]
    fn test_trailing_sibling_fallback() {
        let parser = ChoiceParser::new();
        let form = row(vec![
            FormControl::new("1", "").with_trailing("\u{a0}正確"),
            FormControl::new("2", "").with_trailing("(2) 錯誤"),
        ]);
        let options = parser.parse("5", &form, &mut Vec::new());
        assert_eq!(options[0].text, "正確");
        assert_eq!(options[1].text, "錯誤");
    }

    #[test]
    fn test_placeholder_fallback() {
        let parser = ChoiceParser::new();
        let form = row(vec![FormControl::new("3", "   ").with_trailing(" ")]);
        let mut diagnostics = Vec::new();
        let options = parser.parse("5", &form, &mut diagnostics);

        assert_eq!(options, vec![QuestionOption::new("3", "選項3")]);
        assert_eq!(
            diagnostics,
            vec![Diagnostic::UnresolvedOptionText {
                number: "5".into(),
                value: "3".into()
            }]
        );
    }

    #[test]
    fn test_duplicate_values_dropped() {
        let parser = ChoiceParser::new();
        let form = row(vec![
            FormControl::new("1", "(1) a"),
            FormControl::new("1", "(1) b"),
        ]);
        let mut diagnostics = Vec::new();
        let options = parser.parse("5", &form, &mut diagnostics);

        assert_eq!(options.len(), 1);
        assert_eq!(options[0].text, "a");
        assert!(matches!(
            diagnostics[0],
            Diagnostic::DuplicateOptionValue { .. }
        ));
    }

    #[test]
    fn test_strategy_order() {
        assert_eq!(LabelStrategy::CHAIN[0], LabelStrategy::Fragment);
        assert_eq!(LabelStrategy::CHAIN[2], LabelStrategy::Placeholder);
    }
}
