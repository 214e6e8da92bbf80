//! JSON rendering for question banks.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::{ImageRef, Question, QuestionOption, Section};

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Shape of the emitted records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputLayout {
    /// Nested sections with their questions
    #[default]
    Bank,
    /// Flat question list with bare answer values (form-page review export)
    Review,
}

#[derive(Serialize)]
struct SectionRecord<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    exam_code: &'a str,
    cert_level: &'a str,
    section_number: &'a str,
    section_title: &'a str,
    question_count: usize,
    questions: Vec<QuestionRecord<'a>>,
}

#[derive(Serialize)]
struct QuestionRecord<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    number: &'a str,
    content: &'a str,
    answer: &'a str,
    options: &'a [QuestionOption],
    images: &'a [ImageRef],
}

#[derive(Serialize)]
struct ReviewRecord<'a> {
    id: &'a str,
    title: &'a str,
    options: &'a [QuestionOption],
    correct_answer: &'a str,
}

impl<'a> From<&'a Section> for SectionRecord<'a> {
    fn from(section: &'a Section) -> Self {
        Self {
            kind: "section",
            exam_code: &section.exam_code,
            cert_level: &section.cert_level,
            section_number: &section.section_number,
            section_title: &section.title,
            question_count: section.question_count(),
            questions: section.questions.iter().map(QuestionRecord::from).collect(),
        }
    }
}

impl<'a> From<&'a Question> for QuestionRecord<'a> {
    fn from(question: &'a Question) -> Self {
        Self {
            kind: "question",
            number: &question.number,
            content: &question.content,
            answer: &question.answer,
            options: &question.options,
            images: &question.images,
        }
    }
}

impl<'a> From<&'a Question> for ReviewRecord<'a> {
    fn from(question: &'a Question) -> Self {
        Self {
            id: &question.number,
            title: &question.content,
            options: &question.options,
            correct_answer: question.review_answer(),
        }
    }
}

/// Convert sections to JSON.
///
/// Non-ASCII text is emitted verbatim. Every field is present even when empty.
pub fn to_json(sections: &[Section], format: JsonFormat, layout: OutputLayout) -> Result<String> {
    match layout {
        OutputLayout::Bank => {
            let records: Vec<SectionRecord<'_>> = sections.iter().map(SectionRecord::from).collect();
            serialize(&records, format)
        }
        OutputLayout::Review => {
            let records: Vec<ReviewRecord<'_>> = sections
                .iter()
                .flat_map(|s| s.questions.iter())
                .map(ReviewRecord::from)
                .collect();
            serialize(&records, format)
        }
    }
}

/// Number of top-level records [`to_json`] emits for `layout`.
pub fn record_count(sections: &[Section], layout: OutputLayout) -> usize {
    match layout {
        OutputLayout::Bank => sections.len(),
        OutputLayout::Review => sections.iter().map(Section::question_count).sum(),
    }
}

fn serialize<T: Serialize>(value: &T, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(value),
        JsonFormat::Compact => serde_json::to_string(value),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}
