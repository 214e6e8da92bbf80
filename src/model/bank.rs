//! Section, question, option and image records.

use serde::{Deserialize, Serialize, Serializer};

/// One certification work-item group and its questions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    /// Five-digit exam code (e.g. "11900")
    pub exam_code: String,

    /// Certification label (e.g. "電腦軟體設計 丙級")
    pub cert_level: String,

    /// Work-item number as written (e.g. "01")
    pub section_number: String,

    /// Work-item title
    pub title: String,

    /// Questions in encounter order
    pub questions: Vec<Question>,

    /// Opened without a header line (form-page sources)
    pub(crate) implicit: bool,
}

impl Section {
    /// Create a section from header fields.
    pub fn new(
        exam_code: impl Into<String>,
        cert_level: impl Into<String>,
        section_number: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            exam_code: exam_code.into(),
            cert_level: cert_level.into(),
            section_number: section_number.into(),
            title: title.into(),
            questions: Vec::new(),
            implicit: false,
        }
    }

    /// Create the headerless section that form-page rows collect into.
    pub fn untitled() -> Self {
        Self {
            implicit: true,
            ..Self::default()
        }
    }

    /// Whether this section was opened without a header.
    pub fn is_implicit(&self) -> bool {
        self.implicit
    }

    /// Number of questions; always equals `questions.len()`.
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Check if the section holds no questions.
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Find a question by its number.
    pub fn question(&self, number: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.number == number)
    }

    /// The most recently appended question.
    pub fn last_question_mut(&mut self) -> Option<&mut Question> {
        self.questions.last_mut()
    }

    /// Short label used in diagnostics (e.g. "11900/01").
    pub fn label(&self) -> String {
        if self.implicit {
            "(untitled)".to_string()
        } else {
            format!("{}/{}", self.exam_code, self.section_number)
        }
    }
}

/// A single question with its answer, options and images.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Question {
    /// Number as written in the source
    pub number: String,

    /// Question text with the answer marker removed
    pub content: String,

    /// Bracketed answer index (e.g. "(2)") or empty
    pub answer: String,

    /// Correct control value as written (form-page sources only)
    pub control_value: Option<String>,

    /// Selectable options (form-page sources only)
    pub options: Vec<QuestionOption>,

    /// Images attached in document order
    pub images: Vec<ImageRef>,
}

impl Question {
    /// Create a question skeleton with no answer, options or images.
    pub fn new(number: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    /// Check if an answer was resolved.
    pub fn has_answer(&self) -> bool {
        !self.answer.is_empty()
    }

    /// The answer index without brackets (e.g. "2"), or empty.
    pub fn answer_value(&self) -> &str {
        self.answer
            .strip_prefix('(')
            .and_then(|s| s.strip_suffix(')'))
            .unwrap_or(&self.answer)
    }

    /// The answer as exported in review records.
    ///
    /// The raw correct control value when the row has one, otherwise the
    /// bare answer index.
    pub fn review_answer(&self) -> &str {
        self.control_value
            .as_deref()
            .unwrap_or_else(|| self.answer_value())
    }

    /// Find an option by value.
    pub fn option(&self, value: &str) -> Option<&QuestionOption> {
        self.options.iter().find(|o| o.value == value)
    }

    /// Numeric value of the question number, when it parses.
    pub fn ordinal(&self) -> Option<u64> {
        self.number.parse().ok()
    }
}

/// A selectable option of a question.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    /// Control value (unique within the question)
    pub value: String,

    /// Display label
    pub text: String,
}

impl QuestionOption {
    /// Create a new option.
    pub fn new(value: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            text: text.into(),
        }
    }
}

/// Reference to a stored image.
///
/// Serialized as its relative path only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    /// Relative storage path (e.g. "images/p3_i1.png")
    pub path: String,

    /// 1-based position among the images of its page
    pub index: u32,
}

impl ImageRef {
    /// Create a new image reference.
    pub fn new(path: impl Into<String>, index: u32) -> Self {
        Self {
            path: path.into(),
            index,
        }
    }
}

impl Serialize for ImageRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.path)
    }
}
