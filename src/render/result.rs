//! Extraction statistics.

use serde::{Deserialize, Serialize};

use crate::model::Section;

/// Statistics collected while building a question bank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Total number of blocks consumed
    pub block_count: u32,

    /// Number of text blocks
    pub text_block_count: u32,

    /// Number of image blocks
    pub image_block_count: u32,

    /// Number of emitted sections
    pub section_count: u32,

    /// Number of emitted questions
    pub question_count: u32,

    /// Number of options across all questions
    pub option_count: u32,

    /// Number of questions with a resolved answer
    pub answer_count: u32,

    /// Number of images attached to questions
    pub image_count: u32,

    /// Number of images dropped for lack of a question
    pub dropped_image_count: u32,

    /// Number of questions dropped (no section, duplicates)
    pub dropped_question_count: u32,
}

impl ExtractionStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a consumed text block.
    pub fn add_text_block(&mut self) {
        self.block_count += 1;
        self.text_block_count += 1;
    }

    /// Count a consumed image block.
    pub fn add_image_block(&mut self) {
        self.block_count += 1;
        self.image_block_count += 1;
    }

    /// Increment attached image count.
    pub fn add_image(&mut self) {
        self.image_count += 1;
    }

    /// Increment dropped image count.
    pub fn drop_image(&mut self) {
        self.dropped_image_count += 1;
    }

    /// Increment dropped question count.
    pub fn drop_question(&mut self) {
        self.dropped_question_count += 1;
    }

    /// Count an emitted section and its contents.
    pub fn count_section(&mut self, section: &Section) {
        self.section_count += 1;
        for question in &section.questions {
            self.question_count += 1;
            self.option_count += question.options.len() as u32;
            if question.has_answer() {
                self.answer_count += 1;
            }
        }
    }

    /// Share of emitted questions with a resolved answer, in `[0, 1]`.
    pub fn answer_ratio(&self) -> f64 {
        if self.question_count == 0 {
            0.0
        } else {
            self.answer_count as f64 / self.question_count as f64
        }
    }

    /// Merge another stats instance into this one.
    pub fn merge(&mut self, other: &ExtractionStats) {
        self.block_count += other.block_count;
        self.text_block_count += other.text_block_count;
        self.image_block_count += other.image_block_count;
        self.section_count += other.section_count;
        self.question_count += other.question_count;
        self.option_count += other.option_count;
        self.answer_count += other.answer_count;
        self.image_count += other.image_count;
        self.dropped_image_count += other.dropped_image_count;
        self.dropped_question_count += other.dropped_question_count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Question, QuestionOption};

    #[test]
    fn test_count_section() {
        let mut section = Section::new("11900", "電腦軟體設計 丙級", "01", "電腦概論");
        let mut answered = Question::new("1", "a");
        answered.answer = "(2)".to_string();
        answered.options = vec![QuestionOption::new("1", "x"), QuestionOption::new("2", "y")];
        section.questions.push(answered);
        section.questions.push(Question::new("2", "b"));

        let mut stats = ExtractionStats::new();
        stats.count_section(&section);

        assert_eq!(stats.section_count, 1);
        assert_eq!(stats.question_count, 2);
        assert_eq!(stats.option_count, 2);
        assert_eq!(stats.answer_count, 1);
        assert!((stats.answer_ratio() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_stats_merge() {
        let mut stats1 = ExtractionStats::new();
        stats1.add_text_block();
        stats1.add_image_block();
        stats1.add_image();

        let mut stats2 = ExtractionStats::new();
        stats2.add_text_block();
        stats2.drop_image();
        stats2.drop_question();

        stats1.merge(&stats2);

        assert_eq!(stats1.block_count, 3);
        assert_eq!(stats1.text_block_count, 2);
        assert_eq!(stats1.image_block_count, 1);
        assert_eq!(stats1.image_count, 1);
        assert_eq!(stats1.dropped_image_count, 1);
        assert_eq!(stats1.dropped_question_count, 1);
    }

    #[test]
    fn test_empty_answer_ratio() {
        assert_eq!(ExtractionStats::new().answer_ratio(), 0.0);
    }
}
