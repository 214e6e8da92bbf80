//! Mutable pipeline state for one document.

use std::collections::BTreeMap;

use crate::error::Diagnostic;
use crate::model::{ImageRef, Question, Section};
use crate::render::ExtractionStats;
use crate::source::SourceKind;

use super::segmenter::SegmenterState;
use super::Extraction;

/// The open section, closed sections, per-page image counters and the run
/// report of a single pipeline pass.
#[derive(Debug, Default)]
pub struct Accumulator {
    state: SegmenterState,
    closed: Vec<Section>,
    image_counters: BTreeMap<u32, u32>,
    diagnostics: Vec<Diagnostic>,
    stats: ExtractionStats,
}

impl Accumulator {
    /// Create an accumulator with no section open.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an accumulator with `section` already open.
    pub fn with_open(section: Section) -> Self {
        let mut acc = Self::default();
        acc.state.open(section);
        acc
    }

    /// Open `section`, closing the previously open one.
    pub fn open_section(&mut self, section: Section) {
        log::debug!(
            "Opening section {} {}",
            section.label(),
            section.title
        );
        if let Some(previous) = self.state.open(section) {
            self.close_section(previous);
        }
    }

    fn close_section(&mut self, section: Section) {
        if section.is_implicit() && section.is_empty() {
            return;
        }
        log::debug!(
            "Closing section {} with {} questions",
            section.label(),
            section.question_count()
        );
        self.closed.push(section);
    }

    /// Whether a section is open.
    pub fn is_open(&self) -> bool {
        self.state.is_open()
    }

    /// The open section.
    pub fn current(&self) -> Option<&Section> {
        self.state.current()
    }

    /// Append `question` to the open section.
    ///
    /// Returns `false` when the question was dropped: no section is open, or
    /// the section already holds a question with the same number.
    pub fn push_question(&mut self, page: u32, question: Question) -> bool {
        let Some(section) = self.state.current_mut() else {
            self.stats.drop_question();
            self.record(Diagnostic::MissingSectionContext {
                page,
                number: question.number,
            });
            return false;
        };

        if section.question(&question.number).is_some() {
            let diagnostic = Diagnostic::DuplicateQuestionNumber {
                section: section.label(),
                number: question.number,
            };
            self.stats.drop_question();
            self.record(diagnostic);
            return false;
        }

        let out_of_order = section.questions.last().and_then(|last| {
            let regressed = matches!(
                (last.ordinal(), question.ordinal()),
                (Some(prev), Some(next)) if next <= prev
            );
            regressed.then(|| Diagnostic::OutOfOrderQuestionNumber {
                section: section.label(),
                previous: last.number.clone(),
                number: question.number.clone(),
            })
        });

        log::debug!(
            "Question {} in section {} (answer {:?})",
            question.number,
            section.label(),
            question.answer
        );
        section.questions.push(question);

        if let Some(diagnostic) = out_of_order {
            self.record(diagnostic);
        }
        true
    }

    /// Advance the image counter of `page`, returning the new 1-based index.
    pub fn next_image_index(&mut self, page: u32) -> u32 {
        let counter = self.image_counters.entry(page).or_insert(0);
        *counter += 1;
        *counter
    }

    /// Whether an image arriving now has a question to attach to.
    pub fn can_attach(&self) -> bool {
        self.state.current().is_some_and(|s| !s.is_empty())
    }

    /// Attach `image` to the last question of the open section.
    ///
    /// Returns `false` when there is no such question.
    pub fn attach_image(&mut self, image: ImageRef) -> bool {
        match self.state.current_mut().and_then(Section::last_question_mut) {
            Some(question) => {
                log::debug!("Attached {} to question {}", image.path, question.number);
                question.images.push(image);
                self.stats.add_image();
                true
            }
            None => false,
        }
    }

    /// Record and log a diagnostic.
    pub fn record(&mut self, diagnostic: Diagnostic) {
        diagnostic.log();
        self.diagnostics.push(diagnostic);
    }

    /// Diagnostics recorded so far.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Mutable statistics.
    pub fn stats_mut(&mut self) -> &mut ExtractionStats {
        &mut self.stats
    }

    /// Close any open section and produce the result of the pass.
    pub fn finish(mut self, kind: SourceKind) -> Extraction {
        if let Some(section) = self.state.close() {
            self.close_section(section);
        }
        for section in &self.closed {
            self.stats.count_section(section);
        }

        Extraction {
            kind,
            sections: self.closed,
            stats: self.stats,
            diagnostics: self.diagnostics,
        }
    }
}
