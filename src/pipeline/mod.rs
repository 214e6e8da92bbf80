//! Segmentation, tokenization and association pipeline.
//!
//! A [`Pipeline`] consumes the blocks of one document strictly in source
//! order. Text blocks open sections and produce questions; image blocks
//! attach to the most recent question of the open section. All state lives
//! in an [`Accumulator`] owned by a single pass, so documents can be
//! processed in parallel with one pipeline each.
//!
//! # Example
//!
//! ```
//! use qbank::pipeline::{NullImageSink, Pipeline};
//! use qbank::source::PaginatedSource;
//!
//! let source = PaginatedSource::from_pages([
//!     "11900 電腦軟體設計 丙級 工作項目01：電腦概論\n1. 這是題目內容(2)\n",
//! ]);
//! let mut sink = NullImageSink;
//! let extraction = Pipeline::new(&mut sink).run(source)?;
//!
//! let question = &extraction.sections[0].questions[0];
//! assert_eq!(question.content, "這是題目內容");
//! assert_eq!(question.answer, "(2)");
//! # Ok::<(), qbank::Error>(())
//! ```

mod accumulator;
mod answer;
mod choices;
mod images;
mod segmenter;
mod tokenizer;

pub use accumulator::Accumulator;
pub use answer::{AnswerExtractor, AnswerSource, ResolvedAnswer};
pub use choices::{ChoiceParser, LabelStrategy};
pub use images::{
    image_path, normalize_color_space, DirectoryImageStore, ImageSink, MemoryImageSink,
    NullImageSink,
};
pub use segmenter::{Segment, Segmenter, SegmenterState};
pub use tokenizer::{Token, Tokenizer, Tokens};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Diagnostic, Error, Result};
use crate::model::{Block, FormRow, ImageBlock, ImageRef, Question, Section, TextBlock};
use crate::options::ExtractOptions;
use crate::render::{self, ExtractionStats, JsonFormat, OutputLayout};
use crate::source::{BlockSource, SourceKind};

/// Result of one pipeline pass.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Kind of the source the blocks came from
    pub kind: SourceKind,

    /// Closed sections in encounter order
    pub sections: Vec<Section>,

    /// Pass statistics
    pub stats: ExtractionStats,

    /// Recoverable conditions, in the order they occurred
    pub diagnostics: Vec<Diagnostic>,
}

impl Extraction {
    /// Serialize the sections.
    pub fn to_json(&self, format: JsonFormat, layout: OutputLayout) -> Result<String> {
        render::to_json(&self.sections, format, layout)
    }

    /// Total number of questions across sections.
    pub fn question_count(&self) -> usize {
        self.sections.iter().map(Section::question_count).sum()
    }

    /// Iterate over all questions in output order.
    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.sections.iter().flat_map(|s| s.questions.iter())
    }
}

/// Builds a question bank from a block stream.
pub struct Pipeline<'s> {
    segmenter: Segmenter,
    tokenizer: Tokenizer,
    choices: ChoiceParser,
    image_prefix: String,
    sink: &'s mut dyn ImageSink,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'s> Pipeline<'s> {
    /// Create a pipeline storing images into `sink`.
    pub fn new(sink: &'s mut dyn ImageSink) -> Self {
        Self {
            segmenter: Segmenter::new(),
            tokenizer: Tokenizer::new(),
            choices: ChoiceParser::new(),
            image_prefix: "images/".to_string(),
            sink,
            cancel: None,
        }
    }

    /// Create a pipeline configured from extraction options.
    pub fn from_options(options: &ExtractOptions, sink: &'s mut dyn ImageSink) -> Self {
        let mut pipeline = Self::new(sink).with_image_prefix(options.image_prefix.clone());
        pipeline.cancel = options.cancel.clone();
        pipeline
    }

    /// Set the image path prefix.
    pub fn with_image_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.image_prefix = prefix.into();
        self
    }

    /// Install a cancellation flag, checked before each block.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Consume `source` and return the finished sections.
    ///
    /// The answer strategy follows the source kind. Form-page sources start
    /// with an implicit untitled section, since their rows carry no headers.
    pub fn run<S: BlockSource>(&mut self, source: S) -> Result<Extraction> {
        let kind = source.kind();
        let answers = AnswerExtractor::new(kind.answer_source());
        let mut acc = match kind {
            SourceKind::Paginated => Accumulator::new(),
            SourceKind::Markup => Accumulator::with_open(Section::untitled()),
        };

        log::debug!("Running pipeline over {} source", kind);

        let mut consumed = 0usize;
        for block in source {
            if self.is_cancelled() {
                log::warn!("Extraction cancelled after {} blocks", consumed);
                return Err(Error::Cancelled(consumed));
            }

            match block? {
                Block::Text(text) => {
                    acc.stats_mut().add_text_block();
                    self.on_text(&mut acc, &answers, text);
                }
                Block::Image(image) => {
                    acc.stats_mut().add_image_block();
                    self.on_image(&mut acc, image)?;
                }
            }
            consumed += 1;
        }

        let extraction = acc.finish(kind);
        log::debug!(
            "Pipeline done: {} blocks, {} sections, {} questions, {} diagnostics",
            consumed,
            extraction.sections.len(),
            extraction.question_count(),
            extraction.diagnostics.len()
        );
        Ok(extraction)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    fn on_text(&self, acc: &mut Accumulator, answers: &AnswerExtractor, block: TextBlock) {
        let page = block.page;

        if let Some(form) = &block.form {
            let body = self.tokenizer.row_body(&block.content, &form.number);
            if let Some(section) = self.segmenter.match_header(body) {
                acc.open_section(section);
                return;
            }
            self.add_question(acc, answers, page, &form.number, body, Some(form));
            return;
        }

        for segment in self.segmenter.split(&block.content) {
            match segment {
                Segment::Header(section) => acc.open_section(section),
                Segment::Body(text) => self.on_body(acc, answers, page, text),
            }
        }
    }

    fn on_body(&self, acc: &mut Accumulator, answers: &AnswerExtractor, page: u32, text: &str) {
        let tokens = self.tokenizer.tokenize(text);

        if !tokens.leading.is_empty() {
            acc.record(Diagnostic::LeadingFragment {
                page,
                chars: tokens.leading.chars().count(),
            });
        }

        for token in tokens.tokens {
            if token.is_incomplete() {
                acc.record(Diagnostic::TrailingIncompleteQuestion {
                    page,
                    number: token.number.to_string(),
                });
                continue;
            }
            self.add_question(acc, answers, page, token.number, token.body, None);
        }
    }

    fn add_question(
        &self,
        acc: &mut Accumulator,
        answers: &AnswerExtractor,
        page: u32,
        number: &str,
        body: &str,
        form: Option<&FormRow>,
    ) {
        let mut pending = Vec::new();

        let resolved = answers.resolve(body, form);
        if !resolved.is_resolved() {
            pending.push(Diagnostic::UnresolvedAnswerMarker {
                number: number.to_string(),
            });
        }

        let mut question = Question::new(number, resolved.content);
        question.answer = resolved.answer;
        question.control_value = resolved.control_value;
        if let Some(form) = form {
            question.options = self.choices.parse(number, form, &mut pending);
        }

        // Only kept questions report their diagnostics
        if acc.push_question(page, question) {
            for diagnostic in pending {
                acc.record(diagnostic);
            }
        }
    }

    fn on_image(&mut self, acc: &mut Accumulator, image: ImageBlock) -> Result<()> {
        let index = acc.next_image_index(image.page);

        if !acc.can_attach() {
            acc.stats_mut().drop_image();
            acc.record(Diagnostic::OrphanImage {
                page: image.page,
                index,
            });
            return Ok(());
        }

        let path = image_path(&self.image_prefix, image.page, index, &image.extension());
        if self.sink.wants_bytes() {
            let (data, diagnostic) = normalize_color_space(&image, &path);
            if let Some(diagnostic) = diagnostic {
                acc.record(diagnostic);
            }
            self.sink.store(&path, &data)?;
        }

        acc.attach_image(ImageRef::new(path, index));
        Ok(())
    }
}
