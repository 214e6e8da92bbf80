//! # qbank
//!
//! Question bank extraction from exported exam documents.
//!
//! This library turns two kinds of semi-structured sources into one
//! normalized list of sections, questions, options and image references:
//!
//! - **Paginated block records**: text and image blocks exported page by page
//!   from a paginated document, with answers written inline as `(2)`.
//! - **Form pages**: tables of numbered rows with radio controls, where the
//!   correct control is marked by an `ans<N>_correct` identifier.
//!
//! ## Quick Start
//!
//! ```
//! use qbank::{extract_str, SourceKind};
//!
//! let records = r#"[{"page": 1, "kind": "text",
//!     "text": "11900 電腦軟體設計 丙級 工作項目01：電腦概論\n1. 這是題目內容(2)\n"}]"#;
//!
//! let extraction = extract_str(records, SourceKind::Paginated)?;
//! let section = &extraction.sections[0];
//! assert_eq!(section.title, "電腦概論");
//! assert_eq!(section.questions[0].answer, "(2)");
//! # Ok::<(), qbank::Error>(())
//! ```
//!
//! ## Features
//!
//! - **Two answer strategies**: inline markers and marked form controls
//! - **Image association**: images attach to the preceding question
//! - **CMYK normalization**: four-component JPEGs are stored as RGB
//! - **Diagnostics**: recoverable conditions are reported, never fatal
//! - **Parallel batches**: uses Rayon for multi-document conversion

pub mod convert;
pub mod detect;
pub mod error;
pub mod model;
pub mod options;
pub mod pipeline;
pub mod render;
pub mod source;

// Re-export commonly used types
pub use convert::{convert_batch, convert_file, default_output_dir, ConvertResult};
pub use detect::{detect_kind, detect_kind_from_content, detect_kind_from_path};
pub use error::{Diagnostic, Error, Result};
pub use model::{Block, ImageBlock, ImageRef, Question, QuestionOption, Section, TextBlock};
pub use options::ExtractOptions;
pub use pipeline::{Extraction, ImageSink, MemoryImageSink, NullImageSink, Pipeline};
pub use render::{ExtractionStats, JsonFormat, OutputLayout};
pub use source::{BlockRecord, BlockSource, MarkupSource, PaginatedSource, SourceKind};

use std::path::Path;

/// Extract a question bank from decoded source text.
///
/// Images are referenced by path but not stored.
///
/// # Example
///
/// ```
/// use qbank::{extract_str, SourceKind};
///
/// let html = r#"<table><tr><td align="center">5</td>
///   <td>題目<input type="radio" value="1">(1) 是<input type="radio" value="2">(2) 否</td>
///   <td><input id="ans5_correct" value="2"></td></tr></table>"#;
///
/// let extraction = extract_str(html, SourceKind::Markup)?;
/// assert_eq!(extraction.sections[0].questions[0].answer, "(2)");
/// # Ok::<(), qbank::Error>(())
/// ```
pub fn extract_str(text: &str, kind: SourceKind) -> Result<Extraction> {
    convert::extract_with(text, kind, &ExtractOptions::default(), &mut NullImageSink)
}

/// Extract a question bank from a source file, detecting its kind.
///
/// # Example
///
/// ```no_run
/// use qbank::extract_file;
///
/// let extraction = extract_file("11900.json").unwrap();
/// println!("Questions: {}", extraction.question_count());
/// ```
pub fn extract_file<P: AsRef<Path>>(path: P) -> Result<Extraction> {
    QBank::new().extract_file(path).map(|result| result.extraction)
}

/// Convert a source file to question bank JSON.
///
/// # Example
///
/// ```no_run
/// use qbank::{to_json, JsonFormat};
///
/// let json = to_json("exam.asp", JsonFormat::Pretty).unwrap();
/// std::fs::write("output.json", json).unwrap();
/// ```
pub fn to_json<P: AsRef<Path>>(path: P, format: JsonFormat) -> Result<String> {
    QBank::new().with_json_format(format).extract_file(path)?.to_json()
}

/// Builder for extracting question banks.
///
/// # Example
///
/// ```no_run
/// use qbank::{OutputLayout, QBank, SourceKind};
///
/// let json = QBank::new()
///     .with_kind(SourceKind::Markup)
///     .with_layout(OutputLayout::Review)
///     .compact()
///     .extract_file("exam.asp")?
///     .to_json()?;
/// # Ok::<(), qbank::Error>(())
/// ```
pub struct QBank {
    options: ExtractOptions,
}

impl QBank {
    /// Create a new builder with default options.
    pub fn new() -> Self {
        Self {
            options: ExtractOptions::default(),
        }
    }

    /// Create a builder from existing options.
    pub fn with_options(options: ExtractOptions) -> Self {
        Self { options }
    }

    /// Force the source kind instead of detecting it.
    pub fn with_kind(mut self, kind: SourceKind) -> Self {
        self.options = self.options.with_source_kind(kind);
        self
    }

    /// Set the image path prefix.
    pub fn with_image_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.options = self.options.with_image_prefix(prefix);
        self
    }

    /// Set JSON formatting.
    pub fn with_json_format(mut self, format: JsonFormat) -> Self {
        self.options = self.options.with_json_format(format);
        self
    }

    /// Emit compact JSON.
    pub fn compact(mut self) -> Self {
        self.options = self.options.compact();
        self
    }

    /// Set the output layout.
    pub fn with_layout(mut self, layout: OutputLayout) -> Self {
        self.options = self.options.with_layout(layout);
        self
    }

    /// The configured options.
    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Extract from a source file, keeping image payloads in memory.
    pub fn extract_file<P: AsRef<Path>>(self, path: P) -> Result<QBankResult> {
        let (text, kind) = convert::load_source(path, &self.options)?;
        self.extract(&text, kind)
    }

    /// Extract from decoded source text.
    pub fn extract_str(self, text: &str, kind: SourceKind) -> Result<QBankResult> {
        self.extract(text, kind)
    }

    fn extract(self, text: &str, kind: SourceKind) -> Result<QBankResult> {
        let mut images = MemoryImageSink::new();
        let extraction = if self.options.extract_images {
            convert::extract_with(text, kind, &self.options, &mut images)?
        } else {
            convert::extract_with(text, kind, &self.options, &mut NullImageSink)?
        };
        Ok(QBankResult {
            extraction,
            images,
            options: self.options,
        })
    }
}

impl Default for QBank {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of extracting a question bank.
pub struct QBankResult {
    /// The extracted sections, statistics and diagnostics
    pub extraction: Extraction,
    /// Stored image payloads, keyed by relative path
    pub images: MemoryImageSink,
    options: ExtractOptions,
}

impl QBankResult {
    /// Serialize with the configured format and layout.
    pub fn to_json(&self) -> Result<String> {
        self.extraction
            .to_json(self.options.json_format, self.options.layout)
    }

    /// The extracted sections.
    pub fn sections(&self) -> &[Section] {
        &self.extraction.sections
    }

    /// Recoverable conditions found during extraction.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.extraction.diagnostics
    }
}
