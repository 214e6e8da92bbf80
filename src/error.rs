//! Error types for qbank.
//!
//! [`Error`] covers the conditions that abort processing of a document.
//! Recoverable conditions found while segmenting a document are not errors;
//! they are reported as [`Diagnostic`] values alongside the extracted sections.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for qbank operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort processing of a single document.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading sources or writing output.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The source path does not exist.
    #[error("Source not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// The source could be read under neither the primary nor the fallback encoding.
    #[error("Cannot decode {} as UTF-8 or Big5", .path.display())]
    Decoding {
        /// Path of the undecodable source
        path: PathBuf,
    },

    /// The source kind could not be determined from the path or content.
    #[error("Unknown source kind: {0}")]
    UnknownSourceKind(String),

    /// Malformed JSON in a paginated block record stream.
    #[error("Block record stream error: {0}")]
    Json(#[from] serde_json::Error),

    /// A block record is well-formed JSON but inconsistent with its kind.
    #[error("Invalid block record on page {page}: {reason}")]
    InvalidBlockRecord {
        /// Page the record claims to belong to
        page: u32,
        /// What is wrong with it
        reason: String,
    },

    /// An image could not be written to its storage path.
    #[error("Image store error for {path}: {reason}")]
    ImageStore {
        /// Relative storage path of the image
        path: String,
        /// Underlying failure
        reason: String,
    },

    /// Error while serializing the question bank.
    #[error("Rendering error: {0}")]
    Render(String),

    /// Processing was cancelled at a block boundary.
    #[error("Extraction cancelled after {0} blocks")]
    Cancelled(usize),
}

/// A recoverable condition encountered while building the question bank.
///
/// Each diagnostic is resolved locally with a well-defined default; none of
/// them interrupts the pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A question appeared while no section was open; it was dropped.
    #[error("page {page}: question {number} has no open section, dropped")]
    MissingSectionContext { page: u32, number: String },

    /// No answer marker was found; the answer is left empty.
    #[error("question {number}: no answer marker")]
    UnresolvedAnswerMarker { number: String },

    /// No text pattern matched for an option; a placeholder was substituted.
    #[error("question {number}: option {value} has no label, using placeholder")]
    UnresolvedOptionText { number: String, value: String },

    /// A number marker ended its block with no body; it was discarded.
    #[error("page {page}: question marker {number} has no body, discarded")]
    TrailingIncompleteQuestion { page: u32, number: String },

    /// Text before the first number marker of a block; it was discarded.
    #[error("page {page}: {chars} characters before the first question marker discarded")]
    LeadingFragment { page: u32, chars: usize },

    /// An image arrived with no question to attach to; it was dropped.
    #[error("page {page}: image {index} has no question to attach to, dropped")]
    OrphanImage { page: u32, index: u32 },

    /// A question number did not increase over its predecessor.
    #[error("section {section}: question {number} follows {previous}")]
    OutOfOrderQuestionNumber {
        section: String,
        previous: String,
        number: String,
    },

    /// A question number repeated within its section; the repeat was dropped.
    #[error("section {section}: duplicate question {number} dropped")]
    DuplicateQuestionNumber { section: String, number: String },

    /// An option value repeated within a question; the repeat was dropped.
    #[error("question {number}: duplicate option value {value} dropped")]
    DuplicateOptionValue { number: String, value: String },

    /// A CMYK image could not be converted; the raw bytes were stored.
    #[error("{path}: color conversion failed ({reason}), stored as-is")]
    ColorConversionFailed { path: String, reason: String },
}

impl Diagnostic {
    /// Emit this diagnostic through the `log` facade.
    pub fn log(&self) {
        match self {
            Diagnostic::UnresolvedAnswerMarker { .. } | Diagnostic::LeadingFragment { .. } => {
                log::debug!("{}", self)
            }
            _ => log::warn!("{}", self),
        }
    }

    /// Whether this diagnostic means source content was discarded.
    pub fn drops_content(&self) -> bool {
        matches!(
            self,
            Diagnostic::MissingSectionContext { .. }
                | Diagnostic::TrailingIncompleteQuestion { .. }
                | Diagnostic::LeadingFragment { .. }
                | Diagnostic::OrphanImage { .. }
                | Diagnostic::DuplicateQuestionNumber { .. }
                | Diagnostic::DuplicateOptionValue { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::SourceNotFound(PathBuf::from("missing.json"));
        assert_eq!(err.to_string(), "Source not found: missing.json");

        let err = Error::InvalidBlockRecord {
            page: 3,
            reason: "image record without image_bytes".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid block record on page 3: image record without image_bytes"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::OrphanImage { page: 2, index: 1 };
        assert_eq!(
            diag.to_string(),
            "page 2: image 1 has no question to attach to, dropped"
        );
        assert!(diag.drops_content());
        assert!(!Diagnostic::UnresolvedAnswerMarker {
            number: "4".into()
        }
        .drops_content());
    }
}
