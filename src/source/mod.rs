//! Block source adapters.
//!
//! A [`BlockSource`] turns one document into a finite, one-pass sequence of
//! [`Block`]s in document order. Two adapters exist:
//!
//! - [`PaginatedSource`]: block records exported from a paginated document,
//!   one text block per page region (or per page) and one image block per
//!   embedded image.
//! - [`MarkupSource`]: a form page whose numbered table rows become one text
//!   block each, carrying their radio controls.

mod decode;
mod markup;
mod paginated;

pub use decode::{decode_source, read_source};
pub use markup::MarkupSource;
pub use paginated::{BlockRecord, PaginatedSource, RecordKind};

use crate::error::Result;
use crate::model::Block;
use crate::pipeline::AnswerSource;

/// Encoding of a source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Page-ordered text/image block records
    Paginated,
    /// Form page with radio-control table rows
    Markup,
}

impl SourceKind {
    /// The answer extraction strategy for this encoding.
    pub fn answer_source(self) -> AnswerSource {
        match self {
            SourceKind::Paginated => AnswerSource::InlineMarker,
            SourceKind::Markup => AnswerSource::MarkedControl,
        }
    }

    /// Whether this encoding can carry image blocks.
    pub fn has_images(self) -> bool {
        matches!(self, SourceKind::Paginated)
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Paginated => write!(f, "paginated"),
            SourceKind::Markup => write!(f, "markup"),
        }
    }
}

/// A one-pass producer of blocks in document order.
///
/// Adapters never mutate their source; a block that cannot be produced is
/// reported as an `Err` item and ends processing of that document.
pub trait BlockSource: Iterator<Item = Result<Block>> {
    /// Encoding this source reads.
    fn kind(&self) -> SourceKind;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_source_by_kind() {
        assert_eq!(
            SourceKind::Paginated.answer_source(),
            AnswerSource::InlineMarker
        );
        assert_eq!(SourceKind::Markup.answer_source(), AnswerSource::MarkedControl);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(SourceKind::Paginated.to_string(), "paginated");
        assert_eq!(SourceKind::Markup.to_string(), "markup");
        assert!(SourceKind::Paginated.has_images());
        assert!(!SourceKind::Markup.has_images());
    }
}
