//! Record model for extracted question banks.
//!
//! Sources are normalized into a stream of [`Block`]s, and the pipeline folds
//! that stream into the hierarchy [`Section`] → [`Question`] →
//! [`QuestionOption`] / [`ImageRef`]. The model is source-agnostic: both the
//! paginated and the form-page adapters produce the same types.

mod bank;
mod block;

pub use bank::{ImageRef, Question, QuestionOption, Section};
pub use block::{Block, FormControl, FormRow, ImageBlock, TextBlock};
