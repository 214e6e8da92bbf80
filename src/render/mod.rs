//! Rendering module for serializing question banks.

mod json;
mod result;

pub use json::{record_count, to_json, JsonFormat, OutputLayout};
pub use result::ExtractionStats;
