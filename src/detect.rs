//! Source kind detection.

use std::path::Path;

use crate::error::{Error, Result};
use crate::source::SourceKind;

/// Extensions of exported block record streams.
const PAGINATED_EXTENSIONS: &[&str] = &["json", "jsonl", "ndjson"];

/// Extensions of form pages.
const MARKUP_EXTENSIONS: &[&str] = &["html", "htm", "asp", "aspx", "xhtml"];

/// Detect the source kind from a file extension.
///
/// # Example
/// ```
/// use qbank::detect::detect_kind_from_path;
/// use qbank::source::SourceKind;
///
/// assert_eq!(detect_kind_from_path("bank/11900.json"), Some(SourceKind::Paginated));
/// assert_eq!(detect_kind_from_path("exam.asp"), Some(SourceKind::Markup));
/// assert_eq!(detect_kind_from_path("notes.txt"), None);
/// ```
pub fn detect_kind_from_path<P: AsRef<Path>>(path: P) -> Option<SourceKind> {
    let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();

    if PAGINATED_EXTENSIONS.contains(&ext.as_str()) {
        Some(SourceKind::Paginated)
    } else if MARKUP_EXTENSIONS.contains(&ext.as_str()) {
        Some(SourceKind::Markup)
    } else {
        None
    }
}

/// Detect the source kind from decoded content.
///
/// Record streams start with `[` or `{`; form pages start with `<`.
pub fn detect_kind_from_content(text: &str) -> Option<SourceKind> {
    match text.trim_start_matches('\u{feff}').trim_start().chars().next()? {
        '[' | '{' => Some(SourceKind::Paginated),
        '<' => Some(SourceKind::Markup),
        _ => None,
    }
}

/// Detect the source kind, preferring the extension over content sniffing.
pub fn detect_kind<P: AsRef<Path>>(path: P, text: &str) -> Result<SourceKind> {
    let path = path.as_ref();
    detect_kind_from_path(path)
        .or_else(|| detect_kind_from_content(text))
        .ok_or_else(|| Error::UnknownSourceKind(path.display().to_string()))
}
