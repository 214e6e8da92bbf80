//! Extraction options and configuration.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::render::{JsonFormat, OutputLayout};
use crate::source::SourceKind;

/// Options for extracting a question bank.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Source kind; `None` detects it from path and content
    pub source_kind: Option<SourceKind>,

    /// Whether to store images attached to questions
    pub extract_images: bool,

    /// Prefix of relative image paths
    pub image_prefix: String,

    /// JSON formatting
    pub json_format: JsonFormat,

    /// Output record layout
    pub layout: OutputLayout,

    /// Whether batch conversion runs documents in parallel
    pub parallel: bool,

    /// Cooperative cancellation flag, checked at block boundaries
    pub cancel: Option<Arc<AtomicBool>>,
}

impl ExtractOptions {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Force the source kind instead of detecting it.
    pub fn with_source_kind(mut self, kind: SourceKind) -> Self {
        self.source_kind = Some(kind);
        self
    }

    /// Enable or disable image storage.
    pub fn with_images(mut self, extract: bool) -> Self {
        self.extract_images = extract;
        self
    }

    /// Set the image path prefix.
    pub fn with_image_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.image_prefix = prefix.into();
        self
    }

    /// Set JSON formatting.
    pub fn with_json_format(mut self, format: JsonFormat) -> Self {
        self.json_format = format;
        self
    }

    /// Emit compact JSON.
    pub fn compact(mut self) -> Self {
        self.json_format = JsonFormat::Compact;
        self
    }

    /// Set the output layout.
    pub fn with_layout(mut self, layout: OutputLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Disable parallel batch processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Install a cancellation flag.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            source_kind: None,
            extract_images: true,
            image_prefix: "images/".to_string(),
            json_format: JsonFormat::Pretty,
            layout: OutputLayout::Bank,
            parallel: true,
            cancel: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_options_builder() {
        let options = ExtractOptions::new()
            .with_source_kind(SourceKind::Markup)
            .with_images(false)
            .with_layout(OutputLayout::Review)
            .compact()
            .sequential();

        assert_eq!(options.source_kind, Some(SourceKind::Markup));
        assert!(!options.extract_images);
        assert_eq!(options.layout, OutputLayout::Review);
        assert_eq!(options.json_format, JsonFormat::Compact);
        assert!(!options.parallel);
    }

    #[test]
    fn test_default_options() {
        let options = ExtractOptions::default();
        assert!(options.source_kind.is_none());
        assert!(options.extract_images);
        assert_eq!(options.image_prefix, "images/");
        assert!(options.parallel);
        assert!(!options.is_cancelled());
    }

    #[test]
    fn test_cancel_flag() {
        let flag = Arc::new(AtomicBool::new(false));
        let options = ExtractOptions::new().with_cancel_flag(flag.clone());
        assert!(!options.is_cancelled());
        flag.store(true, Ordering::Relaxed);
        assert!(options.is_cancelled());
    }
}
