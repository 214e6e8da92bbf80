//! Block-level types produced by source adapters.

/// A unit of document content in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// A run of text
    Text(TextBlock),

    /// An embedded raster image
    Image(ImageBlock),
}

impl Block {
    /// Create a plain text block.
    pub fn text(page: u32, content: impl Into<String>) -> Self {
        Block::Text(TextBlock::new(page, content))
    }

    /// Create an image block with no color-space hint.
    pub fn image(page: u32, data: Vec<u8>, format: impl Into<String>) -> Self {
        Block::Image(ImageBlock::new(page, data, format))
    }

    /// Page this block came from (1-indexed).
    pub fn page(&self) -> u32 {
        match self {
            Block::Text(t) => t.page,
            Block::Image(i) => i.page,
        }
    }

    /// Check if this block is text.
    pub fn is_text(&self) -> bool {
        matches!(self, Block::Text(_))
    }

    /// Check if this block is an image.
    pub fn is_image(&self) -> bool {
        matches!(self, Block::Image(_))
    }
}

/// Text content from one page region or one form row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlock {
    /// Page number (1-indexed)
    pub page: u32,

    /// Raw text content
    pub content: String,

    /// Form controls when the block is a form-page row
    pub form: Option<FormRow>,
}

impl TextBlock {
    /// Create a text block without form controls.
    pub fn new(page: u32, content: impl Into<String>) -> Self {
        Self {
            page,
            content: content.into(),
            form: None,
        }
    }

    /// Attach the controls of a form row.
    pub fn with_form(mut self, form: FormRow) -> Self {
        self.form = Some(form);
        self
    }
}

/// An embedded image and the hints needed to store it.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageBlock {
    /// Page number (1-indexed)
    pub page: u32,

    /// Encoded image bytes
    pub data: Vec<u8>,

    /// Format tag reported by the extractor (e.g. "jpeg", "png")
    pub format: Option<String>,

    /// Number of color components, when known
    pub color_space: Option<i64>,
}

impl ImageBlock {
    /// Create a new image block.
    pub fn new(page: u32, data: Vec<u8>, format: impl Into<String>) -> Self {
        let format = format.into();
        Self {
            page,
            data,
            format: (!format.is_empty()).then_some(format),
            color_space: None,
        }
    }

    /// Set the color-space component count.
    pub fn with_color_space(mut self, components: i64) -> Self {
        self.color_space = Some(components);
        self
    }

    /// File extension for the stored image.
    ///
    /// Uses the format tag when it is 1-8 ASCII letters or digits, otherwise
    /// sniffs magic bytes.
    pub fn extension(&self) -> String {
        if let Some(ref format) = self.format {
            let format = format.trim().trim_start_matches('.').to_ascii_lowercase();
            if is_format_tag(&format) {
                return format;
            }
        }
        Self::sniff_extension(&self.data).unwrap_or("bin").to_string()
    }

    /// Whether this is a JPEG carrying four color components (CMYK).
    pub fn is_cmyk_jpeg(&self) -> bool {
        self.color_space == Some(4) && matches!(self.extension().as_str(), "jpeg" | "jpg")
    }

    /// Detect an extension from data magic bytes.
    pub fn sniff_extension(data: &[u8]) -> Option<&'static str> {
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some("jpeg");
        }
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some("png");
        }
        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Some("gif");
        }
        if data.starts_with(&[0x49, 0x49, 0x2A, 0x00]) || data.starts_with(&[0x4D, 0x4D, 0x00, 0x2A])
        {
            return Some("tiff");
        }
        if data.starts_with(b"BM") {
            return Some("bmp");
        }
        if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some("webp");
        }
        if data.starts_with(&[0x00, 0x00, 0x00, 0x0C, 0x6A, 0x50, 0x20, 0x20]) {
            return Some("jp2");
        }
        None
    }
}

fn is_format_tag(format: &str) -> bool {
    (1..=8).contains(&format.len())
        && format
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
}

impl std::fmt::Debug for ImageBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageBlock")
            .field("page", &self.page)
            .field("bytes", &self.data.len())
            .field("format", &self.format)
            .field("color_space", &self.color_space)
            .finish()
    }
}

/// The selectable controls of one form-page row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormRow {
    /// Identifier from the row's number cell
    pub number: String,

    /// Radio controls in document order
    pub controls: Vec<FormControl>,

    /// Value of the row's designated correct control, if present
    pub correct: Option<String>,
}

/// One radio control and the text surrounding it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormControl {
    /// The control's `value` attribute
    pub value: String,

    /// Text of the control's enclosing element (non-breaking spaces kept)
    pub fragment: String,

    /// Text of the node right after the control, if any
    pub trailing: Option<String>,
}

impl FormControl {
    /// Create a control with its enclosing fragment text.
    pub fn new(value: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            fragment: fragment.into(),
            trailing: None,
        }
    }

    /// Set the trailing sibling text.
    pub fn with_trailing(mut self, trailing: impl Into<String>) -> Self {
        self.trailing = Some(trailing.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_variants() {
        let text = Block::text(1, "1. question");
        assert!(text.is_text());
        assert_eq!(text.page(), 1);

        let img = Block::image(2, vec![0xFF, 0xD8, 0xFF], "jpeg");
        assert!(img.is_image());
        assert_eq!(img.page(), 2);
    }

    #[test]
    fn test_image_extension() {
        let tagged = ImageBlock::new(1, vec![], "PNG");
        assert_eq!(tagged.extension(), "png");

        let sniffed = ImageBlock::new(1, vec![0xFF, 0xD8, 0xFF, 0xE0], "");
        assert_eq!(sniffed.extension(), "jpeg");

        let unknown = ImageBlock::new(1, vec![0x00, 0x01], "");
        assert_eq!(unknown.extension(), "bin");
    }

    #[test]
    fn test_format_tag_with_path_characters_is_ignored() {
        let escaping = ImageBlock::new(
            1,
            vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A],
            "png/../../../escaped.txt",
        );
        assert_eq!(escaping.extension(), "png");

        let unknown = ImageBlock::new(1, vec![0x00], "../x");
        assert_eq!(unknown.extension(), "bin");

        let too_long = ImageBlock::new(1, vec![0x00], "averylongtag");
        assert_eq!(too_long.extension(), "bin");
    }

    #[test]
    fn test_cmyk_detection() {
        let cmyk = ImageBlock::new(1, vec![], "jpeg").with_color_space(4);
        assert!(cmyk.is_cmyk_jpeg());

        let rgb = ImageBlock::new(1, vec![], "jpeg").with_color_space(3);
        assert!(!rgb.is_cmyk_jpeg());

        let png = ImageBlock::new(1, vec![], "png").with_color_space(4);
        assert!(!png.is_cmyk_jpeg());
    }
}
