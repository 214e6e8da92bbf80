//! Paginated block record source.
//!
//! The upstream page extractor writes one record per text region or image,
//! in page order:
//!
//! ```json
//! {"page": 3, "kind": "text", "text": "1. ..."}
//! {"page": 3, "kind": "image", "image_bytes": "<base64>", "image_format": "jpeg", "color_space": 4}
//! ```
//!
//! Records may be given as a JSON array or as JSON Lines.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{Block, ImageBlock, TextBlock};

use super::{BlockSource, SourceKind};

/// Kind of a block record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// Text region
    Text,
    /// Embedded image
    Image,
}

/// One block record as written by the page extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    /// Page number (1-indexed)
    pub page: u32,

    /// Record kind
    pub kind: RecordKind,

    /// Text content (text records)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Encoded image bytes, base64 in JSON (image records)
    #[serde(
        default,
        with = "base64_bytes",
        skip_serializing_if = "Option::is_none"
    )]
    pub image_bytes: Option<Vec<u8>>,

    /// Image format tag (e.g. "jpeg", "png")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_format: Option<String>,

    /// Number of color components
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_space: Option<i64>,
}

impl BlockRecord {
    /// Create a text record.
    pub fn text(page: u32, text: impl Into<String>) -> Self {
        Self {
            page,
            kind: RecordKind::Text,
            text: Some(text.into()),
            image_bytes: None,
            image_format: None,
            color_space: None,
        }
    }

    /// Create an image record.
    pub fn image(page: u32, bytes: Vec<u8>, format: impl Into<String>) -> Self {
        Self {
            page,
            kind: RecordKind::Image,
            text: None,
            image_bytes: Some(bytes),
            image_format: Some(format.into()),
            color_space: None,
        }
    }

    /// Set the color-space component count.
    pub fn with_color_space(mut self, components: i64) -> Self {
        self.color_space = Some(components);
        self
    }
}

impl TryFrom<BlockRecord> for Block {
    type Error = Error;

    fn try_from(record: BlockRecord) -> Result<Self> {
        match record.kind {
            RecordKind::Text => Ok(Block::Text(TextBlock::new(
                record.page,
                record.text.unwrap_or_default(),
            ))),
            RecordKind::Image => {
                let data = record.image_bytes.ok_or_else(|| Error::InvalidBlockRecord {
                    page: record.page,
                    reason: "image record without image_bytes".to_string(),
                })?;
                let mut image =
                    ImageBlock::new(record.page, data, record.image_format.unwrap_or_default());
                image.color_space = record.color_space;
                Ok(Block::Image(image))
            }
        }
    }
}

/// Block source over paginated block records.
pub struct PaginatedSource {
    blocks: Box<dyn Iterator<Item = Result<Block>> + Send>,
}

impl PaginatedSource {
    /// Parse a record stream (JSON array or JSON Lines).
    pub fn from_json(text: &str) -> Result<Self> {
        let records: Vec<BlockRecord> = if text.trim_start().starts_with('[') {
            serde_json::from_str(text)?
        } else {
            serde_json::Deserializer::from_str(text)
                .into_iter::<BlockRecord>()
                .collect::<std::result::Result<_, _>>()?
        };
        log::debug!("Parsed {} block records", records.len());
        Ok(Self::from_records(records))
    }

    /// Create a source over already-parsed records.
    pub fn from_records(records: Vec<BlockRecord>) -> Self {
        Self {
            blocks: Box::new(records.into_iter().map(Block::try_from)),
        }
    }

    /// Create a source with one text block per page, pages numbered from 1.
    pub fn from_pages<I, S>(pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let blocks: Vec<Block> = pages
            .into_iter()
            .enumerate()
            .map(|(i, text)| Block::text(i as u32 + 1, text))
            .collect();
        Self::from_blocks(blocks)
    }

    /// Create a source over prepared blocks.
    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        Self {
            blocks: Box::new(blocks.into_iter().map(Ok)),
        }
    }
}

impl Iterator for PaginatedSource {
    type Item = Result<Block>;

    fn next(&mut self) -> Option<Self::Item> {
        self.blocks.next()
    }
}

impl BlockSource for PaginatedSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Paginated
    }
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        bytes: &Option<Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(bytes) => serializer.serialize_str(&BASE64.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error> {
        let encoded: Option<String> = Option::deserialize(deserializer)?;
        encoded
            .map(|s| BASE64.decode(s.trim()).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_array() {
        let json = r#"[
            {"page": 1, "kind": "text", "text": "1. 題目(2)"},
            {"page": 1, "kind": "image", "image_bytes": "/9j/", "image_format": "jpeg", "color_space": 4}
        ]"#;
        let blocks: Vec<Block> = PaginatedSource::from_json(json)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0], Block::text(1, "1. 題目(2)"));
        match &blocks[1] {
            Block::Image(image) => {
                assert_eq!(image.data, vec![0xFF, 0xD8, 0xFF]);
                assert!(image.is_cmyk_jpeg());
            }
            other => panic!("expected image, got {:?}", other),
        }
    }

    #[test]
    fn test_from_json_lines() {
        let json = "{\"page\": 1, \"kind\": \"text\", \"text\": \"a\"}\n{\"page\": 2, \"kind\": \"text\", \"text\": \"b\"}\n";
        let source = PaginatedSource::from_json(json).unwrap();
        assert_eq!(source.kind(), SourceKind::Paginated);

        let pages: Vec<u32> = source.map(|b| b.unwrap().page()).collect();
        assert_eq!(pages, vec![1, 2]);
    }

    #[test]
    fn test_image_record_without_bytes() {
        let json = r#"[{"page": 4, "kind": "image"}]"#;
        let mut source = PaginatedSource::from_json(json).unwrap();
        let err = source.next().unwrap().unwrap_err();
        assert!(matches!(err, Error::InvalidBlockRecord { page: 4, .. }));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            PaginatedSource::from_json("[{\"page\": }]"),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn test_record_serialization_uses_base64() {
        let record = BlockRecord::image(2, vec![0xFF, 0xD8, 0xFF], "jpeg").with_color_space(4);
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"image_bytes\":\"/9j/\""));
        assert!(json.contains("\"kind\":\"image\""));
        assert!(!json.contains("\"text\""));
    }

    #[test]
    fn test_out_of_range_color_space_is_accepted() {
        let json = r#"[{"page": 1, "kind": "image", "image_bytes": "/9j/", "image_format": "jpeg", "color_space": 300}]"#;
        let blocks: Vec<Block> = PaginatedSource::from_json(json)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();

        match &blocks[0] {
            Block::Image(image) => {
                assert_eq!(image.color_space, Some(300));
                assert!(!image.is_cmyk_jpeg());
            }
            other => panic!("expected image, got {:?}", other),
        }
    }

    #[test]
    fn test_from_pages() {
        let source = PaginatedSource::from_pages(["first", "second"]);
        let blocks: Vec<Block> = source.map(|b| b.unwrap()).collect();
        assert_eq!(blocks, vec![Block::text(1, "first"), Block::text(2, "second")]);
    }
}
