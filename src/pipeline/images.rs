//! Image storage and color-space normalization.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs;
use std::io::Cursor;
use std::path::{Component, Path, PathBuf};

use crate::error::{Diagnostic, Error, Result};
use crate::model::ImageBlock;

/// Destination for image payloads attached to questions.
pub trait ImageSink {
    /// Store `data` under the relative path `path` (e.g. "images/p1_i1.png").
    fn store(&mut self, path: &str, data: &[u8]) -> Result<()>;

    /// Whether payloads are kept at all.
    ///
    /// A sink returning `false` skips color conversion entirely.
    fn wants_bytes(&self) -> bool {
        true
    }
}

/// Writes images below a root directory, creating parents as needed.
#[derive(Debug, Clone)]
pub struct DirectoryImageStore {
    root: PathBuf,
    written: usize,
}

impl DirectoryImageStore {
    /// Create a store rooted at `root` (usually the output directory).
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            written: 0,
        }
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of images written so far.
    pub fn written(&self) -> usize {
        self.written
    }
}

impl ImageSink for DirectoryImageStore {
    fn store(&mut self, path: &str, data: &[u8]) -> Result<()> {
        if !is_contained(path) {
            return Err(Error::ImageStore {
                path: path.to_string(),
                reason: "path leaves the output directory".to_string(),
            });
        }

        let target = self.root.join(path);
        let store_error = |e: std::io::Error| Error::ImageStore {
            path: path.to_string(),
            reason: e.to_string(),
        };

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(store_error)?;
        }
        fs::write(&target, data).map_err(store_error)?;

        self.written += 1;
        log::debug!("Stored image {} ({} bytes)", target.display(), data.len());
        Ok(())
    }
}

/// A relative path made only of plain components.
fn is_contained(path: &str) -> bool {
    let path = Path::new(path);
    path.components().next().is_some()
        && path
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
}

/// Keeps images in memory, keyed by relative path.
#[derive(Debug, Clone, Default)]
pub struct MemoryImageSink {
    /// Stored payloads
    pub images: BTreeMap<String, Vec<u8>>,
}

impl MemoryImageSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Payload stored under `path`.
    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.images.get(path).map(Vec::as_slice)
    }

    /// Number of stored images.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Check if nothing was stored.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl ImageSink for MemoryImageSink {
    fn store(&mut self, path: &str, data: &[u8]) -> Result<()> {
        self.images.insert(path.to_string(), data.to_vec());
        Ok(())
    }
}

/// Discards payloads; paths are still assigned and referenced.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullImageSink;

impl ImageSink for NullImageSink {
    fn store(&mut self, _path: &str, _data: &[u8]) -> Result<()> {
        Ok(())
    }

    fn wants_bytes(&self) -> bool {
        false
    }
}

/// Relative storage path of the `index`-th image on `page`.
pub fn image_path(prefix: &str, page: u32, index: u32, extension: &str) -> String {
    format!("{}p{}_i{}.{}", prefix, page, index, extension)
}

/// Convert four-component JPEG payloads to RGB before storage.
///
/// Other payloads pass through unchanged. When decoding or re-encoding
/// fails the raw bytes are returned together with a diagnostic.
pub fn normalize_color_space<'a>(
    image: &'a ImageBlock,
    path: &str,
) -> (Cow<'a, [u8]>, Option<Diagnostic>) {
    if !image.is_cmyk_jpeg() {
        return (Cow::Borrowed(&image.data), None);
    }

    match cmyk_jpeg_to_rgb(&image.data) {
        Ok(converted) => {
            log::debug!("{}: converted CMYK JPEG to RGB", path);
            (Cow::Owned(converted), None)
        }
        Err(e) => (
            Cow::Borrowed(&image.data),
            Some(Diagnostic::ColorConversionFailed {
                path: path.to_string(),
                reason: e.to_string(),
            }),
        ),
    }
}

fn cmyk_jpeg_to_rgb(data: &[u8]) -> std::result::Result<Vec<u8>, image::ImageError> {
    let decoded = image::load_from_memory_with_format(data, image::ImageFormat::Jpeg)?;
    let rgb = image::DynamicImage::ImageRgb8(decoded.to_rgb8());

    let mut output = Cursor::new(Vec::new());
    rgb.write_to(&mut output, image::ImageFormat::Jpeg)?;
    Ok(output.into_inner())
}
