//! Reading source files with an encoding fallback.

use std::borrow::Cow;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Read a source file as text.
///
/// Fails with [`Error::SourceNotFound`] when the path does not exist.
pub fn read_source<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::SourceNotFound(path.to_path_buf()));
    }

    let bytes = fs::read(path)?;
    decode_source(path, &bytes).map(Cow::into_owned)
}

/// Decode source bytes as UTF-8, falling back to Big5.
///
/// `path` is only used for diagnostics.
pub fn decode_source<'a>(path: &Path, bytes: &'a [u8]) -> Result<Cow<'a, str>> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    if let Ok(text) = std::str::from_utf8(bytes) {
        return Ok(Cow::Borrowed(text));
    }

    match encoding_rs::BIG5.decode_without_bom_handling_and_without_replacement(bytes) {
        Some(text) => {
            log::warn!("{} is not UTF-8, decoded as Big5", path.display());
            Ok(text)
        }
        None => Err(Error::Decoding {
            path: path.to_path_buf(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_utf8() {
        let text = decode_source(Path::new("a.html"), "工作項目".as_bytes()).unwrap();
        assert_eq!(text, "工作項目");
        assert!(matches!(text, Cow::Borrowed(_)));
    }

    #[test]
    fn test_decode_strips_bom() {
        let text = decode_source(Path::new("a.json"), b"\xEF\xBB\xBF[]").unwrap();
        assert_eq!(text, "[]");
    }

    #[test]
    fn test_decode_big5_fallback() {
        // "題庫" in Big5
        let bytes = [0xC3, 0x44, 0xAE, 0x77];
        let text = decode_source(Path::new("a.asp"), &bytes).unwrap();
        assert_eq!(text, "題庫");
    }

    #[test]
    fn test_decode_failure() {
        // 0xFF never starts a Big5 sequence and is invalid UTF-8
        let result = decode_source(Path::new("bad.asp"), &[0x41, 0xFF, 0xFF]);
        assert!(matches!(result, Err(Error::Decoding { .. })));
    }

    #[test]
    fn test_read_source_missing() {
        let result = read_source("/definitely/not/here.json");
        assert!(matches!(result, Err(Error::SourceNotFound(_))));
    }
}
