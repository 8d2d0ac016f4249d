//! Resource locations for images and stylesheets.
//!
//! The engine never fetches over the network itself: a source string is
//! classified here and handed to the host's loader. Local files and `data:`
//! URLs can be read directly.

use std::path::{Path, PathBuf};

use base64::Engine;

/// A parsed `data:` URL.
///
/// [RFC 2397](https://www.rfc-editor.org/rfc/rfc2397)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    /// Media type, e.g. `image/png` (defaults to `text/plain`).
    pub media_type: String,
    /// Whether the payload is base64 encoded.
    pub base64: bool,
    payload: String,
}

impl DataUrl {
    /// Parse a `data:` URL. Returns `None` if the scheme or comma is missing.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let rest = raw.strip_prefix("data:")?;
        let (metadata, payload) = rest.split_once(',')?;
        let base64 = metadata.ends_with(";base64");
        let media_type = metadata
            .split(';')
            .next()
            .filter(|m| !m.is_empty())
            .unwrap_or("text/plain")
            .to_ascii_lowercase();
        Some(Self {
            media_type,
            base64,
            payload: payload.to_string(),
        })
    }

    /// Decode the payload into raw bytes.
    ///
    /// # Errors
    ///
    /// Returns a description when base64 decoding fails.
    pub fn decode(&self) -> Result<Vec<u8>, String> {
        if self.base64 {
            let compact: String = self
                .payload
                .chars()
                .filter(|c| !c.is_ascii_whitespace())
                .collect();
            base64::engine::general_purpose::STANDARD
                .decode(compact)
                .map_err(|e| format!("base64 decode error: {e}"))
        } else {
            Ok(percent_decode(&self.payload))
        }
    }
}

fn percent_decode(input: &str) -> Vec<u8> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(value) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(value);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}

/// Where a resource referenced from the document lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceLocation {
    /// Inline `data:` URL.
    Data(DataUrl),
    /// Local file, already resolved against the document base directory.
    File(PathBuf),
    /// Anything with a network scheme; left to the host's loader.
    Remote(String),
}

impl ResourceLocation {
    /// Classify `src`, resolving relative paths against `base_dir`.
    #[must_use]
    pub fn resolve(src: &str, base_dir: Option<&Path>) -> Self {
        let src = src.trim();
        if let Some(data) = DataUrl::parse(src) {
            return Self::Data(data);
        }
        if let Some(path) = src.strip_prefix("file://") {
            return Self::File(PathBuf::from(path));
        }
        if src.contains("://") || src.starts_with("//") {
            return Self::Remote(src.to_string());
        }
        let path = Path::new(src);
        match base_dir {
            Some(base) if path.is_relative() => Self::File(base.join(path)),
            _ => Self::File(path.to_path_buf()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_url_base64() {
        let url = DataUrl::parse("data:image/png;base64,aGk=").unwrap();
        assert_eq!(url.media_type, "image/png");
        assert_eq!(url.decode().unwrap(), b"hi");
    }

    #[test]
    fn test_data_url_percent_encoded() {
        let url = DataUrl::parse("data:,a%20b").unwrap();
        assert_eq!(url.media_type, "text/plain");
        assert_eq!(url.decode().unwrap(), b"a b");
    }

    #[test]
    fn test_resolve_relative_file() {
        let loc = ResourceLocation::resolve("img/a.png", Some(Path::new("/docs")));
        assert_eq!(loc, ResourceLocation::File(PathBuf::from("/docs/img/a.png")));
        assert!(matches!(
            ResourceLocation::resolve("https://x.org/a.png", None),
            ResourceLocation::Remote(_)
        ));
    }
}
