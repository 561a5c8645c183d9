//! `<img src>` classification and data URL decoding.

use crate::error::{Error, Result};
use crate::model::Resource;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Where an `<img>` points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSrc<'a> {
    /// `data:image/...;base64,` payload
    DataUrl(&'a str),
    /// Absolute `http(s)` URL
    Remote(&'a str),
    /// Anything else that is not empty (relative or local path, other schemes)
    Local(&'a str),
    /// Missing or empty `src`
    Empty,
}

/// Classifies a raw `src` attribute.
pub fn classify_src(src: &str) -> ImageSrc<'_> {
    if src.is_empty() {
        ImageSrc::Empty
    } else if src.starts_with("data:image") && src.contains(";base64,") {
        ImageSrc::DataUrl(src)
    } else if src.starts_with("http://") || src.starts_with("https://") {
        ImageSrc::Remote(src)
    } else {
        ImageSrc::Local(src)
    }
}

/// Decodes a base64 image data URL into a resource.
///
/// The payload must decode and its bytes must be a recognizable image format.
pub fn decode_data_url(src: &str) -> Result<Resource> {
    let (_, payload) = src
        .split_once(";base64,")
        .ok_or_else(|| Error::ImageDecode("not a base64 data URL".into()))?;

    // Some editors wrap long payloads; whitespace is not part of the alphabet
    let payload: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD.decode(payload.as_bytes())?;

    let format = image::guess_format(&bytes)
        .map_err(|e| Error::ImageDecode(format!("unrecognized image data: {}", e)))?;

    Ok(Resource::image(bytes, format.to_mime_type()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Smallest valid PNG: a 1x1 transparent pixel.
    pub(crate) const PNG_1X1: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    #[test]
    fn test_classify_src() {
        assert_eq!(classify_src(""), ImageSrc::Empty);
        assert!(matches!(
            classify_src("data:image/png;base64,AAAA"),
            ImageSrc::DataUrl(_)
        ));
        assert!(matches!(
            classify_src("https://example.org/a.png"),
            ImageSrc::Remote(_)
        ));
        assert!(matches!(classify_src("images/a.png"), ImageSrc::Local(_)));
        // Data URL without base64 marker is treated as an opaque source
        assert!(matches!(
            classify_src("data:image/svg+xml,<svg/>"),
            ImageSrc::Local(_)
        ));
    }

    #[test]
    fn test_decode_valid_png() {
        let resource = decode_data_url(&format!("data:image/png;base64,{}", PNG_1X1)).unwrap();
        assert_eq!(resource.mime_type.as_deref(), Some("image/png"));
        assert_eq!(resource.extension(), "png");
        assert!(resource.size > 0);
    }

    #[test]
    fn test_decode_corrupt_payload() {
        let result = decode_data_url("data:image/png;base64,!!!not-base64!!!");
        assert!(matches!(result, Err(Error::ImageDecode(_))));
    }

    #[test]
    fn test_decode_non_image_bytes() {
        // "hello world" decodes fine but is not an image
        let result = decode_data_url("data:image/png;base64,aGVsbG8gd29ybGQ=");
        assert!(matches!(result, Err(Error::ImageDecode(_))));
    }
}
