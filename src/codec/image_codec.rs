use std::io::Cursor;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use image::{DynamicImage, GrayImage, ImageOutputFormat};
use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

/// A data-URI style image string: `<media-type prefix>,<base64 payload>`.
///
/// Opaque until [`decode`] is called; nothing is validated on construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedImage(String);

impl EncodedImage {
    pub fn new(data: impl Into<String>) -> Self {
        EncodedImage(data.into())
    }

    /// Wraps raw image file bytes as `data:<media_type>;base64,<payload>`.
    pub fn from_image_bytes(media_type: &str, bytes: &[u8]) -> Self {
        EncodedImage(format!("data:{};base64,{}", media_type, BASE64.encode(bytes)))
    }

    /// Encodes a grayscale image as a PNG data URI.
    pub fn from_gray_image(image: &GrayImage) -> Result<Self, DecodeError> {
        let mut bytes = Cursor::new(Vec::new());
        DynamicImage::ImageLuma8(image.clone()).write_to(&mut bytes, ImageOutputFormat::Png)?;
        Ok(EncodedImage::from_image_bytes("image/png", bytes.get_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Everything before the first comma, e.g. `data:image/png;base64`.
    pub fn media_type(&self) -> Option<&str> {
        self.0.split_once(',').map(|(prefix, _)| prefix)
    }
}

impl From<String> for EncodedImage {
    fn from(data: String) -> Self {
        EncodedImage(data)
    }
}

/// Single-channel 8-bit pixel grid of arbitrary size.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelGrid {
    image: GrayImage,
}

impl PixelGrid {
    pub fn from_image(image: GrayImage) -> Self {
        PixelGrid { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.image
    }
}

/// Strips the media-type prefix, base64-decodes the payload, and parses the
/// bytes as PNG/JPEG/BMP/GIF converted to grayscale.
pub fn decode(encoded: &EncodedImage) -> Result<PixelGrid, DecodeError> {
    let (_, payload) = encoded.as_str()
        .split_once(',')
        .ok_or(DecodeError::MissingSeparator)?;

    let payload = payload.trim();
    if payload.is_empty() {
        return Err(DecodeError::EmptyPayload);
    }

    let bytes = BASE64.decode(payload)?;
    let image = image::load_from_memory(&bytes)?;
    Ok(PixelGrid::from_image(image.to_luma8()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, RgbImage, Rgb};

    #[test]
    fn decodes_png_data_uri() {
        let src = GrayImage::from_fn(5, 3, |x, y| Luma([(x * 40 + y) as u8]));
        let encoded = EncodedImage::from_gray_image(&src).unwrap();
        assert_eq!(encoded.media_type(), Some("data:image/png;base64"));

        let grid = decode(&encoded).unwrap();
        assert_eq!((grid.width(), grid.height()), (5, 3));
        assert_eq!(grid.as_image(), &src);
    }

    #[test]
    fn color_images_become_grayscale() {
        let rgb = RgbImage::from_pixel(4, 4, Rgb([255, 255, 255]));
        let mut bytes = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(rgb).write_to(&mut bytes, ImageOutputFormat::Png).unwrap();
        let encoded = EncodedImage::from_image_bytes("image/png", bytes.get_ref());

        let grid = decode(&encoded).unwrap();
        assert!(grid.as_image().pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn missing_comma_is_rejected() {
        let err = decode(&EncodedImage::new("data:image/png;base64")).unwrap_err();
        assert!(matches!(err, DecodeError::MissingSeparator));
    }

    #[test]
    fn only_first_comma_separates() {
        // A comma inside the payload is not valid base64.
        let err = decode(&EncodedImage::new("data:image/png;base64,AAAA,BBBB")).unwrap_err();
        assert!(matches!(err, DecodeError::Base64(_)));
    }

    #[test]
    fn invalid_base64_is_rejected() {
        let err = decode(&EncodedImage::new("data:image/png;base64,@@not base64@@")).unwrap_err();
        assert!(matches!(err, DecodeError::Base64(_)));
    }

    #[test]
    fn empty_payload_is_rejected() {
        let err = decode(&EncodedImage::new("data:image/png;base64,  ")).unwrap_err();
        assert!(matches!(err, DecodeError::EmptyPayload));
    }

    #[test]
    fn non_image_bytes_are_rejected() {
        let encoded = EncodedImage::from_image_bytes("image/png", b"just some text");
        let err = decode(&encoded).unwrap_err();
        assert!(matches!(err, DecodeError::Image(_)));
    }

    #[test]
    fn deserializes_from_plain_json_string() {
        let encoded: EncodedImage = serde_json::from_str(r#""data:x,AAAA""#).unwrap();
        assert_eq!(encoded.as_str(), "data:x,AAAA");
    }
}
