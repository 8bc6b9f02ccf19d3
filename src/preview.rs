//! Screenshot preview decoding.
//!
//! OBS hands screenshots back as a data URI ("data:image/jpg;base64,...").
//! This strips the prefix, base64-decodes the payload and decodes the
//! image into raw RGBA for upload as a GUI texture.

use anyhow::{Context, Result};
use base64::Engine;

/// Decoded preview pixels, tightly packed RGBA.
#[derive(Debug, Clone)]
pub struct PreviewImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Decode a base64 data URI (or bare base64 string) into RGBA pixels.
pub fn decode_data_uri(data: &str) -> Result<PreviewImage> {
    // "data:image/jpg;base64,<payload>" -> "<payload>"
    let payload = match data.split_once("base64,") {
        Some((_, payload)) => payload,
        None => data,
    };

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .context("Failed to base64-decode screenshot data")?;

    let image = image::load_from_memory(&bytes).context("Failed to decode screenshot image")?;
    let rgba = image.to_rgba8();

    Ok(PreviewImage {
        width: rgba.width(),
        height: rgba.height(),
        rgba: rgba.into_raw(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png_data_uri() -> String {
        let mut img = image::RgbaImage::new(2, 2);
        img.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        img.put_pixel(1, 1, image::Rgba([0, 200, 0, 255]));

        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .expect("encode test png");

        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&bytes)
        )
    }

    #[test]
    fn decodes_data_uri_with_prefix() {
        let preview = decode_data_uri(&png_data_uri()).expect("decode");
        assert_eq!(preview.width, 2);
        assert_eq!(preview.height, 2);
        assert_eq!(preview.rgba.len(), 2 * 2 * 4);
        // First pixel is the red one from the fixture.
        assert_eq!(&preview.rgba[0..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn decodes_bare_base64_without_prefix() {
        let uri = png_data_uri();
        let (_, payload) = uri.split_once("base64,").unwrap();
        let preview = decode_data_uri(payload).expect("decode");
        assert_eq!(preview.width, 2);
    }

    #[test]
    fn invalid_payload_is_an_error() {
        assert!(decode_data_uri("data:image/jpg;base64,!!!not-base64!!!").is_err());
        // Valid base64 but not an image
        let garbage = base64::engine::general_purpose::STANDARD.encode(b"not an image");
        assert!(decode_data_uri(&garbage).is_err());
    }
}
