//! QR code rendering for the account-linking UI.

use image::Luma;
use qrcode::QrCode;
use thiserror::Error;

pub const DEFAULT_SIZE: u32 = 200;
pub const MIN_SIZE: u32 = 64;
pub const MAX_SIZE: u32 = 1024;

#[derive(Debug, Error)]
pub enum QrError {
    #[error("failed to create QR code: {0}")]
    Encode(String),

    #[error("failed to encode QR code PNG: {0}")]
    Png(String),
}

/// Render `data` as a QR code PNG with roughly `size` pixels per side.
pub fn render_png(data: &str, size: u32) -> Result<Vec<u8>, QrError> {
    let size = size.clamp(MIN_SIZE, MAX_SIZE);

    let code = QrCode::new(data.as_bytes()).map_err(|e| QrError::Encode(e.to_string()))?;
    let image = code
        .render::<Luma<u8>>()
        .min_dimensions(size, size)
        .build();

    let mut png_bytes: Vec<u8> = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
    image::ImageEncoder::write_image(
        encoder,
        image.as_raw(),
        image.width(),
        image.height(),
        image::ExtendedColorType::L8,
    )
    .map_err(|e| QrError::Png(e.to_string()))?;

    Ok(png_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_valid_png_bytes() {
        let png = render_png("https://mythos.example/link/abc123", DEFAULT_SIZE).unwrap();
        assert!(png.len() > 8);
        assert_eq!(&png[..4], &[0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn renders_short_data() {
        let png = render_png("hi", DEFAULT_SIZE).unwrap();
        assert!(!png.is_empty());
        assert_eq!(&png[..4], &[0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn size_is_clamped() {
        // A request far above the cap must not allocate a huge image.
        let png = render_png("clamped", 1 << 20).unwrap();
        assert!(!png.is_empty());
    }

    #[test]
    fn oversized_data_is_an_error() {
        let data = "x".repeat(8000);
        assert!(matches!(render_png(&data, DEFAULT_SIZE), Err(QrError::Encode(_))));
    }
}
