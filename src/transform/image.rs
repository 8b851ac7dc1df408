//! Lossless PNG recompression.

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ImageFormat, ImageResult};

/// Re-encode a PNG at maximum compression with adaptive filtering.
///
/// Pixels are decoded and re-encoded without loss. Returns `None` when the
/// result is not smaller than the input (already optimized, or metadata that
/// the re-encode expands).
pub fn optimize_png(bytes: &[u8]) -> ImageResult<Option<Vec<u8>>> {
    let img = image::load_from_memory_with_format(bytes, ImageFormat::Png)?;
    let mut out = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut out, CompressionType::Best, FilterType::Adaptive);
    img.write_with_encoder(encoder)?;
    Ok((out.len() < bytes.len()).then_some(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::png::{CompressionType, FilterType};
    use image::{Rgba, RgbaImage};

    fn encode(img: &RgbaImage, compression: CompressionType) -> Vec<u8> {
        let mut out = Vec::new();
        let encoder = PngEncoder::new_with_quality(&mut out, compression, FilterType::NoFilter);
        image::DynamicImage::ImageRgba8(img.clone())
            .write_with_encoder(encoder)
            .unwrap();
        out
    }

    #[test]
    fn test_optimize_png_is_lossless_and_smaller() {
        let img = RgbaImage::from_fn(64, 64, |x, y| Rgba([(x * 4) as u8, (y * 4) as u8, 128, 255]));
        let input = encode(&img, CompressionType::Fast);

        let optimized = optimize_png(&input).unwrap().unwrap();
        assert!(optimized.len() < input.len());

        let decoded = image::load_from_memory(&optimized).unwrap().to_rgba8();
        assert_eq!(decoded, img);
    }

    #[test]
    fn test_optimize_png_rejects_non_png() {
        assert!(optimize_png(b"GIF89a not a png").is_err());
    }
}
