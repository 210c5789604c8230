use crate::utils::IdCardError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, GrayImage};
use imageproc::contrast::adaptive_threshold;
use imageproc::filter::gaussian_blur_f32;
use std::path::Path;

/// Blur strength roughly equivalent to a 3x3 Gaussian kernel.
const BLUR_SIGMA: f32 = 0.8;
/// Neighbourhood radius for thresholding (11 pixel block).
const THRESHOLD_BLOCK_RADIUS: u32 = 5;

pub struct ImageProcessor;

impl ImageProcessor {
    /// Decodes base64 image data, with or without a `data:image/...;base64,` prefix.
    pub fn decode_base64(encoded: &str) -> Result<DynamicImage, IdCardError> {
        let payload = match encoded.split_once(',') {
            Some((_, data)) => data,
            None => encoded,
        };
        let payload: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        if payload.is_empty() {
            return Err(IdCardError::ImageDecoding("Image data is empty".to_string()));
        }

        let bytes = STANDARD
            .decode(payload.as_bytes())
            .map_err(|e| IdCardError::ImageDecoding(format!("Invalid base64 data: {}", e)))?;
        Self::decode_bytes(&bytes)
    }

    pub fn decode_bytes(bytes: &[u8]) -> Result<DynamicImage, IdCardError> {
        image::load_from_memory(bytes)
            .map_err(|e| IdCardError::ImageDecoding(format!("Failed to decode image: {}", e)))
    }

    pub fn open(image_path: &Path) -> Result<DynamicImage, IdCardError> {
        image::open(image_path)
            .map_err(|e| IdCardError::ImageDecoding(format!("Failed to open image: {}", e)))
    }

    /// Grayscale, light blur, then adaptive threshold to give the OCR engine
    /// clean black-on-white text.
    pub fn preprocess(img: &DynamicImage) -> GrayImage {
        let gray = img.to_luma8();
        let blurred = gaussian_blur_f32(&gray, BLUR_SIGMA);
        adaptive_threshold(&blurred, THRESHOLD_BLOCK_RADIUS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, ImageOutputFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let mut img = RgbImage::new(24, 12);
        for (x, _, pixel) in img.enumerate_pixels_mut() {
            *pixel = if x < 12 { Rgb([20, 20, 20]) } else { Rgb([240, 240, 240]) };
        }
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_decode_plain_base64() {
        let encoded = STANDARD.encode(png_bytes());
        let img = ImageProcessor::decode_base64(&encoded).unwrap();
        assert_eq!(GenericImageView::dimensions(&img), (24, 12));
    }

    #[test]
    fn test_decode_data_url() {
        let encoded = format!("data:image/png;base64,{}", STANDARD.encode(png_bytes()));
        assert!(ImageProcessor::decode_base64(&encoded).is_ok());
    }

    #[test]
    fn test_decode_failures() {
        assert!(matches!(
            ImageProcessor::decode_base64("data:image/png;base64,"),
            Err(IdCardError::ImageDecoding(_))
        ));
        assert!(matches!(
            ImageProcessor::decode_base64("not base64 at all!"),
            Err(IdCardError::ImageDecoding(_))
        ));
        let not_an_image = STANDARD.encode(b"plain text, not pixels");
        assert!(matches!(
            ImageProcessor::decode_base64(&not_an_image),
            Err(IdCardError::ImageDecoding(_))
        ));
    }

    #[test]
    fn test_preprocess_keeps_dimensions() {
        let img = ImageProcessor::decode_bytes(&png_bytes()).unwrap();
        let processed = ImageProcessor::preprocess(&img);
        assert_eq!(processed.dimensions(), (24, 12));
        assert!(processed.pixels().all(|p| p[0] == 0 || p[0] == 255));
    }
}
