//! Image preprocessing
//!
//! base64 payload -> image bytes -> RGB bitmap -> 224x224 -> normalized CHW floats
//! -> `[1, 3, H, W]` tensor on the target device.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use burn::tensor::{backend::Backend, Tensor, TensorData};
use image::{DynamicImage, Rgb, RgbImage};
use tracing::debug;

use crate::utils::error::{InferenceError, Result, ResultExt};

/// ImageNet normalization mean values (RGB)
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// ImageNet normalization std values (RGB)
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Standard alphabet, padding optional
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Drop a `data:<mime>;base64,` prefix if the caller sent a data URL
fn strip_data_url(payload: &str) -> &str {
    let trimmed = payload.trim();
    match trimmed.strip_prefix("data:") {
        Some(rest) => rest
            .split_once(";base64,")
            .map(|(_, data)| data)
            .unwrap_or(trimmed),
        None => trimmed,
    }
}

/// Decode a base64 payload into raw image bytes
pub fn decode_payload(payload: &str) -> Result<Vec<u8>> {
    let compact: String = strip_data_url(payload)
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    if compact.is_empty() {
        return Err(InferenceError::Preprocessing("empty image payload".into()));
    }

    PAYLOAD_ENGINE.decode(compact.as_bytes()).preprocessing("invalid base64")
}

/// Decode image bytes of any supported format
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes).preprocessing("undecodable image")
}

/// PIL-compatible bilinear resize with anti-aliasing.
///
/// For downscaling, uses a scaled triangle filter with support radius
/// equal to the scale factor.
pub fn pil_bilinear_resize(img: &DynamicImage, target_width: u32, target_height: u32) -> RgbImage {
    let src = img.to_rgb8();
    let src_width = src.width() as usize;
    let src_height = src.height() as usize;
    let target_width = target_width as usize;
    let target_height = target_height as usize;

    let mut dst = RgbImage::new(target_width as u32, target_height as u32);

    let x_scale = src_width as f32 / target_width as f32;
    let y_scale = src_height as f32 / target_height as f32;

    let support_x = x_scale.max(1.0);
    let support_y = y_scale.max(1.0);

    for dy in 0..target_height {
        for dx in 0..target_width {
            // Center of output pixel in source coordinates
            let src_cx = (dx as f32 + 0.5) * x_scale;
            let src_cy = (dy as f32 + 0.5) * y_scale;

            let x_min = (src_cx - support_x).floor().max(0.0) as usize;
            let x_max = (src_cx + support_x).ceil().min(src_width as f32 - 1.0) as usize;
            let y_min = (src_cy - support_y).floor().max(0.0) as usize;
            let y_max = (src_cy + support_y).ceil().min(src_height as f32 - 1.0) as usize;

            let mut total_weight = 0.0f32;
            let mut weighted_sum = [0.0f32; 3];

            for sy in y_min..=y_max {
                for sx in x_min..=x_max {
                    let dist_x = ((sx as f32 + 0.5) - src_cx).abs() / support_x;
                    let dist_y = ((sy as f32 + 0.5) - src_cy).abs() / support_y;

                    if dist_x < 1.0 && dist_y < 1.0 {
                        let weight = (1.0 - dist_x) * (1.0 - dist_y);

                        let pixel = src.get_pixel(sx as u32, sy as u32);
                        weighted_sum[0] += pixel[0] as f32 * weight;
                        weighted_sum[1] += pixel[1] as f32 * weight;
                        weighted_sum[2] += pixel[2] as f32 * weight;
                        total_weight += weight;
                    }
                }
            }

            if total_weight > 0.0 {
                dst.put_pixel(
                    dx as u32,
                    dy as u32,
                    Rgb([
                        (weighted_sum[0] / total_weight).round() as u8,
                        (weighted_sum[1] / total_weight).round() as u8,
                        (weighted_sum[2] / total_weight).round() as u8,
                    ]),
                );
            }
        }
    }

    dst
}

/// Scale to [0, 1] and apply ImageNet normalization
/// Returns CHW layout: [C, H, W] flattened
pub fn normalize_image(rgb: &RgbImage) -> Vec<f32> {
    let (width, height) = rgb.dimensions();
    let num_pixels = (width * height) as usize;

    let mut normalized = vec![0.0f32; 3 * num_pixels];

    for (i, pixel) in rgb.pixels().enumerate() {
        for c in 0..3 {
            normalized[c * num_pixels + i] =
                (pixel[c] as f32 / 255.0 - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
        }
    }

    normalized
}

/// Turns encoded payloads into model-ready tensors
#[derive(Debug, Clone, Copy)]
pub struct Preprocessor {
    pub image_size: u32,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self {
            image_size: crate::IMAGE_SIZE as u32,
        }
    }
}

impl Preprocessor {
    pub fn new(image_size: u32) -> Self {
        Self { image_size }
    }

    /// Resize and normalize an already decoded image
    pub fn preprocess_image(&self, image: &DynamicImage) -> Vec<f32> {
        let resized = pil_bilinear_resize(image, self.image_size, self.image_size);
        normalize_image(&resized)
    }

    /// Decode raw image bytes and produce normalized CHW floats
    pub fn preprocess_bytes(&self, bytes: &[u8]) -> Result<Vec<f32>> {
        let image = decode_image(bytes)?;
        debug!(
            "Decoded {}x{} image ({:?})",
            image.width(),
            image.height(),
            image.color()
        );
        Ok(self.preprocess_image(&image))
    }

    /// Decode a base64 payload and produce normalized CHW floats
    pub fn preprocess(&self, payload: &str) -> Result<Vec<f32>> {
        let bytes = decode_payload(payload)?;
        self.preprocess_bytes(&bytes)
    }

    /// Wrap normalized CHW floats into a `[1, 3, H, W]` tensor on `device`
    pub fn to_tensor<B: Backend>(&self, chw: Vec<f32>, device: &B::Device) -> Result<Tensor<B, 4>> {
        let side = self.image_size as usize;
        let expected = 3 * side * side;
        if chw.len() != expected {
            return Err(InferenceError::Preprocessing(format!(
                "expected {} values, got {}",
                expected,
                chw.len()
            )));
        }

        let data = TensorData::new(chw, [1, 3, side, side]);
        Ok(Tensor::<B, 4>::from_data(data, device))
    }

    /// Full pipeline from base64 payload to device tensor
    pub fn payload_to_tensor<B: Backend>(&self, payload: &str, device: &B::Device) -> Result<Tensor<B, 4>> {
        let chw = self.preprocess(payload)?;
        self.to_tensor(chw, device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InferenceBackend as TestBackend;
    use base64::engine::general_purpose::STANDARD;
    use image::ImageFormat;
    use std::io::Cursor;

    fn encode_png(image: RgbImage) -> String {
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(image)
            .write_to(&mut buffer, ImageFormat::Png)
            .unwrap();
        STANDARD.encode(buffer.into_inner())
    }

    fn expected(value: u8, channel: usize) -> f32 {
        (value as f32 / 255.0 - IMAGENET_MEAN[channel]) / IMAGENET_STD[channel]
    }

    #[test]
    fn test_uniform_image_tensor_shape_and_values() {
        let payload = encode_png(RgbImage::from_pixel(64, 48, Rgb([255, 0, 128])));
        let device = Default::default();

        let tensor = Preprocessor::default()
            .payload_to_tensor::<TestBackend>(&payload, &device)
            .unwrap();
        assert_eq!(tensor.dims(), [1, 3, 224, 224]);

        let values: Vec<f32> = tensor.into_data().to_vec().unwrap();
        let plane = 224 * 224;
        let sample = 100 * 224 + 37;
        assert!((values[sample] - expected(255, 0)).abs() < 1e-4);
        assert!((values[plane + sample] - expected(0, 1)).abs() < 1e-4);
        assert!((values[2 * plane + sample] - expected(128, 2)).abs() < 1e-4);
        assert!((values[sample] - 2.2489).abs() < 1e-3);
    }

    #[test]
    fn test_values_stay_in_normalized_range() {
        let gradient = RgbImage::from_fn(300, 200, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        });
        let values = Preprocessor::default().preprocess(&encode_png(gradient)).unwrap();

        let min = (0.0 - 0.485) / 0.229 - 1e-4;
        let max = (1.0 - 0.406) / 0.225 + 1e-4;
        assert_eq!(values.len(), 3 * 224 * 224);
        assert!(values.iter().all(|&v| v >= min && v <= max));
    }

    #[test]
    fn test_data_url_and_whitespace_are_accepted() {
        let payload = encode_png(RgbImage::from_pixel(8, 8, Rgb([10, 20, 30])));
        let (head, tail) = payload.split_at(payload.len() / 2);
        let wrapped = format!("data:image/png;base64,{}\n{}", head, tail);

        assert!(decode_payload(&wrapped).is_ok());
        assert_eq!(decode_payload(&wrapped).unwrap(), decode_payload(&payload).unwrap());
    }

    #[test]
    fn test_missing_padding_is_accepted() {
        let padded = STANDARD.encode(b"leaf");
        assert!(padded.ends_with('='));
        let unpadded = padded.trim_end_matches('=');
        assert_eq!(decode_payload(unpadded).unwrap(), b"leaf");
    }

    #[test]
    fn test_malformed_base64_is_preprocessing_error() {
        let err = Preprocessor::default().preprocess("not*base64!!").unwrap_err();
        assert_eq!(err.stage(), "preprocessing");
        assert!(err.to_string().starts_with("Failed to preprocess image"));
    }

    #[test]
    fn test_non_image_bytes_are_preprocessing_error() {
        let payload = STANDARD.encode(b"this is plain text, not a picture");
        let err = Preprocessor::default().preprocess(&payload).unwrap_err();
        assert!(err.to_string().contains("undecodable image"));
    }

    #[test]
    fn test_empty_payload_is_rejected() {
        assert!(decode_payload("   ").is_err());
    }

    #[test]
    fn test_resize_upscales_tiny_image() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(1, 1, Rgb([200, 100, 50])));
        let resized = pil_bilinear_resize(&img, 224, 224);
        assert_eq!(resized.dimensions(), (224, 224));
        assert_eq!(resized.get_pixel(223, 0), &Rgb([200, 100, 50]));
    }
}
