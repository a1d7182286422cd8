//! # Image Codec
//!
//! The one place where 8-bit and floating-point samples meet, and where
//! channel-first tensors are turned channel-last.
//!
//! ## Decoding
//! 1. Parse the bytes with any format the `image` crate recognizes
//! 2. Force RGB
//! 3. Divide every sample by 255
//!
//! ## Encoding
//! 1. Drop a singleton batch axis, if present
//! 2. Transpose `(C, H, W)` to `(H, W, C)` when the leading axis is 1 or 3
//! 3. Scale by 255, clamp to `[0, 255]`, truncate to `u8`
//! 4. Write baseline JPEG at the configured quality

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GrayImage, RgbImage};
use ndarray::{Array3, ArrayViewD, Axis};

use super::tensor::NormalizedImage;
use crate::error::{BridgeError, Result};

/// Quality the bridge writes when no configuration says otherwise.
pub const DEFAULT_JPEG_QUALITY: u8 = 75;

/// Converts between [`NormalizedImage`] tensors and encoded image bytes.
#[derive(Debug, Clone, Copy)]
pub struct ImageCodec {
    jpeg_quality: u8,
}

impl Default for ImageCodec {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY)
    }
}

impl ImageCodec {
    /// Create a codec writing JPEG at `jpeg_quality` (clamped to 1..=100).
    pub fn new(jpeg_quality: u8) -> Self {
        Self {
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }

    /// Decode image bytes into a 3-channel normalized image.
    ///
    /// # Errors
    /// - `Decode` when the bytes are not a recognizable image or are truncated
    pub fn decode(&self, bytes: &[u8]) -> Result<NormalizedImage> {
        let rgb = image::load_from_memory(bytes)
            .map_err(|e| BridgeError::Decode(e.to_string()))?
            .to_rgb8();
        let (width, height) = rgb.dimensions();

        let samples: Vec<f32> = rgb
            .into_raw()
            .into_iter()
            .map(|v| f32::from(v) / 255.0)
            .collect();

        let pixels = Array3::from_shape_vec((height as usize, width as usize, 3), samples)
            .map_err(|e| BridgeError::Decode(e.to_string()))?;

        NormalizedImage::new(pixels)
    }

    /// Encode a pipeline tensor as JPEG bytes.
    ///
    /// Accepts `(H, W)`, `(H, W, C)`, `(C, H, W)` and any of those behind a
    /// singleton batch axis, with `C` in {1, 3}.
    ///
    /// # Errors
    /// - `Encode` when the shape is not image-shaped or the JPEG writer fails
    pub fn encode(&self, tensor: ArrayViewD<'_, f32>) -> Result<Vec<u8>> {
        let image = self.to_dynamic_image(tensor)?;

        let mut jpeg = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut jpeg, self.jpeg_quality);
        encoder
            .encode(image.as_bytes(), image.width(), image.height(), image.color())
            .map_err(|e| BridgeError::Encode(e.to_string()))?;

        Ok(jpeg)
    }

    /// Quantize a pipeline tensor into an 8-bit image without compressing it.
    pub fn to_dynamic_image(&self, tensor: ArrayViewD<'_, f32>) -> Result<DynamicImage> {
        let mut view = tensor;

        if view.ndim() == 4 && view.shape()[0] == 1 {
            view = view.index_axis_move(Axis(0), 0);
        }

        // Leading 1 or 3 means channel-first.
        if view.ndim() == 3 && matches!(view.shape()[0], 1 | 3) {
            view = view.permuted_axes(vec![1, 2, 0]);
        }

        let (height, width, channels) = match *view.shape() {
            [h, w] => (h, w, 1),
            [h, w, c] if c == 1 || c == 3 => (h, w, c),
            _ => {
                return Err(BridgeError::Encode(format!(
                    "array of shape {:?} is not image data",
                    view.shape()
                )))
            }
        };

        let width = u32::try_from(width).map_err(|e| BridgeError::Encode(e.to_string()))?;
        let height = u32::try_from(height).map_err(|e| BridgeError::Encode(e.to_string()))?;

        let samples: Vec<u8> = view
            .iter()
            .map(|&v| (v * 255.0).clamp(0.0, 255.0) as u8)
            .collect();

        let image = if channels == 1 {
            GrayImage::from_raw(width, height, samples).map(DynamicImage::ImageLuma8)
        } else {
            RgbImage::from_raw(width, height, samples).map(DynamicImage::ImageRgb8)
        };

        image.ok_or_else(|| {
            BridgeError::Encode(format!(
                "sample buffer does not fill a {}x{} image",
                width, height
            ))
        })
    }
}
