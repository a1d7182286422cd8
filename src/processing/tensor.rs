//! # Normalized Image Tensor
//!
//! The pipeline's interchange format: `f32` samples in `[0.0, 1.0]`, laid out
//! as `(height, width, channel)` with one or three channels. At the pipeline
//! boundary the tensor carries an extra leading batch axis of size 1.

use ndarray::{Array3, Array4, ArrayViewD, Axis};

use crate::error::{BridgeError, Result};

/// A decoded image in channel-last, normalized floating-point form.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedImage {
    pixels: Array3<f32>,
}

impl NormalizedImage {
    /// Wrap an `(H, W, C)` array.
    ///
    /// Samples outside `[0, 1]` are clamped so the range invariant always holds.
    ///
    /// # Errors
    /// - `Encode` when the channel count is not 1 or 3
    pub fn new(mut pixels: Array3<f32>) -> Result<Self> {
        let channels = pixels.shape()[2];
        if channels != 1 && channels != 3 {
            return Err(BridgeError::Encode(format!(
                "expected 1 or 3 channels, got {}",
                channels
            )));
        }

        pixels.mapv_inplace(|v| v.clamp(0.0, 1.0));
        Ok(Self { pixels })
    }

    /// Strip the batch axis from a `(1, H, W, C)` pipeline tensor.
    pub fn from_batched(batch: Array4<f32>) -> Result<Self> {
        if batch.shape()[0] != 1 {
            return Err(BridgeError::Encode(format!(
                "expected a batch of one image, got {}",
                batch.shape()[0]
            )));
        }
        Self::new(batch.index_axis_move(Axis(0), 0))
    }

    /// Add the leading batch axis, yielding `(1, H, W, C)`.
    pub fn into_batched(self) -> Array4<f32> {
        self.pixels.insert_axis(Axis(0))
    }

    pub fn height(&self) -> usize {
        self.pixels.shape()[0]
    }

    pub fn width(&self) -> usize {
        self.pixels.shape()[1]
    }

    pub fn channels(&self) -> usize {
        self.pixels.shape()[2]
    }

    pub fn pixels(&self) -> &Array3<f32> {
        &self.pixels
    }

    /// Dynamic-rank view, the shape [`ImageCodec::encode`](super::ImageCodec::encode) accepts.
    pub fn as_tensor(&self) -> ArrayViewD<'_, f32> {
        self.pixels.view().into_dyn()
    }
}
