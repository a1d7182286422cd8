//! # Image Processing
//!
//! Conversion between the pipeline's normalized tensors and encoded image bytes.

pub mod codec;
pub mod tensor;

pub use codec::{ImageCodec, DEFAULT_JPEG_QUALITY};
pub use tensor::NormalizedImage;
