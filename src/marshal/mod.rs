//! Tensor Marshalling
//!
//! Conversion between the display side and the model side:
//! - Pixel buffers (interleaved RGBA, 8-bit)
//! - Tensors (planar NCHW, 32-bit float)
//! - Encode/decode with a pinned normalization
//! - Strength blending of stylized output with the original image

pub mod blend;
pub mod codec;
pub mod pixels;
pub mod tensor;

pub use blend::blend;
pub use codec::{decode, encode, Normalization};
pub use pixels::PixelBuffer;
pub use tensor::Tensor;
