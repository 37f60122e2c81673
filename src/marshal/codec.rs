//! Pixel <-> tensor codec
//!
//! `encode` turns interleaved RGBA (H, W, C) bytes into a planar
//! (1, 3, H, W) float tensor; `decode` reverses it. Alpha is dropped on the
//! way in and re-inserted fully opaque on the way out.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::pixels::{PixelBuffer, OPAQUE, RGBA_CHANNELS};
use super::tensor::{Tensor, MODEL_CHANNELS};
use crate::error::{Result, StyleError};

/// Value range a model expects for its float input and produces as output.
///
/// This is pinned in configuration. A mismatch with the model silently
/// produces washed-out or saturated images rather than an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Normalization {
    /// Channel values in [0, 1] (byte / 255)
    #[default]
    Unit,
    /// Channel values in [0, 255] (byte as-is)
    Byte,
}

impl Normalization {
    /// Largest float value corresponding to a full-intensity channel
    pub fn max_value(&self) -> f32 {
        match self {
            Normalization::Unit => 1.0,
            Normalization::Byte => 255.0,
        }
    }

    #[inline]
    fn to_float(self, byte: u8) -> f32 {
        match self {
            Normalization::Unit => byte as f32 / 255.0,
            Normalization::Byte => byte as f32,
        }
    }

    /// Out-of-range values are clamped, not wrapped. NaN maps to 0.
    ///
    /// Rounds to the nearest byte rather than truncating toward zero, so an
    /// encode/decode pass reproduces every byte exactly under both ranges.
    #[inline]
    fn to_byte(self, value: f32) -> u8 {
        let scaled = match self {
            Normalization::Unit => value * 255.0,
            Normalization::Byte => value,
        };
        scaled.clamp(0.0, 255.0).round() as u8
    }
}

impl fmt::Display for Normalization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Normalization::Unit => f.write_str("unit"),
            Normalization::Byte => f.write_str("byte"),
        }
    }
}

impl FromStr for Normalization {
    type Err = StyleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "unit" | "0-1" => Ok(Normalization::Unit),
            "byte" | "0-255" => Ok(Normalization::Byte),
            other => Err(StyleError::Config {
                reason: format!("unknown normalization '{}' (expected unit or byte)", other),
            }),
        }
    }
}

/// Convert an RGBA pixel buffer into a normalized (1, 3, H, W) tensor.
///
/// # Errors
/// `Shape` if the buffer length does not equal width x height x 4.
pub fn encode(pixels: &PixelBuffer, normalization: Normalization) -> Result<Tensor> {
    pixels.validate()?;

    // validate() guarantees data.len() == width * height * 4
    let size = pixels.data.len() / RGBA_CHANNELS;
    let mut out = vec![0f32; MODEL_CHANNELS * size];
    let (r_plane, rest) = out.split_at_mut(size);
    let (g_plane, b_plane) = rest.split_at_mut(size);

    for (i, px) in pixels.data.chunks_exact(RGBA_CHANNELS).enumerate() {
        r_plane[i] = normalization.to_float(px[0]);
        g_plane[i] = normalization.to_float(px[1]);
        b_plane[i] = normalization.to_float(px[2]);
    }

    Tensor::new(
        Tensor::image_shape(pixels.height as usize, pixels.width as usize),
        out,
    )
}

/// Convert a (1, 3, H, W) model output back into an opaque RGBA buffer.
///
/// # Errors
/// `Shape` if the tensor does not hold exactly 3 x width x height values.
pub fn decode(
    tensor: &Tensor,
    width: u32,
    height: u32,
    normalization: Normalization,
) -> Result<PixelBuffer> {
    let size = (width as usize)
        .checked_mul(height as usize)
        .filter(|size| size.checked_mul(RGBA_CHANNELS).is_some());
    let (size, expected) = match size {
        Some(0) => {
            return Err(StyleError::shape(format!(
                "cannot decode into empty dimensions {}x{}",
                width, height
            )))
        }
        Some(size) => (size, size * MODEL_CHANNELS),
        None => {
            return Err(StyleError::shape(format!(
                "cannot decode into {}x{}: too large to address",
                width, height
            )))
        }
    };
    if tensor.len() != expected {
        return Err(StyleError::shape(format!(
            "decoding {}x{} needs {} tensor elements, got {}",
            width,
            height,
            expected,
            tensor.len()
        )));
    }

    let data = tensor.data();
    let (r_plane, rest) = data.split_at(size);
    let (g_plane, b_plane) = rest.split_at(size);

    let mut out = vec![0u8; size * RGBA_CHANNELS];
    for (i, px) in out.chunks_exact_mut(RGBA_CHANNELS).enumerate() {
        px[0] = normalization.to_byte(r_plane[i]);
        px[1] = normalization.to_byte(g_plane[i]);
        px[2] = normalization.to_byte(b_plane[i]);
        px[3] = OPAQUE;
    }

    Ok(PixelBuffer::new(out, width, height))
}
