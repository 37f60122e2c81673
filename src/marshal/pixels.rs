//! Pixel Buffer
//!
//! Interleaved RGBA image data as produced by a rendering surface.

use crate::error::{Result, StyleError};

/// Bytes per pixel in an RGBA buffer
pub const RGBA_CHANNELS: usize = 4;

/// Fully opaque alpha value
pub const OPAQUE: u8 = 255;

/// An interleaved 8-bit RGBA image.
///
/// The buffer is treated as input-only by the bridge: every transform
/// produces a new buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl PixelBuffer {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
        }
    }

    /// Create a buffer filled with a single RGBA color
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = (width as usize).saturating_mul(height as usize);
        Self {
            data: rgba.repeat(pixels),
            width,
            height,
        }
    }

    /// Number of pixels (width x height), `None` if it overflows `usize`
    pub fn num_pixels(&self) -> Option<usize> {
        (self.width as usize).checked_mul(self.height as usize)
    }

    /// Expected byte length for the declared dimensions, `None` on overflow
    pub fn expected_len(&self) -> Option<usize> {
        self.num_pixels()?.checked_mul(RGBA_CHANNELS)
    }

    /// Check dimensions are non-zero and the data length matches them
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(StyleError::shape(format!(
                "pixel buffer has empty dimensions {}x{}",
                self.width, self.height
            )));
        }
        let expected = self.expected_len().ok_or_else(|| {
            StyleError::shape(format!(
                "pixel buffer of {}x{} is too large to address",
                self.width, self.height
            ))
        })?;
        if self.data.len() != expected {
            return Err(StyleError::shape(format!(
                "pixel buffer of {}x{} needs {} bytes, got {}",
                self.width,
                self.height,
                expected,
                self.data.len()
            )));
        }
        Ok(())
    }

    /// RGBA value of the pixel at (x, y)
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * RGBA_CHANNELS;
        let px = self.data.get(idx..idx + RGBA_CHANNELS)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Whether two buffers have identical dimensions
    pub fn same_dimensions(&self, other: &PixelBuffer) -> bool {
        self.width == other.width && self.height == other.height
    }
}
