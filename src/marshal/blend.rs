//! Strength blending
//!
//! Mixes the stylized image back with the original:
//! `out = strength * stylized + (1 - strength) * original`, per RGB channel.

use super::pixels::{PixelBuffer, OPAQUE, RGBA_CHANNELS};
use crate::error::{Result, StyleError};

/// Linearly interpolate `stylized` over `original`.
///
/// Neither input is modified. Alpha is always written fully opaque.
/// `strength` is clamped to [0, 1].
pub fn blend(original: &PixelBuffer, stylized: &PixelBuffer, strength: f32) -> Result<PixelBuffer> {
    if !original.same_dimensions(stylized) || original.data.len() != stylized.data.len() {
        return Err(StyleError::shape(format!(
            "cannot blend {}x{} ({} bytes) with {}x{} ({} bytes)",
            original.width,
            original.height,
            original.data.len(),
            stylized.width,
            stylized.height,
            stylized.data.len()
        )));
    }
    original.validate()?;

    let s = strength.clamp(0.0, 1.0);
    let s1 = 1.0 - s;

    let mut out = vec![0u8; stylized.data.len()];
    for ((dst, orig), styl) in out
        .chunks_exact_mut(RGBA_CHANNELS)
        .zip(original.data.chunks_exact(RGBA_CHANNELS))
        .zip(stylized.data.chunks_exact(RGBA_CHANNELS))
    {
        for c in 0..3 {
            let mixed = s1 * orig[c] as f32 + s * styl[c] as f32;
            dst[c] = mixed.round().clamp(0.0, 255.0) as u8;
        }
        dst[3] = OPAQUE;
    }

    Ok(PixelBuffer::new(out, original.width, original.height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn original() -> PixelBuffer {
        PixelBuffer::new(vec![0, 100, 200, 40, 255, 255, 255, 0], 2, 1)
    }

    fn stylized() -> PixelBuffer {
        PixelBuffer::new(vec![200, 100, 0, 255, 55, 0, 155, 255], 2, 1)
    }

    #[test]
    fn test_full_strength_is_stylized() {
        let out = blend(&original(), &stylized(), 1.0).unwrap();
        assert_eq!(out, stylized());
    }

    #[test]
    fn test_zero_strength_is_original_with_opaque_alpha() {
        let out = blend(&original(), &stylized(), 0.0).unwrap();
        assert_eq!(out.data, vec![0, 100, 200, 255, 255, 255, 255, 255]);
    }

    #[test]
    fn test_half_strength_interpolates() {
        let out = blend(&original(), &stylized(), 0.5).unwrap();
        assert_eq!(out.data, vec![100, 100, 100, 255, 155, 128, 205, 255]);
    }

    #[test]
    fn test_inputs_untouched() {
        let orig = original();
        let styl = stylized();
        let _ = blend(&orig, &styl, 0.25).unwrap();
        assert_eq!(orig, original());
        assert_eq!(styl, stylized());
    }

    #[test]
    fn test_mismatched_dimensions_rejected() {
        let other = PixelBuffer::filled(1, 2, [0, 0, 0, 255]);
        let err = blend(&original(), &other, 0.5).unwrap_err();
        assert!(matches!(err, StyleError::Shape { .. }));
    }
}
