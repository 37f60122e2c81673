//! Tensor
//!
//! A flat float32 buffer tagged with an NCHW shape.

use crate::error::{Result, StyleError};

/// Channels consumed and produced by style-transfer models (RGB)
pub const MODEL_CHANNELS: usize = 3;

/// Batch size; inference always runs on a single image
pub const BATCH: usize = 1;

/// A float32 tensor in (N, C, H, W) order.
///
/// The element count always equals the product of the shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    data: Vec<f32>,
    shape: [usize; 4],
}

impl Tensor {
    /// Wrap `data` with `shape`, failing if the element count disagrees
    pub fn new(shape: [usize; 4], data: Vec<f32>) -> Result<Self> {
        let expected = Self::element_count(shape).ok_or_else(|| {
            StyleError::shape(format!("tensor shape {:?} overflows the element count", shape))
        })?;
        if data.len() != expected {
            return Err(StyleError::shape(format!(
                "tensor of shape {:?} needs {} elements, got {}",
                shape,
                expected,
                data.len()
            )));
        }
        Ok(Self { data, shape })
    }

    /// Product of `shape`, `None` if it overflows `usize`
    pub fn element_count(shape: [usize; 4]) -> Option<usize> {
        shape.iter().try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
    }

    /// Shape for a single RGB image of the given size
    pub fn image_shape(height: usize, width: usize) -> [usize; 4] {
        [BATCH, MODEL_CHANNELS, height, width]
    }

    pub fn shape(&self) -> [usize; 4] {
        self.shape
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Consume the tensor, returning the flat NCHW buffer
    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    /// Spatial plane for channel `c` of batch item 0
    pub fn plane(&self, c: usize) -> Option<&[f32]> {
        let [_, channels, h, w] = self.shape;
        if c >= channels {
            return None;
        }
        let size = h * w;
        self.data.get(c * size..(c + 1) * size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_wrong_length() {
        let err = Tensor::new([1, 3, 2, 2], vec![0.0; 11]).unwrap_err();
        assert!(matches!(err, StyleError::Shape { .. }));
    }

    #[test]
    fn test_new_rejects_overflowing_shape() {
        let err = Tensor::new([1 << 16; 4], Vec::new()).unwrap_err();
        assert!(matches!(err, StyleError::Shape { .. }));
        assert_eq!(Tensor::element_count([usize::MAX, 2, 1, 1]), None);
        assert_eq!(Tensor::element_count([1, 3, 4, 0]), Some(0));
    }

    #[test]
    fn test_planes() {
        let data: Vec<f32> = (0..12).map(|v| v as f32).collect();
        let tensor = Tensor::new(Tensor::image_shape(2, 2), data).unwrap();

        assert_eq!(tensor.plane(0), Some(&[0.0, 1.0, 2.0, 3.0][..]));
        assert_eq!(tensor.plane(2), Some(&[8.0, 9.0, 10.0, 11.0][..]));
        assert_eq!(tensor.plane(3), None);
    }
}
