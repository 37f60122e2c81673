//! Stylize request descriptor

use serde::{Deserialize, Serialize};

use crate::error::{Result, StyleError};

/// Style to apply and how strongly to blend it over the original
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleRequest {
    pub style_id: String,
    /// Blend weight of the stylized image, 0.0 (original) to 1.0 (stylized)
    pub strength: f32,
}

impl StyleRequest {
    pub fn new(style_id: impl Into<String>, strength: f32) -> Self {
        Self {
            style_id: style_id.into(),
            strength,
        }
    }

    /// Request at full strength
    pub fn full(style_id: impl Into<String>) -> Self {
        Self::new(style_id, 1.0)
    }

    /// Reject strengths outside [0, 1], including NaN
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.strength) {
            return Err(StyleError::InvalidStrength {
                strength: self.strength,
            });
        }
        Ok(())
    }
}
