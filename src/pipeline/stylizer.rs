//! Compute-side stylize pipeline
//!
//! pixels -> encode -> bridge -> decode -> blend -> pixels

use std::sync::Arc;

use tracing::{debug, warn};

use super::generation::{LatestOutput, Submission};
use super::request::StyleRequest;
use crate::bridge::BridgeClient;
use crate::error::{Result, StyleError};
use crate::marshal::{blend, decode, encode, Normalization, PixelBuffer, Tensor};
use crate::neural::StyleRegistry;

/// Turns pixel buffers into stylized pixel buffers via the bridge
#[derive(Debug, Clone)]
pub struct Stylizer {
    bridge: BridgeClient,
    registry: Arc<StyleRegistry>,
    normalization: Normalization,
}

impl Stylizer {
    pub fn new(
        bridge: BridgeClient,
        registry: Arc<StyleRegistry>,
        normalization: Normalization,
    ) -> Self {
        Self {
            bridge,
            registry,
            normalization,
        }
    }

    pub fn client(&self) -> &BridgeClient {
        &self.bridge
    }

    pub fn normalization(&self) -> Normalization {
        self.normalization
    }

    /// Stylize `pixels` as described by `request`.
    ///
    /// `pixels` is left untouched; the result has the same dimensions and
    /// is fully opaque.
    ///
    /// # Errors
    /// `InvalidStrength` for a strength outside [0, 1], `Shape` for a
    /// malformed buffer, and any host failure as `Bridge` with its kind.
    pub async fn stylize(&self, pixels: &PixelBuffer, request: &StyleRequest) -> Result<PixelBuffer> {
        request.validate()?;
        pixels.validate()?;

        if let Ok(entry) = self.registry.lookup(&request.style_id) {
            if entry.exceeds_recommended(pixels.width, pixels.height) {
                warn!(
                    style = %request.style_id,
                    width = pixels.width,
                    height = pixels.height,
                    recommended = entry.recommended_pixels,
                    "Image exceeds the style's recommended size; inference may be slow"
                );
            }
        }

        let tensor = encode(pixels, self.normalization)?;
        let shape = tensor.shape();
        let [n, c, h, w] = shape;

        let output = self
            .bridge
            .call_host_inference(
                &request.style_id,
                tensor.into_data(),
                dim(n)?,
                dim(c)?,
                dim(h)?,
                dim(w)?,
            )
            .await?;

        let output = Tensor::new(shape, output)?;
        let stylized = decode(&output, pixels.width, pixels.height, self.normalization)?;

        debug!(style = %request.style_id, strength = request.strength, "Blending stylized output");
        if request.strength >= 1.0 {
            return Ok(stylized);
        }
        blend(pixels, &stylized, request.strength)
    }

    /// Stylize and hand the result to `latest`, discarding it if a newer
    /// submission started while this one was in flight.
    ///
    /// A failure is only returned while its submission is still current;
    /// once superseded it is reported as [`Submission::Stale`].
    pub async fn stylize_latest(
        &self,
        latest: &LatestOutput,
        pixels: &PixelBuffer,
        request: &StyleRequest,
    ) -> Result<Submission> {
        let generation = latest.begin();
        match self.stylize(pixels, request).await {
            Ok(output) => Ok(latest.submit(generation, output)),
            Err(err) if !latest.is_current(generation) => {
                debug!(
                    generation = generation.value(),
                    style = %request.style_id,
                    error = %err,
                    "Discarding failure of superseded submission"
                );
                Ok(Submission::Stale)
            }
            Err(err) => Err(err),
        }
    }
}

fn dim(value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| StyleError::shape(format!("dimension {} exceeds u32", value)))
}
