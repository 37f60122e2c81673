//! Stylize - Neural Style-Transfer Inference Bridge
//!
//! Stylize takes a raw RGBA image and a named style, runs the style's
//! neural network, and returns a stylized image of the same size.
//!
//! # Architecture
//!
//! The work is split between two asynchronous actors:
//! - Compute side: marshals pixels to tensors and back, blends by strength
//! - Inference host: owns the per-style session cache and runs the models
//!
//! The compute side reaches the host only through the bridge
//! (`BridgeClient::call_host_inference`), one request and one reply per
//! call.

pub mod bridge;
pub mod cli;
pub mod config;
pub mod error;
pub mod marshal;
pub mod neural;
pub mod pipeline;
pub mod runtime;

pub use config::{BridgeConfig, ExecutionProvider};
pub use error::{ErrorKind, Result, StyleError};
pub use marshal::{Normalization, PixelBuffer, Tensor};
pub use pipeline::{LatestOutput, StyleRequest, Stylizer, Submission};
pub use runtime::StyleRuntime;
