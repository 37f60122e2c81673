//! Neural inference
//!
//! This module provides:
//! - Style registry with model metadata and tensor names
//! - `InferenceBackend`/`ModelSession` traits for model runtimes
//! - Per-style session cache with single-flight creation
//! - The inference invoker that runs forward passes off the async executor
//! - Mock backend for testing

mod backend;
mod invoker;
mod mock;
#[cfg(feature = "onnx")]
mod onnx;
mod registry;
mod session;

pub use backend::{InferenceBackend, ModelSession, UnavailableBackend};
pub use invoker::InferenceInvoker;
pub use mock::*;
#[cfg(feature = "onnx")]
pub use onnx::{OrtBackend, OrtSession};
pub use registry::{
    file_sha256, ManifestStyle, StyleEntry, StyleManifest, StyleRegistry, TensorNames,
    BUILTIN_STYLES, DEFAULT_MODELS_DIR, DEFAULT_RECOMMENDED_PIXELS, MODEL_EXTENSION,
};
pub use session::{SessionCache, StyleSession};
