//! Inference backend traits
//!
//! A backend turns a style's model artifact into a session; a session runs
//! forward passes. Both are synchronous and may block for a long time, so
//! callers run them on the blocking thread pool.

use crate::error::Result;
use crate::marshal::Tensor;

use super::registry::{StyleEntry, TensorNames};

/// A loaded, ready-to-run model
pub trait ModelSession: Send {
    /// Input tensor names the model declares, in declaration order
    fn input_names(&self) -> Vec<String>;

    /// Output tensor names the model declares, in declaration order
    fn output_names(&self) -> Vec<String>;

    /// Run one forward pass, binding `input` to `input_name` and returning
    /// the tensor bound to `output_name`.
    ///
    /// Errors are reported as plain reasons; the caller attaches the style.
    fn run(
        &mut self,
        input_name: &str,
        input: Tensor,
        output_name: &str,
    ) -> std::result::Result<Tensor, String>;

    /// Names of the first declared input and output
    fn declared_names(&self) -> Option<TensorNames> {
        Some(TensorNames {
            input: self.input_names().into_iter().next()?,
            output: self.output_names().into_iter().next()?,
        })
    }
}

/// Factory for model sessions
pub trait InferenceBackend: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &str;

    /// Load the artifact of `entry` and create a session for it.
    ///
    /// Fails with `SessionCreation` when the artifact is missing or invalid,
    /// or when the execution provider cannot be initialized.
    fn load(&self, entry: &StyleEntry) -> Result<Box<dyn ModelSession>>;
}

/// Backend used when no real runtime is compiled in
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableBackend;

impl InferenceBackend for UnavailableBackend {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn load(&self, entry: &StyleEntry) -> Result<Box<dyn ModelSession>> {
        Err(crate::error::StyleError::SessionCreation {
            style_id: entry.id.clone(),
            reason: "ONNX Runtime support not compiled. Build with --features onnx".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StyleError;

    #[test]
    fn test_unavailable_backend_fails_creation() {
        let entry = StyleEntry::new("candy", "models/candy-9.onnx");
        let err = match UnavailableBackend.load(&entry) {
            Ok(_) => panic!("unavailable backend must not create sessions"),
            Err(err) => err,
        };
        assert!(matches!(err, StyleError::SessionCreation { .. }));
        assert!(err.to_string().contains("--features onnx"));
    }
}
