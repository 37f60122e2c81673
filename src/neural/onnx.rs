//! ONNX Runtime backend
//!
//! Loads style models with `ort` and runs them on the configured execution
//! provider. Requesting CUDA on a machine without it fails session creation
//! instead of silently falling back to the CPU.

use ndarray::{Array4, Ix4};
use ort::execution_providers::{CPUExecutionProvider, CUDAExecutionProvider};
use ort::session::builder::SessionBuilder;
use ort::session::Session;
use tracing::debug;

use super::backend::{InferenceBackend, ModelSession};
use super::registry::StyleEntry;
use crate::config::ExecutionProvider;
use crate::error::{Result, StyleError};
use crate::marshal::Tensor;

/// Backend creating ONNX Runtime sessions
#[derive(Debug, Clone)]
pub struct OrtBackend {
    provider: ExecutionProvider,
    intra_threads: usize,
}

impl OrtBackend {
    /// `intra_threads == 0` leaves the thread count to ONNX Runtime
    pub fn new(provider: ExecutionProvider, intra_threads: usize) -> Self {
        Self {
            provider,
            intra_threads,
        }
    }

    pub fn provider(&self) -> ExecutionProvider {
        self.provider
    }

    fn builder(&self) -> std::result::Result<SessionBuilder, String> {
        let mut builder =
            Session::builder().map_err(|e| format!("failed to create session builder: {}", e))?;

        if self.intra_threads > 0 {
            builder = builder
                .with_intra_threads(self.intra_threads)
                .map_err(|e| format!("failed to set thread count: {}", e))?;
        }

        let builder = match self.provider {
            ExecutionProvider::Cpu => {
                builder.with_execution_providers([CPUExecutionProvider::default().build()])
            }
            ExecutionProvider::Cuda => builder.with_execution_providers([
                CUDAExecutionProvider::default().build().error_on_failure(),
            ]),
        };

        builder.map_err(|e| format!("{} execution provider unavailable: {}", self.provider, e))
    }
}

impl InferenceBackend for OrtBackend {
    fn name(&self) -> &str {
        "onnxruntime"
    }

    fn load(&self, entry: &StyleEntry) -> Result<Box<dyn ModelSession>> {
        let creation_error = |reason: String| StyleError::SessionCreation {
            style_id: entry.id.clone(),
            reason,
        };

        if !entry.model_path.is_file() {
            return Err(creation_error(format!(
                "model file not found: {}",
                entry.model_path.display()
            )));
        }

        let session = self
            .builder()
            .map_err(creation_error)?
            .commit_from_file(&entry.model_path)
            .map_err(|e| creation_error(format!("failed to load model: {}", e)))?;

        debug!(
            style = %entry.id,
            provider = %self.provider,
            inputs = session.inputs.len(),
            outputs = session.outputs.len(),
            "ONNX session committed"
        );

        Ok(Box::new(OrtSession { session }))
    }
}

/// A committed ONNX Runtime session
pub struct OrtSession {
    session: Session,
}

impl ModelSession for OrtSession {
    fn input_names(&self) -> Vec<String> {
        self.session.inputs.iter().map(|i| i.name.clone()).collect()
    }

    fn output_names(&self) -> Vec<String> {
        self.session.outputs.iter().map(|o| o.name.clone()).collect()
    }

    fn run(
        &mut self,
        input_name: &str,
        input: Tensor,
        output_name: &str,
    ) -> std::result::Result<Tensor, String> {
        let [n, c, h, w] = input.shape();
        let array = Array4::from_shape_vec((n, c, h, w), input.into_data())
            .map_err(|e| format!("failed to shape input tensor: {}", e))?;
        let value = ort::value::Tensor::from_array(array)
            .map_err(|e| format!("failed to create input tensor: {}", e))?;

        let outputs = self
            .session
            .run(ort::inputs![input_name => value])
            .map_err(|e| e.to_string())?;

        let output = outputs
            .get(output_name)
            .ok_or_else(|| format!("model produced no output named '{}'", output_name))?;
        let view = output
            .try_extract_array::<f32>()
            .map_err(|e| format!("failed to extract output tensor: {}", e))?;
        let array = view
            .to_owned()
            .into_dimensionality::<Ix4>()
            .map_err(|e| format!("expected a 4D output: {}", e))?;

        let (n, c, h, w) = array.dim();
        let data = array.as_standard_layout().iter().copied().collect();
        Tensor::new([n, c, h, w], data).map_err(|e| e.to_string())
    }
}
