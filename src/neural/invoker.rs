//! Inference invoker
//!
//! Resolves a style's session and runs one forward pass on the blocking
//! pool so the async executor is never held by model execution.

use std::sync::Arc;

use tracing::debug;

use super::registry::StyleRegistry;
use super::session::SessionCache;
use crate::error::{Result, StyleError};
use crate::marshal::Tensor;

/// Runs forward passes against cached per-style sessions
pub struct InferenceInvoker {
    registry: Arc<StyleRegistry>,
    cache: Arc<SessionCache>,
}

impl InferenceInvoker {
    pub fn new(cache: Arc<SessionCache>) -> Self {
        Self {
            registry: Arc::clone(cache.registry()),
            cache,
        }
    }

    pub fn registry(&self) -> &Arc<StyleRegistry> {
        &self.registry
    }

    pub fn cache(&self) -> &Arc<SessionCache> {
        &self.cache
    }

    /// Run `tensor` through the model for `style_id`.
    ///
    /// May trigger the one-time session creation for the style.
    ///
    /// # Errors
    /// `UnknownStyle` and `SessionCreation` propagate unchanged from the
    /// registry and the cache; backend failures during execution surface as
    /// `InferenceRuntime`.
    pub async fn infer(&self, style_id: &str, tensor: Tensor) -> Result<Tensor> {
        let entry = self.registry.lookup(style_id)?;
        let session = self.cache.acquire(style_id).await?;

        let names = entry
            .tensor_names()
            .unwrap_or_else(|| session.tensor_names().clone());

        debug!(
            style = style_id,
            input = %names.input,
            output = %names.output,
            shape = ?tensor.shape(),
            "Running forward pass"
        );

        let output = tokio::task::spawn_blocking(move || {
            session.run_blocking(&names.input, tensor, &names.output)
        })
        .await
        .map_err(|join_err| StyleError::InferenceRuntime {
            style_id: style_id.to_string(),
            reason: format!("forward pass panicked: {}", join_err),
        })??;

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::neural::mock::{MockBackend, MockTransform};
    use crate::neural::registry::StyleEntry;

    fn invoker(backend: MockBackend) -> InferenceInvoker {
        let registry = Arc::new(StyleRegistry::with_defaults());
        let cache = Arc::new(SessionCache::new(registry, Arc::new(backend)));
        InferenceInvoker::new(cache)
    }

    #[tokio::test]
    async fn test_infer_runs_model() {
        let invoker = invoker(MockBackend::new().with_transform("candy", MockTransform::Invert));
        let input = Tensor::new([1, 3, 1, 2], vec![0.0, 1.0, 0.25, 0.5, 0.75, 0.125]).unwrap();

        let output = invoker.infer("candy", input).await.unwrap();

        assert_eq!(output.shape(), [1, 3, 1, 2]);
        assert_eq!(output.data(), &[1.0, 0.0, 0.75, 0.5, 0.25, 0.875]);
        assert!(invoker.cache().is_cached("candy"));
    }

    #[tokio::test]
    async fn test_errors_keep_their_kind() {
        let invoker = invoker(
            MockBackend::new()
                .failing_load("mosaic", "model file is truncated")
                .failing_run("udnie", "numeric fault"),
        );
        let input = || Tensor::new([1, 3, 1, 1], vec![0.5; 3]).unwrap();

        let unknown = invoker.infer("starry", input()).await.unwrap_err();
        let creation = invoker.infer("mosaic", input()).await.unwrap_err();
        let runtime = invoker.infer("udnie", input()).await.unwrap_err();

        assert_eq!(unknown.kind(), ErrorKind::UnknownStyle);
        assert_eq!(creation.kind(), ErrorKind::SessionCreation);
        assert_eq!(runtime.kind(), ErrorKind::InferenceRuntime);
        assert!(runtime.to_string().contains("numeric fault"));
    }

    #[tokio::test]
    async fn test_pinned_names_are_bound() {
        let mut registry = StyleRegistry::new();
        registry.register(
            StyleEntry::new("candy", "candy.onnx")
                .with_tensor_names(Some("image".to_string()), None),
        );
        let cache = Arc::new(SessionCache::new(
            Arc::new(registry),
            Arc::new(MockBackend::new()),
        ));
        let invoker = InferenceInvoker::new(cache);

        // The mock model only accepts "input1", so the pinned name reaches it
        let err = invoker
            .infer("candy", Tensor::new([1, 3, 1, 1], vec![0.0; 3]).unwrap())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("image"));
    }
}
