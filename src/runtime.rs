//! Runtime composition
//!
//! `StyleRuntime` owns one registry, one session cache, one inference host
//! and the stylizer that talks to it. Nothing here is global; two runtimes
//! in one process share no state.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::info;

use crate::bridge::{spawn_host, BridgeClient};
use crate::config::BridgeConfig;
use crate::error::{Result, StyleError};
use crate::marshal::PixelBuffer;
use crate::neural::{InferenceBackend, InferenceInvoker, SessionCache, StyleRegistry};
use crate::pipeline::{LatestOutput, StyleRequest, Stylizer, Submission};

/// A running inference bridge
pub struct StyleRuntime {
    config: BridgeConfig,
    registry: Arc<StyleRegistry>,
    cache: Arc<SessionCache>,
    stylizer: Stylizer,
    host: JoinHandle<()>,
}

impl StyleRuntime {
    /// Build the registry from `config` and start the host.
    ///
    /// Must be called from within a tokio runtime.
    pub fn from_config(config: BridgeConfig, backend: Arc<dyn InferenceBackend>) -> Result<Self> {
        let registry = config.registry()?;
        Self::start(config, registry, backend)
    }

    /// Start a host over an explicit registry.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        config: BridgeConfig,
        registry: StyleRegistry,
        backend: Arc<dyn InferenceBackend>,
    ) -> Result<Self> {
        config.validate()?;
        if registry.is_empty() {
            return Err(StyleError::Config {
                reason: "no styles registered".to_string(),
            });
        }

        let registry = Arc::new(registry);
        let backend_name = backend.name().to_string();
        let cache = Arc::new(SessionCache::new(Arc::clone(&registry), backend));
        let invoker = Arc::new(InferenceInvoker::new(Arc::clone(&cache)));
        let (client, host) = spawn_host(invoker, config.host_queue_depth);
        let stylizer = Stylizer::new(client, Arc::clone(&registry), config.normalization);

        info!(
            styles = registry.len(),
            backend = %backend_name,
            normalization = %config.normalization,
            "Style runtime started"
        );

        Ok(Self {
            config,
            registry,
            cache,
            stylizer,
            host,
        })
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<StyleRegistry> {
        &self.registry
    }

    pub fn cache(&self) -> &Arc<SessionCache> {
        &self.cache
    }

    pub fn stylizer(&self) -> &Stylizer {
        &self.stylizer
    }

    /// A new handle onto the host
    pub fn client(&self) -> BridgeClient {
        self.stylizer.client().clone()
    }

    pub async fn stylize(&self, pixels: &PixelBuffer, request: &StyleRequest) -> Result<PixelBuffer> {
        self.stylizer.stylize(pixels, request).await
    }

    pub async fn stylize_latest(
        &self,
        latest: &LatestOutput,
        pixels: &PixelBuffer,
        request: &StyleRequest,
    ) -> Result<Submission> {
        self.stylizer.stylize_latest(latest, pixels, request).await
    }

    /// Stop accepting calls and wait for the host to finish.
    ///
    /// Waits until every [`BridgeClient`] handed out by [`client`](Self::client)
    /// has been dropped as well.
    pub async fn shutdown(self) {
        let Self { stylizer, host, .. } = self;
        drop(stylizer);
        let _ = host.await;
    }
}

/// Backend selected by the build: ONNX Runtime with the `onnx` feature,
/// otherwise one that fails session creation with a rebuild hint.
pub fn default_backend(config: &BridgeConfig) -> Arc<dyn InferenceBackend> {
    #[cfg(feature = "onnx")]
    {
        Arc::new(crate::neural::OrtBackend::new(
            config.execution_provider,
            config.intra_threads,
        ))
    }
    #[cfg(not(feature = "onnx"))]
    {
        let _ = config;
        Arc::new(crate::neural::UnavailableBackend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neural::MockBackend;

    #[tokio::test]
    async fn test_runtime_stylizes() {
        let runtime = StyleRuntime::start(
            BridgeConfig::default(),
            StyleRegistry::with_defaults(),
            Arc::new(MockBackend::new()),
        )
        .unwrap();

        let output = runtime
            .stylize(&PixelBuffer::filled(2, 2, [0, 0, 0, 255]), &StyleRequest::full("candy"))
            .await
            .unwrap();

        assert_eq!(output, PixelBuffer::filled(2, 2, [255, 255, 255, 255]));
        assert_eq!(runtime.cache().cached_styles(), vec!["candy".to_string()]);
        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_empty_registry_rejected() {
        let result = StyleRuntime::start(
            BridgeConfig::default(),
            StyleRegistry::new(),
            Arc::new(MockBackend::new()),
        );
        assert!(matches!(result, Err(StyleError::Config { .. })));
    }

    #[cfg(not(feature = "onnx"))]
    #[tokio::test]
    async fn test_default_backend_without_onnx() {
        use crate::error::ErrorKind;

        let config = BridgeConfig::default();
        let runtime = StyleRuntime::from_config(config.clone(), default_backend(&config)).unwrap();

        let err = runtime
            .stylize(&PixelBuffer::filled(1, 1, [0; 4]), &StyleRequest::full("candy"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::SessionCreation);
        assert!(err.to_string().contains("--features onnx"));
    }
}
