//! Compute side of the bridge

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use super::protocol::{HostCall, HostRequest};
use crate::error::{ErrorKind, Result, StyleError};

/// Handle for delegating forward passes to the inference host.
///
/// Cheap to clone; every clone talks to the same host.
#[derive(Debug, Clone)]
pub struct BridgeClient {
    calls: mpsc::Sender<HostCall>,
}

impl BridgeClient {
    pub fn new(calls: mpsc::Sender<HostCall>) -> Self {
        Self { calls }
    }

    /// Run `buffer`, a flat NCHW tensor of shape `(n, c, h, w)`, through the
    /// model for `style_id` on the host and return the flat output buffer.
    ///
    /// Suspends until the host replies. Every call resolves exactly once.
    ///
    /// # Errors
    /// Host-side failures come back as `StyleError::Bridge` carrying the
    /// original kind. A host that has shut down, or that dropped the call
    /// without replying, yields kind `HostUnavailable`.
    pub async fn call_host_inference(
        &self,
        style_id: &str,
        buffer: Vec<f32>,
        n: u32,
        c: u32,
        h: u32,
        w: u32,
    ) -> Result<Vec<f32>> {
        let request = HostRequest::new(style_id, buffer, n, c, h, w);
        let request_id = request.request_id;
        let (reply, response) = oneshot::channel();

        debug!(%request_id, style = style_id, dims = ?[n, c, h, w], "Calling inference host");

        self.calls
            .send(HostCall { request, reply })
            .await
            .map_err(|_| host_unavailable("inference host has shut down"))?;

        match response.await {
            Ok(Ok(output)) => {
                debug!(%request_id, len = output.len(), "Host call resolved");
                Ok(output)
            }
            Ok(Err(failure)) => Err(failure.into_error()),
            Err(_) => Err(host_unavailable("inference host dropped the call without replying")),
        }
    }

    /// Whether the host is still accepting calls
    pub fn is_connected(&self) -> bool {
        !self.calls.is_closed()
    }
}

fn host_unavailable(message: &str) -> StyleError {
    StyleError::Bridge {
        kind: ErrorKind::HostUnavailable,
        message: message.to_string(),
    }
}
