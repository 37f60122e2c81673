//! Host side of the bridge
//!
//! Owns the inference invoker and answers every call on its own task, so a
//! slow style never holds up calls for other styles.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::protocol::{HostCall, HostFailure, HostReply};
use crate::marshal::Tensor;
use crate::neural::InferenceInvoker;

/// Serves bridge calls against an [`InferenceInvoker`]
pub struct InferenceHost {
    invoker: Arc<InferenceInvoker>,
    calls: mpsc::Receiver<HostCall>,
}

impl InferenceHost {
    pub fn new(invoker: Arc<InferenceInvoker>, calls: mpsc::Receiver<HostCall>) -> Self {
        Self { invoker, calls }
    }

    /// Serve calls until every client handle has been dropped.
    ///
    /// Calls already accepted keep running to completion after the loop
    /// ends.
    pub async fn run(mut self) {
        while let Some(call) = self.calls.recv().await {
            let invoker = Arc::clone(&self.invoker);
            tokio::spawn(serve(invoker, call));
        }
        debug!("Inference host stopped: all clients disconnected");
    }
}

/// Answer one call. The reply sender is consumed exactly once.
async fn serve(invoker: Arc<InferenceInvoker>, call: HostCall) {
    let HostCall { request, reply } = call;
    let request_id = request.request_id;
    let style_id = request.style_id.clone();

    debug!(%request_id, style = %style_id, dims = ?request.dims, "Host call received");

    let result = match request.into_tensor() {
        Ok(tensor) => invoker
            .infer(&style_id, tensor)
            .await
            .map(Tensor::into_data),
        Err(err) => Err(err),
    };

    let outcome: HostReply = result.map_err(|err| {
        debug!(%request_id, style = %style_id, kind = %err.kind(), "Host call failed");
        HostFailure::from(&err)
    });

    if reply.send(outcome).is_err() {
        warn!(%request_id, style = %style_id, "Caller dropped before the host replied");
    }
}
