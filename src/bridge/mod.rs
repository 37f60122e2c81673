//! Cross-runtime call bridge
//!
//! The compute side never runs models itself. It sends each forward pass to
//! the inference host over a request channel and awaits a one-shot reply:
//! - `BridgeClient` - the caller's handle (`call_host_inference`)
//! - `InferenceHost` - the actor that owns the invoker and answers calls
//! - `protocol` - request, reply and tagged failure messages

pub mod client;
pub mod host;
pub mod protocol;

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub use client::BridgeClient;
pub use host::InferenceHost;
pub use protocol::{HostCall, HostFailure, HostReply, HostRequest};

use crate::neural::InferenceInvoker;

/// Start an inference host on the current tokio runtime.
///
/// `queue_depth` bounds how many calls may wait to be accepted; callers
/// past that suspend on send. The host stops once every client clone is
/// dropped.
pub fn spawn_host(
    invoker: Arc<InferenceInvoker>,
    queue_depth: usize,
) -> (BridgeClient, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(queue_depth.max(1));
    let handle = tokio::spawn(InferenceHost::new(invoker, rx).run());
    (BridgeClient::new(tx), handle)
}
