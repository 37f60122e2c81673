//! Messages exchanged between the compute side and the inference host

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::error::{ErrorKind, Result, StyleError};
use crate::marshal::Tensor;

/// Flattened tensor as it crosses the bridge: NCHW dims plus data in NCHW
/// order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostRequest {
    pub request_id: Uuid,
    pub style_id: String,
    pub dims: [u32; 4],
    pub data: Vec<f32>,
}

impl HostRequest {
    pub fn new(style_id: &str, data: Vec<f32>, n: u32, c: u32, h: u32, w: u32) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            style_id: style_id.to_string(),
            dims: [n, c, h, w],
            data,
        }
    }

    /// Rebuild the tensor, checking the buffer against the declared dims
    pub fn into_tensor(self) -> Result<Tensor> {
        let [n, c, h, w] = self.dims;
        Tensor::new([n as usize, c as usize, h as usize, w as usize], self.data)
    }
}

/// Host-side failure tagged with its kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostFailure {
    pub kind: ErrorKind,
    pub error_code: String,
    pub message: String,
}

impl HostFailure {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            error_code: kind.error_code().to_string(),
            message: message.into(),
        }
    }

    /// The caller-side error for this failure
    pub fn into_error(self) -> StyleError {
        StyleError::Bridge {
            kind: self.kind,
            message: self.message,
        }
    }
}

impl From<&StyleError> for HostFailure {
    fn from(err: &StyleError) -> Self {
        Self {
            kind: err.kind(),
            error_code: err.error_code().to_string(),
            message: err.to_string(),
        }
    }
}

/// Flat output buffer or a tagged failure
pub type HostReply = std::result::Result<Vec<f32>, HostFailure>;

/// A request paired with the channel its single reply goes back on
#[derive(Debug)]
pub struct HostCall {
    pub request: HostRequest,
    pub reply: oneshot::Sender<HostReply>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_rebuilds_tensor() {
        let request = HostRequest::new("candy", vec![0.0; 12], 1, 3, 2, 2);
        let tensor = request.into_tensor().unwrap();
        assert_eq!(tensor.shape(), [1, 3, 2, 2]);
    }

    #[test]
    fn test_request_shape_mismatch() {
        let request = HostRequest::new("candy", vec![0.0; 11], 1, 3, 2, 2);
        let err = request.into_tensor().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Shape);
    }

    #[test]
    fn test_request_with_overflowing_dims() {
        let request = HostRequest::new("candy", Vec::new(), 1 << 16, 1 << 16, 1 << 16, 1 << 16);
        let err = request.into_tensor().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Shape);
    }

    #[test]
    fn test_failure_keeps_kind() {
        let err = StyleError::SessionCreation {
            style_id: "mosaic".to_string(),
            reason: "CUDA unavailable".to_string(),
        };
        let failure = HostFailure::from(&err);
        assert_eq!(failure.kind, ErrorKind::SessionCreation);
        assert_eq!(failure.error_code, "SESSION_CREATION_FAILED");

        let json = serde_json::to_string(&failure).unwrap();
        assert!(json.contains("\"kind\":\"session_creation\""));

        let bridged = failure.into_error();
        assert_eq!(bridged.kind(), ErrorKind::SessionCreation);
        assert!(bridged.to_string().contains("CUDA unavailable"));
    }

    #[test]
    fn test_request_ids_are_unique() {
        let a = HostRequest::new("candy", vec![], 1, 3, 0, 0);
        let b = HostRequest::new("candy", vec![], 1, 3, 0, 0);
        assert_ne!(a.request_id, b.request_id);
    }
}
