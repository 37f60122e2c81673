//! Error handling for Stylize
//!
//! Every failure that can cross the inference bridge carries an
//! [`ErrorKind`] so callers can tell them apart after the hop.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type alias for Stylize operations
pub type Result<T> = std::result::Result<T, StyleError>;

/// Coarse classification of a failure, stable across the bridge boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnknownStyle,
    SessionCreation,
    Shape,
    InferenceRuntime,
    InvalidRequest,
    HostUnavailable,
    Config,
    Io,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnknownStyle => "unknown_style",
            Self::SessionCreation => "session_creation",
            Self::Shape => "shape",
            Self::InferenceRuntime => "inference_runtime",
            Self::InvalidRequest => "invalid_request",
            Self::HostUnavailable => "host_unavailable",
            Self::Config => "config",
            Self::Io => "io",
        }
    }

    /// Stable upper-case code reported to users and across the bridge
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownStyle => "UNKNOWN_STYLE",
            Self::SessionCreation => "SESSION_CREATION_FAILED",
            Self::Shape => "SHAPE_MISMATCH",
            Self::InferenceRuntime => "INFERENCE_RUNTIME",
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::HostUnavailable => "HOST_UNAVAILABLE",
            Self::Config => "CONFIG_ERROR",
            Self::Io => "IO_ERROR",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for Stylize operations
#[derive(Error, Debug)]
pub enum StyleError {
    // Registry Errors
    #[error("Unknown style: {style_id}")]
    UnknownStyle { style_id: String },

    // Session Errors
    #[error("Failed to create session for style '{style_id}': {reason}")]
    SessionCreation { style_id: String, reason: String },

    // Marshalling Errors
    #[error("Shape error: {detail}")]
    Shape { detail: String },

    // Execution Errors
    #[error("Inference failed for style '{style_id}': {reason}")]
    InferenceRuntime { style_id: String, reason: String },

    // Bridge Errors
    #[error("Bridge call failed ({kind}): {message}")]
    Bridge { kind: ErrorKind, message: String },

    // Request Errors
    #[error("Invalid strength {strength}: expected a value between 0.0 and 1.0")]
    InvalidStrength { strength: f32 },

    // Configuration Errors
    #[error("Configuration error: {reason}")]
    Config { reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StyleError {
    pub(crate) fn shape(detail: impl Into<String>) -> Self {
        StyleError::Shape {
            detail: detail.into(),
        }
    }

    /// Classify this error. Bridge errors report the kind of the host-side
    /// failure they wrap.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StyleError::UnknownStyle { .. } => ErrorKind::UnknownStyle,
            StyleError::SessionCreation { .. } => ErrorKind::SessionCreation,
            StyleError::Shape { .. } => ErrorKind::Shape,
            StyleError::InferenceRuntime { .. } => ErrorKind::InferenceRuntime,
            StyleError::Bridge { kind, .. } => *kind,
            StyleError::InvalidStrength { .. } => ErrorKind::InvalidRequest,
            StyleError::Config { .. } => ErrorKind::Config,
            StyleError::Io(_) | StyleError::Serialization(_) => ErrorKind::Io,
        }
    }

    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        self.kind().error_code()
    }

    /// Check if this error is recoverable
    ///
    /// Recoverable errors are caused by the request itself; the caller can
    /// fix the input and try again.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::UnknownStyle | ErrorKind::InvalidRequest | ErrorKind::Io
        )
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self.kind() {
            ErrorKind::UnknownStyle => vec![
                "Pick one of the styles listed by 'stylize-cli styles'",
                "Check the spelling of the style id",
            ],
            ErrorKind::SessionCreation => vec![
                "Check that the model file exists and is a valid ONNX model",
                "Try the CPU execution provider if GPU acceleration is unavailable",
                "Rebuild with --features onnx if the backend is not compiled in",
            ],
            ErrorKind::InferenceRuntime => vec![
                "Try a smaller image",
                "Check the model accepts NCHW float32 input",
            ],
            ErrorKind::InvalidRequest => vec!["Use a strength between 0.0 and 1.0"],
            ErrorKind::Config => vec![
                "Check the configuration file and STYLIZE_* environment variables",
            ],
            _ => vec![],
        }
    }

    /// Get a user-friendly message for this error
    pub fn friendly_message(&self) -> String {
        match self {
            StyleError::UnknownStyle { style_id } => {
                format!("There is no style called '{}'.", style_id)
            }
            StyleError::SessionCreation { style_id, .. } => format!(
                "The '{}' style could not be loaded. It will stay unavailable until the model or environment is fixed.",
                style_id
            ),
            StyleError::InferenceRuntime { style_id, reason } => {
                format!("Applying '{}' failed: {}", style_id, reason)
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = StyleError::UnknownStyle {
            style_id: "starry".to_string(),
        };
        assert_eq!(err.error_code(), "UNKNOWN_STYLE");
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_bridge_error_reports_wrapped_kind() {
        let err = StyleError::Bridge {
            kind: ErrorKind::SessionCreation,
            message: "model missing".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::SessionCreation);
        assert_eq!(err.error_code(), "SESSION_CREATION_FAILED");
        assert!(!err.is_recoverable());
        assert!(!err.recovery_suggestions().is_empty());
    }

    #[test]
    fn test_kind_serializes_as_snake_case() {
        let json = serde_json::to_string(&ErrorKind::InferenceRuntime).unwrap();
        assert_eq!(json, "\"inference_runtime\"");
        assert_eq!(ErrorKind::InferenceRuntime.to_string(), "inference_runtime");
    }
}
