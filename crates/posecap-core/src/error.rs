//! Error types for capture operations.

use posecap_models::LayoutError;
use thiserror::Error;

/// Result type for capture operations.
pub type CaptureResult<T> = Result<T, CaptureError>;

/// Errors that can occur while configuring or running a capture session.
///
/// Per-frame conditions (no face, several faces, ineligible pose) are not
/// errors; they surface as [`crate::FrameOutcome`] values.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Invalid direction layout: {0}")]
    Layout(#[from] LayoutError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Face detection failed: {0}")]
    DetectionFailed(String),

    #[error("Capture session is not capturing")]
    NotCapturing,

    #[error("Capture session is closed")]
    SessionClosed,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CaptureError {
    /// Create a configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Create a detection failure error.
    pub fn detection_failed(message: impl Into<String>) -> Self {
        Self::DetectionFailed(message.into())
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Configuration errors are fatal at construction time.
    pub fn is_config_error(&self) -> bool {
        matches!(self, CaptureError::Layout(_) | CaptureError::InvalidConfig(_))
    }
}
