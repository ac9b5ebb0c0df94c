//! Face landmark detector seam.
//!
//! Landmark extraction is an external capability. The session only needs a
//! detector that turns a frame into zero or more face records.

use async_trait::async_trait;
use posecap_models::DetectedFace;

use crate::error::CaptureResult;
use crate::frame::Frame;

/// Face landmark detection provider.
#[async_trait]
pub trait FaceLandmarkDetector: Send + Sync {
    /// Detect faces in a frame.
    ///
    /// # Returns
    /// Every face found, in detector order. An error means the frame could
    /// not be analyzed; the caller skips it.
    async fn detect(&self, frame: &Frame) -> CaptureResult<Vec<DetectedFace>>;

    /// Provider name for logging.
    fn name(&self) -> &'static str;
}
