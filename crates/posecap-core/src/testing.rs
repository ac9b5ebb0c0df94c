//! Scripted detector and synthetic face records.
//!
//! Compiled for unit tests and behind the `test-utils` feature, which the
//! integration tests, benches and downstream test suites enable.

use async_trait::async_trait;
use posecap_models::{DetectedFace, FaceRect, Point2D};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use crate::detector::FaceLandmarkDetector;
use crate::error::{CaptureError, CaptureResult};
use crate::frame::Frame;

/// Detector record whose landmarks circumscribe a circle centered on
/// `center` with the given `radius`.
///
/// The right eye sits left of center, the left eye right of center and the
/// mouth below it, as seen in an unmirrored image.
pub fn face_with_center(center: Point2D, radius: f64, bounding_box: FaceRect) -> DetectedFace {
    DetectedFace::new(
        bounding_box,
        Point2D::new(center.x + radius, center.y),
        Point2D::new(center.x - radius, center.y),
        Point2D::new(center.x, center.y + radius),
    )
}

/// One scripted detector response.
#[derive(Debug, Clone)]
pub enum ScriptStep {
    Faces(Vec<DetectedFace>),
    Fail(String),
}

/// Detector that replays a fixed list of responses, one per frame.
///
/// Once the script is exhausted every frame reports no face. An optional
/// latency simulates an expensive detection pass.
#[derive(Debug, Default)]
pub struct ScriptedDetector {
    steps: Mutex<VecDeque<ScriptStep>>,
    latency: Duration,
}

impl ScriptedDetector {
    pub fn new(steps: impl IntoIterator<Item = ScriptStep>) -> Self {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
            latency: Duration::ZERO,
        }
    }

    /// Script where every frame reports exactly the given single face.
    pub fn single_faces(faces: impl IntoIterator<Item = DetectedFace>) -> Self {
        Self::new(faces.into_iter().map(|face| ScriptStep::Faces(vec![face])))
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Number of responses not yet consumed.
    pub fn remaining(&self) -> usize {
        self.steps.lock().map(|steps| steps.len()).unwrap_or(0)
    }
}

#[async_trait]
impl FaceLandmarkDetector for ScriptedDetector {
    async fn detect(&self, _frame: &Frame) -> CaptureResult<Vec<DetectedFace>> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let step = self
            .steps
            .lock()
            .map_err(|_| CaptureError::internal("scripted detector lock poisoned"))?
            .pop_front();
        match step {
            Some(ScriptStep::Faces(faces)) => Ok(faces),
            Some(ScriptStep::Fail(message)) => Err(CaptureError::detection_failed(message)),
            None => Ok(Vec::new()),
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
