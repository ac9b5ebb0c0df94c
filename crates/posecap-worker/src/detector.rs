//! Synthetic face detector.
//!
//! Simulates a user who looks straight at the camera for a few frames and
//! then rolls their head in a slow circle. Every detection advances the pose
//! by one step, with a little positional jitter, occasional missed faces
//! and occasional bystanders.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use posecap_core::{
    CaptureError, CaptureResult, DetectedFace, FaceLandmarkDetector, FaceRect, Frame, Point2D,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::WorkerConfig;

/// Pixels between the head center and the frame center while turning.
const TURN_REACH: f64 = 60.0;
/// Half the eye spacing of the synthetic face.
const LANDMARK_RADIUS: f64 = 45.0;
/// Side of the synthetic face box.
const FACE_SIZE: f64 = 180.0;
const JITTER: f64 = 2.0;

/// Detector that replays an orbiting head.
pub struct OrbitDetector {
    rng: Mutex<StdRng>,
    calls: AtomicU64,
    latency: Duration,
    front_hold: u64,
    step_degrees: f64,
    miss_rate: f64,
    crowd_rate: f64,
}

impl OrbitDetector {
    pub fn new(config: &WorkerConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        Self {
            rng: Mutex::new(rng),
            calls: AtomicU64::new(0),
            latency: config.detection_latency,
            front_hold: config.front_hold_frames,
            step_degrees: config.turn_step_degrees,
            miss_rate: config.miss_rate,
            crowd_rate: config.crowd_rate,
        }
    }

    /// Head center for the n-th detection, before jitter.
    pub fn pose(&self, call: u64, frame_center: Point2D) -> Point2D {
        if call < self.front_hold {
            return frame_center;
        }
        let degrees = ((call - self.front_hold) as f64 * self.step_degrees).rem_euclid(360.0);
        let radians = degrees.to_radians();
        Point2D::new(
            frame_center.x + TURN_REACH * radians.cos(),
            frame_center.y + TURN_REACH * radians.sin(),
        )
    }

    /// Eyes level with `center`, mouth below it, all on a circle of
    /// `LANDMARK_RADIUS` around `center`.
    fn face_at(center: Point2D) -> DetectedFace {
        let half = FACE_SIZE / 2.0;
        DetectedFace::new(
            FaceRect::new(center.x - half, center.y - half, FACE_SIZE, FACE_SIZE),
            Point2D::new(center.x + LANDMARK_RADIUS, center.y),
            Point2D::new(center.x - LANDMARK_RADIUS, center.y),
            Point2D::new(center.x, center.y + LANDMARK_RADIUS),
        )
    }
}

#[async_trait]
impl FaceLandmarkDetector for OrbitDetector {
    async fn detect(&self, frame: &Frame) -> CaptureResult<Vec<DetectedFace>> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let call = self.calls.fetch_add(1, Ordering::Relaxed);
        let center = self.pose(call, frame.size().center());

        let mut rng = self
            .rng
            .lock()
            .map_err(|_| CaptureError::internal("orbit detector rng poisoned"))?;
        if rng.random_bool(self.miss_rate) {
            return Ok(Vec::new());
        }
        let jittered = Point2D::new(
            center.x + rng.random_range(-JITTER..=JITTER),
            center.y + rng.random_range(-JITTER..=JITTER),
        );
        let mut faces = vec![Self::face_at(jittered)];
        if rng.random_bool(self.crowd_rate) {
            let bystander = Point2D::new(
                rng.random_range(0.0..f64::from(frame.size().width)),
                rng.random_range(0.0..f64::from(frame.size().height)),
            );
            faces.push(Self::face_at(bystander));
        }
        Ok(faces)
    }

    fn name(&self) -> &'static str {
        "orbit"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use posecap_core::{FrameSize, ImageHandle};

    fn config() -> WorkerConfig {
        WorkerConfig {
            detection_latency: Duration::ZERO,
            front_hold_frames: 2,
            turn_step_degrees: 90.0,
            miss_rate: 0.0,
            crowd_rate: 0.0,
            seed: Some(7),
            ..Default::default()
        }
    }

    fn frame() -> Frame {
        Frame::new(0, ImageHandle::blank(FrameSize::new(640, 480)))
    }

    #[test]
    fn test_pose_holds_then_turns() {
        let detector = OrbitDetector::new(&config());
        let center = Point2D::new(320.0, 240.0);
        assert_eq!(detector.pose(0, center), center);
        assert_eq!(detector.pose(1, center), center);
        assert_eq!(detector.pose(2, center), Point2D::new(380.0, 240.0));
        let down = detector.pose(3, center);
        assert!((down.x - 320.0).abs() < 1e-9);
        assert!((down.y - 300.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_single_face_near_pose() {
        let detector = OrbitDetector::new(&config());
        let faces = detector.detect(&frame()).await.unwrap();
        assert_eq!(faces.len(), 1);
        let center = faces[0].bounding_box.center();
        assert!((center.x - 320.0).abs() <= JITTER);
        assert!((center.y - 240.0).abs() <= JITTER);
        assert_eq!(faces[0].bounding_box.area(), FACE_SIZE * FACE_SIZE);
    }

    #[test]
    fn test_landmarks_circle_the_head_center() {
        let frame = frame();
        let face = OrbitDetector::face_at(Point2D::new(400.0, 200.0));
        let observation = posecap_core::FaceObservation::from_detection(&face, &frame);
        assert_eq!(observation.derived_center(), Point2D::new(400.0, 200.0));
        assert_eq!(observation.derived_radius(), LANDMARK_RADIUS);
    }

    #[tokio::test]
    async fn test_miss_and_crowd_rates() {
        let missing = OrbitDetector::new(&WorkerConfig {
            miss_rate: 1.0,
            ..config()
        });
        assert!(missing.detect(&frame()).await.unwrap().is_empty());

        let crowded = OrbitDetector::new(&WorkerConfig {
            crowd_rate: 1.0,
            ..config()
        });
        assert_eq!(crowded.detect(&frame()).await.unwrap().len(), 2);
        assert_eq!(crowded.name(), "orbit");
    }
}
