//! Write-once capture slots, one per direction.
//!
//! The registry is the capture state machine. Its state is the set of
//! filled slots; it is terminal once every slot is filled.
//!
//! - While front is empty only front can be captured.
//! - Once front is filled, peripheral directions are tried in ascending
//!   index order and the first eligible empty one is filled.
//! - A filled slot is never overwritten, and one observation fills at most
//!   one slot.

use chrono::{DateTime, Utc};
use posecap_models::{DetectedFace, Direction, DirectionLayout, Point2D};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::CaptureConfig;
use crate::error::CaptureResult;
use crate::frame::{Frame, ImageHandle};
use crate::metrics;
use crate::observation::FaceObservation;
use crate::policy::{DirectionPolicy, Verdict};

/// What happened to one processed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum FrameOutcome {
    /// The single face in the frame filled this direction's slot.
    Captured(Direction),
    /// One face was found but it filled no slot.
    NoMatch,
    /// The detector found no face.
    NoFace,
    /// The detector found several faces; the frame was skipped.
    MultipleFaces(usize),
    /// The detector failed on this frame.
    DetectorFailed,
}

impl FrameOutcome {
    /// The direction captured by this frame, if any.
    pub fn captured(&self) -> Option<Direction> {
        match self {
            FrameOutcome::Captured(direction) => Some(*direction),
            _ => None,
        }
    }

    /// Short stable name for logs and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            FrameOutcome::Captured(_) => "captured",
            FrameOutcome::NoMatch => "no_match",
            FrameOutcome::NoFace => "no_face",
            FrameOutcome::MultipleFaces(_) => "multiple_faces",
            FrameOutcome::DetectorFailed => "detector_failed",
        }
    }
}

/// Capture slots for one session.
#[derive(Debug)]
pub struct CaptureRegistry {
    session_id: Uuid,
    policy: DirectionPolicy,
    slots: Vec<Option<FaceObservation>>,
    started_at: DateTime<Utc>,
}

impl CaptureRegistry {
    /// Create an empty registry from a configuration.
    pub fn new(config: &CaptureConfig) -> CaptureResult<Self> {
        Ok(Self::with_policy(DirectionPolicy::new(config)?))
    }

    /// Create an empty registry around an existing policy.
    pub fn with_policy(policy: DirectionPolicy) -> Self {
        let slots = vec![None; policy.layout().count()];
        Self {
            session_id: Uuid::new_v4(),
            policy,
            slots,
            started_at: Utc::now(),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn policy(&self) -> &DirectionPolicy {
        &self.policy
    }

    pub fn layout(&self) -> DirectionLayout {
        self.policy.layout()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Try to record one observation.
    ///
    /// Returns the direction whose slot was filled, or `None` if the
    /// observation filled nothing.
    pub fn capture(&mut self, observation: FaceObservation) -> Option<Direction> {
        let layout = self.layout();
        let front_index = layout.front_index();

        let Some(front) = self.slots[front_index].as_ref() else {
            return match self.policy.evaluate_front(&observation) {
                Verdict::Accept => {
                    self.fill(front_index, Direction::Front, observation);
                    Some(Direction::Front)
                }
                Verdict::Reject(reason) => {
                    debug!(frame_id = observation.frame_id(), %reason, "Front not eligible");
                    None
                }
            };
        };

        let mut matched = None;
        for direction in layout.peripherals() {
            let Ok(index) = layout.index_of(direction) else {
                continue;
            };
            if self.slots[index].is_some() {
                continue;
            }
            let Ok(Some(window)) = layout.window(direction) else {
                continue;
            };
            match self.policy.evaluate_window(window, &observation, front) {
                Verdict::Accept => {
                    matched = Some((index, direction));
                    break;
                }
                Verdict::Reject(reason) => {
                    debug!(
                        frame_id = observation.frame_id(),
                        direction = %direction,
                        %reason,
                        "Peripheral not eligible"
                    );
                }
            }
        }

        let (index, direction) = matched?;
        self.fill(index, direction, observation);
        Some(direction)
    }

    /// Classify the detector output for one frame.
    ///
    /// Exactly one face is required; frames with zero or several faces are
    /// skipped without touching any slot.
    pub fn capture_faces(&mut self, faces: &[DetectedFace], frame: &Frame) -> FrameOutcome {
        match faces {
            [] => FrameOutcome::NoFace,
            [face] => match self.capture(FaceObservation::from_detection(face, frame)) {
                Some(direction) => FrameOutcome::Captured(direction),
                None => FrameOutcome::NoMatch,
            },
            many => {
                debug!(frame_id = frame.id, faces = many.len(), "Skipping frame with several faces");
                FrameOutcome::MultipleFaces(many.len())
            }
        }
    }

    fn fill(&mut self, index: usize, direction: Direction, observation: FaceObservation) {
        debug_assert!(self.slots[index].is_none(), "slot {} already filled", index);
        let label = self.layout().label(direction);
        info!(
            session_id = %self.session_id,
            direction = %label,
            frame_id = observation.frame_id(),
            filled = self.filled_count() + 1,
            total = self.slots.len(),
            "Captured direction"
        );
        metrics::record_capture(&label);
        self.slots[index] = Some(observation);
    }

    /// True once every direction has been captured.
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    pub fn filled_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Observation stored for a direction, if captured.
    pub fn slot(&self, direction: Direction) -> CaptureResult<Option<&FaceObservation>> {
        let index = self.layout().index_of(direction)?;
        Ok(self.slots[index].as_ref())
    }

    /// The captured front observation, if any.
    pub fn front(&self) -> Option<&FaceObservation> {
        self.slots[self.layout().front_index()].as_ref()
    }

    /// Directions still waiting for a capture, in index order.
    pub fn pending(&self) -> Vec<Direction> {
        self.layout()
            .directions()
            .zip(self.slots.iter())
            .filter(|(_, slot)| slot.is_none())
            .map(|(direction, _)| direction)
            .collect()
    }

    /// Captured directions with their observations, in index order.
    pub fn captured(&self) -> impl Iterator<Item = (Direction, &FaceObservation)> {
        self.layout()
            .directions()
            .zip(self.slots.iter())
            .filter_map(|(direction, slot)| slot.as_ref().map(|obs| (direction, obs)))
    }

    /// The ordered gallery, available once the registry is complete.
    pub fn gallery(&self) -> Option<Gallery> {
        if !self.is_complete() {
            return None;
        }
        let layout = self.layout();
        let entries = self
            .captured()
            .map(|(direction, observation)| GalleryEntry {
                direction,
                label: layout.label(direction),
                observation: observation.clone(),
            })
            .collect();
        Some(Gallery {
            session_id: self.session_id,
            entries,
        })
    }
}

/// One captured image in the gallery.
#[derive(Debug, Clone)]
pub struct GalleryEntry {
    pub direction: Direction,
    pub label: String,
    pub observation: FaceObservation,
}

impl GalleryEntry {
    pub fn image(&self) -> &ImageHandle {
        self.observation.image()
    }
}

/// All captured images of a completed session, one per direction in
/// direction index order.
#[derive(Debug, Clone)]
pub struct Gallery {
    pub session_id: Uuid,
    pub entries: Vec<GalleryEntry>,
}

impl Gallery {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn images(&self) -> impl Iterator<Item = &ImageHandle> {
        self.entries.iter().map(GalleryEntry::image)
    }

    /// Serializable description of the gallery without pixel data.
    pub fn summary(&self) -> GallerySummary {
        GallerySummary {
            session_id: self.session_id,
            entries: self
                .entries
                .iter()
                .map(|entry| GalleryEntrySummary {
                    direction: entry.direction,
                    label: entry.label.clone(),
                    frame_id: entry.observation.frame_id(),
                    derived_center: entry.observation.derived_center(),
                    bounding_box_area: entry.observation.bounding_box_area(),
                    observed_at: entry.observation.observed_at(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GallerySummary {
    pub session_id: Uuid,
    pub entries: Vec<GalleryEntrySummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GalleryEntrySummary {
    pub direction: Direction,
    pub label: String,
    pub frame_id: u64,
    pub derived_center: Point2D,
    pub bounding_box_area: f64,
    pub observed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::face_with_center;
    use posecap_models::{FaceRect, FrameSize};

    const FRAME: FrameSize = FrameSize::new(640, 480);

    fn config() -> CaptureConfig {
        CaptureConfig {
            min_bounding_box_area: 10_000.0,
            max_center_distance: 100.0,
            ..Default::default()
        }
    }

    fn face(x: f64, y: f64) -> DetectedFace {
        face_with_center(
            Point2D::new(x, y),
            40.0,
            FaceRect::new(x - 80.0, y - 80.0, 160.0, 160.0),
        )
    }

    fn observe(id: u64, x: f64, y: f64) -> FaceObservation {
        let frame = Frame::new(id, ImageHandle::blank(FRAME));
        FaceObservation::from_detection(&face(x, y), &frame)
    }

    #[test]
    fn test_new_registry_is_empty() {
        let registry = CaptureRegistry::new(&config()).unwrap();
        assert_eq!(registry.filled_count(), 0);
        assert!(!registry.is_complete());
        assert_eq!(registry.pending().len(), 9);
        assert!(registry.front().is_none());
        assert!(registry.gallery().is_none());
    }

    #[test]
    fn test_front_is_captured_once() {
        let mut registry = CaptureRegistry::new(&config()).unwrap();
        assert_eq!(registry.capture(observe(1, 320.0, 240.0)), Some(Direction::Front));
        let kept = registry.front().unwrap().image().clone();

        // a second centered face is front-eligible but front is taken, and it
        // is too close to the front center to count as any peripheral direction
        assert_eq!(registry.capture(observe(2, 320.0, 240.0)), None);
        assert_eq!(registry.filled_count(), 1);
        assert!(registry.front().unwrap().image().same_image(&kept));
        assert_eq!(registry.front().unwrap().frame_id(), 1);
    }

    #[test]
    fn test_front_never_returned_twice() {
        let mut registry = CaptureRegistry::new(&config()).unwrap();
        let mut fronts = 0;
        for id in 0..20 {
            if registry.capture(observe(id, 321.0, 241.0)) == Some(Direction::Front) {
                fronts += 1;
            }
        }
        assert_eq!(fronts, 1);
    }

    #[test]
    fn test_jitter_around_front_fills_nothing() {
        let mut registry = CaptureRegistry::new(&config()).unwrap();
        assert_eq!(registry.capture(observe(0, 320.0, 240.0)), Some(Direction::Front));

        let jitter = [
            (1.5, 0.0),
            (1.0, 1.0),
            (0.0, 1.5),
            (-1.0, 1.0),
            (-1.5, 0.0),
            (-1.0, -1.0),
            (0.0, -1.5),
            (1.0, -1.5),
        ];
        for (id, (dx, dy)) in jitter.into_iter().enumerate() {
            let observation = observe(id as u64 + 1, 320.0 + dx, 240.0 + dy);
            assert_eq!(registry.capture(observation), None, "offset ({}, {})", dx, dy);
        }
        assert_eq!(registry.filled_count(), 1);
        assert!(!registry.is_complete());
        assert_eq!(registry.pending().len(), 8);
    }

    #[test]
    fn test_peripheral_requires_front() {
        let mut registry = CaptureRegistry::new(&config()).unwrap();
        // down-right of the frame center but too far to be front
        assert_eq!(registry.capture(observe(1, 420.0, 340.0)), None);
        assert_eq!(registry.filled_count(), 0);
    }

    #[test]
    fn test_peripheral_at_ninety_degrees() {
        let mut registry = CaptureRegistry::new(&config()).unwrap();
        registry.capture(observe(1, 320.0, 240.0));

        assert_eq!(registry.capture(observe(2, 320.0, 300.0)), Some(Direction::Peripheral(2)));
        assert_eq!(registry.filled_count(), 2);
        for direction in registry.layout().peripherals() {
            let filled = registry.slot(direction).unwrap().is_some();
            assert_eq!(filled, direction == Direction::Peripheral(2));
        }
    }

    #[test]
    fn test_filled_peripheral_is_not_overwritten() {
        let mut registry = CaptureRegistry::new(&config()).unwrap();
        registry.capture(observe(1, 320.0, 240.0));
        assert_eq!(registry.capture(observe(2, 320.0, 300.0)), Some(Direction::Peripheral(2)));
        assert_eq!(registry.capture(observe(3, 320.0, 310.0)), None);
        let stored = registry.slot(Direction::Peripheral(2)).unwrap().unwrap();
        assert_eq!(stored.frame_id(), 2);
    }

    #[test]
    fn test_one_observation_fills_one_slot() {
        // With a single peripheral direction every angle is in its window.
        let mut registry = CaptureRegistry::new(&CaptureConfig {
            layout: DirectionLayout::new(2).unwrap(),
            ..config()
        })
        .unwrap();
        registry.capture(observe(1, 320.0, 240.0));
        assert_eq!(registry.capture(observe(2, 350.0, 250.0)), Some(Direction::Peripheral(0)));
        assert!(registry.is_complete());
        assert_eq!(registry.capture(observe(3, 350.0, 250.0)), None);
    }

    #[test]
    fn test_multiple_faces_skip_frame() {
        let mut registry = CaptureRegistry::new(&config()).unwrap();
        let frame = Frame::new(1, ImageHandle::blank(FRAME));
        let eligible = face(320.0, 240.0);
        let other = face(100.0, 100.0);

        let outcome = registry.capture_faces(&[eligible, other], &frame);
        assert_eq!(outcome, FrameOutcome::MultipleFaces(2));
        assert_eq!(registry.filled_count(), 0);

        assert_eq!(registry.capture_faces(&[], &frame), FrameOutcome::NoFace);
        assert_eq!(registry.filled_count(), 0);

        assert_eq!(
            registry.capture_faces(&[eligible], &frame),
            FrameOutcome::Captured(Direction::Front)
        );
    }

    #[test]
    fn test_small_face_is_no_match() {
        let mut registry = CaptureRegistry::new(&config()).unwrap();
        let frame = Frame::new(1, ImageHandle::blank(FRAME));
        let tiny = face_with_center(
            Point2D::new(320.0, 240.0),
            10.0,
            FaceRect::new(300.0, 220.0, 40.0, 40.0),
        );
        assert_eq!(registry.capture_faces(&[tiny], &frame), FrameOutcome::NoMatch);
    }

    #[test]
    fn test_completion_is_monotonic() {
        let mut registry = CaptureRegistry::new(&config()).unwrap();
        let offsets = [
            (60.0, 0.0),
            (60.0, 60.0),
            (0.0, 60.0),
            (-60.0, 60.0),
            (-60.0, 0.0),
            (-60.0, -60.0),
            (0.0, -60.0),
            (60.0, -60.0),
        ];
        registry.capture(observe(0, 320.0, 240.0));
        for (i, (dx, dy)) in offsets.iter().enumerate() {
            assert!(!registry.is_complete());
            assert!(registry.capture(observe(i as u64 + 1, 320.0 + dx, 240.0 + dy)).is_some());
        }
        assert!(registry.is_complete());
        assert!(registry.pending().is_empty());
        for id in 100..110 {
            assert_eq!(registry.capture(observe(id, 320.0, 240.0)), None);
            assert!(registry.is_complete());
        }

        let gallery = registry.gallery().unwrap();
        assert_eq!(gallery.len(), 9);
        let labels: Vec<_> = gallery.entries.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(
            labels,
            [
                "right", "down_right", "down", "down_left", "left", "up_left", "up", "up_right",
                "front"
            ]
        );
    }

    #[test]
    fn test_outcome_serde() {
        let json = serde_json::to_value(FrameOutcome::Captured(Direction::Front)).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "captured", "value": "front" }));
        let json = serde_json::to_value(FrameOutcome::NoFace).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "no_face" }));
    }
}
