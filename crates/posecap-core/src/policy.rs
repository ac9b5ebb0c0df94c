//! Per-direction eligibility rules.
//!
//! Front is judged against the frame center. Every peripheral direction is
//! judged against a reference point (the captured front face by default),
//! must sit at least `min_peripheral_offset` away from it, and must land
//! inside its own angular window:
//!
//! ```text
//!            270 (up)
//!               │
//!  180 (left) ──●── 0 (right)      ● = reference point
//!               │
//!            90 (down)
//! ```

use posecap_models::{AngularWindow, Direction, DirectionLayout, Point2D};
use std::fmt;

use crate::config::{AngleReference, CaptureConfig};
use crate::error::CaptureResult;
use crate::geometry::{angle_degrees, distance};
use crate::observation::FaceObservation;

/// Why an observation was not accepted for a direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RejectReason {
    /// Landmarks were collinear; no center could be derived.
    DegenerateLandmarks,
    /// Detector face area below the minimum.
    FaceTooSmall { area: f64, min: f64 },
    /// Derived center too far from the reference point.
    TooFarFromReference { distance: f64, max: f64 },
    /// Derived center too close to the reference point to have a direction.
    TooCloseToReference { distance: f64, min: f64 },
    /// Angle around the reference point outside the direction's window.
    OutsideWindow { angle: f64 },
}

impl RejectReason {
    /// Short stable name for logs and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::DegenerateLandmarks => "degenerate_landmarks",
            RejectReason::FaceTooSmall { .. } => "face_too_small",
            RejectReason::TooFarFromReference { .. } => "too_far",
            RejectReason::TooCloseToReference { .. } => "too_close",
            RejectReason::OutsideWindow { .. } => "outside_window",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::DegenerateLandmarks => write!(f, "degenerate landmarks"),
            RejectReason::FaceTooSmall { area, min } => {
                write!(f, "face area {:.0} below minimum {:.0}", area, min)
            }
            RejectReason::TooFarFromReference { distance, max } => {
                write!(f, "center offset {:.1} above maximum {:.1}", distance, max)
            }
            RejectReason::TooCloseToReference { distance, min } => {
                write!(f, "center offset {:.1} below minimum {:.1}", distance, min)
            }
            RejectReason::OutsideWindow { angle } => write!(f, "angle {} outside window", angle),
        }
    }
}

/// Result of an eligibility check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    Accept,
    Reject(RejectReason),
}

impl Verdict {
    pub fn is_accept(&self) -> bool {
        matches!(self, Verdict::Accept)
    }
}

/// Eligibility rules for every direction of a layout.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionPolicy {
    layout: DirectionLayout,
    min_area: f64,
    max_distance: f64,
    min_offset: f64,
    angle_reference: AngleReference,
}

impl DirectionPolicy {
    /// Build a policy from a validated configuration.
    pub fn new(config: &CaptureConfig) -> CaptureResult<Self> {
        config.validate()?;
        Ok(Self {
            layout: config.layout,
            min_area: config.min_bounding_box_area,
            max_distance: config.max_center_distance,
            min_offset: config.min_peripheral_offset,
            angle_reference: config.angle_reference,
        })
    }

    pub fn layout(&self) -> DirectionLayout {
        self.layout
    }

    pub fn angle_reference(&self) -> AngleReference {
        self.angle_reference
    }

    /// Front eligibility: big enough and centered in the frame.
    pub fn evaluate_front(&self, observation: &FaceObservation) -> Verdict {
        if let Err(reason) = self.check_shape(observation) {
            return Verdict::Reject(reason);
        }
        match self.check_distance(observation.derived_center(), observation.frame_center()) {
            Ok(()) => Verdict::Accept,
            Err(reason) => Verdict::Reject(reason),
        }
    }

    /// Peripheral eligibility of `direction` given the captured front
    /// observation.
    ///
    /// Fails if `direction` is front or outside the layout.
    pub fn evaluate_peripheral(
        &self,
        direction: Direction,
        observation: &FaceObservation,
        front: &FaceObservation,
    ) -> CaptureResult<Verdict> {
        let window = self.layout.window(direction)?.ok_or_else(|| {
            crate::error::CaptureError::invalid_config("front has no angular window")
        })?;
        Ok(self.evaluate_window(window, observation, front))
    }

    /// Boolean view of [`DirectionPolicy::evaluate_front`].
    pub fn is_front_eligible(&self, observation: &FaceObservation) -> bool {
        self.evaluate_front(observation).is_accept()
    }

    /// Boolean view of [`DirectionPolicy::evaluate_peripheral`]; invalid
    /// directions are never eligible.
    pub fn is_peripheral_eligible(
        &self,
        direction: Direction,
        observation: &FaceObservation,
        front: &FaceObservation,
    ) -> bool {
        self.evaluate_peripheral(direction, observation, front)
            .map(|verdict| verdict.is_accept())
            .unwrap_or(false)
    }

    /// Boolean eligibility for any direction. Peripheral directions are
    /// never eligible before a front observation exists.
    pub fn is_eligible(
        &self,
        direction: Direction,
        observation: &FaceObservation,
        front: Option<&FaceObservation>,
    ) -> bool {
        match (direction, front) {
            (Direction::Front, _) => self.is_front_eligible(observation),
            (Direction::Peripheral(_), Some(front)) => {
                self.is_peripheral_eligible(direction, observation, front)
            }
            (Direction::Peripheral(_), None) => false,
        }
    }

    pub(crate) fn evaluate_window(
        &self,
        window: AngularWindow,
        observation: &FaceObservation,
        front: &FaceObservation,
    ) -> Verdict {
        if let Err(reason) = self.check_shape(observation) {
            return Verdict::Reject(reason);
        }
        let reference = self.reference_point(observation, front);
        let center = observation.derived_center();
        let offset = distance(center, reference);
        if offset < self.min_offset {
            return Verdict::Reject(RejectReason::TooCloseToReference {
                distance: offset,
                min: self.min_offset,
            });
        }
        if let Err(reason) = self.check_distance(center, reference) {
            return Verdict::Reject(reason);
        }
        let angle = angle_degrees(center, reference);
        if window.contains(angle) {
            Verdict::Accept
        } else {
            Verdict::Reject(RejectReason::OutsideWindow { angle })
        }
    }

    /// Checks shared by every direction: usable landmarks and minimum size.
    fn check_shape(&self, observation: &FaceObservation) -> Result<(), RejectReason> {
        if !observation.has_derived_center() {
            return Err(RejectReason::DegenerateLandmarks);
        }
        let area = observation.bounding_box_area();
        if !(area >= self.min_area) {
            return Err(RejectReason::FaceTooSmall {
                area,
                min: self.min_area,
            });
        }
        Ok(())
    }

    fn check_distance(&self, center: Point2D, reference: Point2D) -> Result<(), RejectReason> {
        let d = distance(center, reference);
        if d <= self.max_distance {
            Ok(())
        } else {
            Err(RejectReason::TooFarFromReference {
                distance: d,
                max: self.max_distance,
            })
        }
    }

    fn reference_point(&self, observation: &FaceObservation, front: &FaceObservation) -> Point2D {
        match self.angle_reference {
            AngleReference::FrontFace => front.derived_center(),
            AngleReference::FrameCenter => observation.frame_center(),
        }
    }
}
