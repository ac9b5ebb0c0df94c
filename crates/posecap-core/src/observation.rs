//! Face observations derived from detector records.

use chrono::{DateTime, Utc};
use posecap_models::{DetectedFace, Point2D};

use crate::frame::{Frame, ImageHandle};
use crate::geometry::{circumscribed_circle, distance, triangle_area, Circle};

/// The three landmarks used for pose classification plus the detector's
/// face area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceLandmarks {
    pub left_eye: Point2D,
    pub right_eye: Point2D,
    pub mouth: Point2D,
    /// Detector rectangle area in square source pixels
    pub bounding_box_area: f64,
}

impl FaceLandmarks {
    /// Take landmarks and area from a detector record.
    ///
    /// The area comes from the reported rectangle, never from the landmarks.
    pub fn from_detection(face: &DetectedFace) -> Self {
        Self {
            left_eye: face.left_eye,
            right_eye: face.right_eye,
            mouth: face.mouth,
            bounding_box_area: face.bounding_box.area(),
        }
    }
}

/// One detected face in one frame, with its derived pose reference point.
#[derive(Debug, Clone)]
pub struct FaceObservation {
    landmarks: FaceLandmarks,
    frame_center: Point2D,
    derived: Circle,
    image: ImageHandle,
    frame_id: u64,
    observed_at: DateTime<Utc>,
}

impl FaceObservation {
    /// Build an observation from landmarks and the frame they came from.
    pub fn new(landmarks: FaceLandmarks, frame: &Frame) -> Self {
        let derived = circumscribed_circle(landmarks.right_eye, landmarks.left_eye, landmarks.mouth);
        Self {
            landmarks,
            frame_center: frame.size().center(),
            derived,
            image: frame.image.clone(),
            frame_id: frame.id,
            observed_at: frame.captured_at,
        }
    }

    /// Build an observation from a detector record.
    pub fn from_detection(face: &DetectedFace, frame: &Frame) -> Self {
        Self::new(FaceLandmarks::from_detection(face), frame)
    }

    pub fn landmarks(&self) -> &FaceLandmarks {
        &self.landmarks
    }

    pub fn bounding_box_area(&self) -> f64 {
        self.landmarks.bounding_box_area
    }

    /// Center of the source frame.
    pub fn frame_center(&self) -> Point2D {
        self.frame_center
    }

    /// Center of the circle through the right eye, left eye and mouth.
    pub fn derived_center(&self) -> Point2D {
        self.derived.center
    }

    pub fn derived_radius(&self) -> f64 {
        self.derived.radius
    }

    /// False when the landmarks were degenerate and no center could be
    /// derived.
    pub fn has_derived_center(&self) -> bool {
        !self.derived.is_sentinel()
    }

    /// Distance from the derived center to the frame center.
    pub fn offset_from_frame_center(&self) -> f64 {
        distance(self.derived.center, self.frame_center)
    }

    /// Area of the eye-eye-mouth triangle.
    pub fn landmark_area(&self) -> f64 {
        triangle_area(self.landmarks.right_eye, self.landmarks.left_eye, self.landmarks.mouth)
    }

    /// Handle to the frame image this observation was taken from.
    pub fn image(&self) -> &ImageHandle {
        &self.image
    }

    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    pub fn observed_at(&self) -> DateTime<Utc> {
        self.observed_at
    }
}
