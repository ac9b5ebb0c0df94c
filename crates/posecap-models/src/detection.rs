//! Records reported by the external face landmark detector.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Point2D;

/// Face rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct FaceRect {
    /// Left edge x-coordinate
    pub x: f64,
    /// Top edge y-coordinate
    pub y: f64,
    /// Rectangle width
    pub width: f64,
    /// Rectangle height
    pub height: f64,
}

impl FaceRect {
    /// Create a new face rectangle.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle area in square pixels.
    #[inline]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Center of the rectangle.
    #[inline]
    pub fn center(&self) -> Point2D {
        Point2D::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Multiply every coordinate and length by the axis factors.
    pub fn scaled(&self, sx: f64, sy: f64) -> FaceRect {
        FaceRect {
            x: self.x * sx,
            y: self.y * sy,
            width: self.width * sx,
            height: self.height * sy,
        }
    }

    /// Convert a rectangle reported with a bottom-left origin to top-left.
    pub fn flipped_vertically(&self, image_height: f64) -> FaceRect {
        FaceRect {
            x: self.x,
            y: image_height - self.y - self.height,
            width: self.width,
            height: self.height,
        }
    }
}

/// One face as reported by the detector for a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DetectedFace {
    /// Face rectangle from the detector
    pub bounding_box: FaceRect,
    /// Left eye position
    pub left_eye: Point2D,
    /// Right eye position
    pub right_eye: Point2D,
    /// Mouth position
    pub mouth: Point2D,
}

impl DetectedFace {
    /// Create a new detector record.
    pub fn new(bounding_box: FaceRect, left_eye: Point2D, right_eye: Point2D, mouth: Point2D) -> Self {
        Self {
            bounding_box,
            left_eye,
            right_eye,
            mouth,
        }
    }

    /// Map a record from a detector that ran on a resized image into the
    /// pixel space of the original frame.
    pub fn scaled(&self, sx: f64, sy: f64) -> DetectedFace {
        let scale = |p: Point2D| Point2D::new(p.x * sx, p.y * sy);
        DetectedFace {
            bounding_box: self.bounding_box.scaled(sx, sy),
            left_eye: scale(self.left_eye),
            right_eye: scale(self.right_eye),
            mouth: scale(self.mouth),
        }
    }

    /// Convert a record reported with a bottom-left origin (y up) to the
    /// top-left pixel space used by the capture core.
    pub fn flipped_vertically(&self, image_height: f64) -> DetectedFace {
        let flip = |p: Point2D| Point2D::new(p.x, image_height - p.y);
        DetectedFace {
            bounding_box: self.bounding_box.flipped_vertically(image_height),
            left_eye: flip(self.left_eye),
            right_eye: flip(self.right_eye),
            mouth: flip(self.mouth),
        }
    }
}
