//! Shared data models for PoseCap face capture.
//!
//! This crate provides Serde-serializable types for:
//! - Points, rectangles and frame sizes in source-image pixel space
//! - Face records reported by an external landmark detector
//! - Capture directions and their angular layout

pub mod detection;
pub mod direction;

// Re-export common types
pub use detection::{DetectedFace, FaceRect};
pub use direction::{AngularWindow, Direction, DirectionLayout, LayoutError};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A point in source-image pixel coordinates (origin top-left, y down).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    /// The coordinate origin.
    pub const ORIGIN: Point2D = Point2D { x: 0.0, y: 0.0 };

    /// Create a new point.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Check that both coordinates are finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point2D {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Pixel dimensions of a camera frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    /// Create a new frame size.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Center of the frame.
    pub fn center(&self) -> Point2D {
        Point2D::new(self.width as f64 / 2.0, self.height as f64 / 2.0)
    }
}
