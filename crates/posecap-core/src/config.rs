//! Configuration for pose classification and capture.
//!
//! All lengths are in source-image pixels and all areas in square
//! source-image pixels, with the origin at the top-left corner.

use posecap_models::DirectionLayout;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CaptureError, CaptureResult};

/// Reference point that peripheral distances and angles are measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AngleReference {
    /// Derived center of the captured front observation.
    #[default]
    FrontFace,
    /// Center of the current frame.
    FrameCenter,
}

impl AngleReference {
    pub fn as_str(&self) -> &'static str {
        match self {
            AngleReference::FrontFace => "front_face",
            AngleReference::FrameCenter => "frame_center",
        }
    }
}

impl fmt::Display for AngleReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AngleReference {
    type Err = CaptureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "front_face" | "front" => Ok(AngleReference::FrontFace),
            "frame_center" | "frame" => Ok(AngleReference::FrameCenter),
            _ => Err(CaptureError::invalid_config(format!(
                "Unknown angle reference: {}",
                s
            ))),
        }
    }
}

/// Coordinate origin used by the detector when reporting faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DetectorOrigin {
    /// Top-left origin, y down. No conversion needed.
    #[default]
    TopLeft,
    /// Bottom-left origin, y up. Records are flipped before classification.
    BottomLeft,
}

impl FromStr for DetectorOrigin {
    type Err = CaptureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "top_left" => Ok(DetectorOrigin::TopLeft),
            "bottom_left" => Ok(DetectorOrigin::BottomLeft),
            _ => Err(CaptureError::invalid_config(format!(
                "Unknown detector origin: {}",
                s
            ))),
        }
    }
}

/// Per-axis factors mapping detector coordinates to source-image pixels.
///
/// Use when the detector runs on a resized copy of the frame and reports
/// positions in that copy's pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectorScale {
    pub x: f64,
    pub y: f64,
}

impl DetectorScale {
    pub const IDENTITY: DetectorScale = DetectorScale { x: 1.0, y: 1.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Scale for a detector that saw a `detector_width` x `detector_height`
    /// copy of a `frame_width` x `frame_height` frame.
    pub fn from_sizes(
        frame_width: u32,
        frame_height: u32,
        detector_width: u32,
        detector_height: u32,
    ) -> CaptureResult<Self> {
        if detector_width == 0 || detector_height == 0 {
            return Err(CaptureError::invalid_config(
                "detector image size must be non-zero",
            ));
        }
        let scale = Self::new(
            f64::from(frame_width) / f64::from(detector_width),
            f64::from(frame_height) / f64::from(detector_height),
        );
        scale.validate()?;
        Ok(scale)
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    fn validate(&self) -> CaptureResult<()> {
        for (axis, factor) in [("x", self.x), ("y", self.y)] {
            if !factor.is_finite() || factor <= 0.0 {
                return Err(CaptureError::invalid_config(format!(
                    "detector_scale.{} must be a finite positive number, got {}",
                    axis, factor
                )));
            }
        }
        Ok(())
    }
}

impl Default for DetectorScale {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Parses `"2"` (both axes) or `"2,1.5"` (x, y).
impl FromStr for DetectorScale {
    type Err = CaptureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |part: &str| {
            part.trim().parse::<f64>().map_err(|e| {
                CaptureError::invalid_config(format!("Invalid detector scale {:?}: {}", s, e))
            })
        };
        match s.split_once(',') {
            Some((x, y)) => Ok(Self::new(parse(x)?, parse(y)?)),
            None => {
                let factor = parse(s)?;
                Ok(Self::new(factor, factor))
            }
        }
    }
}

/// Configuration for a capture session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Number and spacing of capture directions (default: front + 8)
    pub layout: DirectionLayout,

    /// Smallest accepted detector face area in square pixels (default: 22500, a 150x150 face)
    pub min_bounding_box_area: f64,

    /// Largest accepted distance between a face's derived center and its
    /// reference point, in pixels (default: 120)
    pub max_center_distance: f64,

    /// Smallest accepted distance between a peripheral face's derived
    /// center and its reference point, in pixels (default: 20). Keeps a
    /// face still held at front from filling peripheral slots.
    pub min_peripheral_offset: f64,

    /// Scale from detector coordinates to source-image pixels
    /// (default: 1.0 on both axes)
    #[serde(default)]
    pub detector_scale: DetectorScale,

    /// Reference point for peripheral directions (default: front face)
    pub angle_reference: AngleReference,

    /// Origin convention of incoming detector records (default: top-left)
    pub detector_origin: DetectorOrigin,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            layout: DirectionLayout::EIGHT_WAY,
            min_bounding_box_area: 22_500.0,
            max_center_distance: 120.0,
            min_peripheral_offset: 20.0,
            detector_scale: DetectorScale::IDENTITY,
            angle_reference: AngleReference::FrontFace,
            detector_origin: DetectorOrigin::TopLeft,
        }
    }
}

impl CaptureConfig {
    /// Four peripheral directions at 90 degree steps.
    pub fn four_way() -> Self {
        Self {
            layout: DirectionLayout::FOUR_WAY,
            ..Default::default()
        }
    }

    /// Requires a close face held near its reference point.
    pub fn strict() -> Self {
        Self {
            min_bounding_box_area: 40_000.0,
            max_center_distance: 80.0,
            ..Default::default()
        }
    }

    /// Accepts smaller faces and wider head movement.
    pub fn relaxed() -> Self {
        Self {
            min_bounding_box_area: 10_000.0,
            max_center_distance: 200.0,
            ..Default::default()
        }
    }

    /// Create config from `POSECAP_*` environment variables.
    ///
    /// Unset variables keep their defaults; set but invalid values are
    /// rejected.
    pub fn from_env() -> CaptureResult<Self> {
        let mut config = Self::default();

        if let Some(count) = env_parse::<usize>("POSECAP_DIRECTIONS")? {
            config.layout = DirectionLayout::new(count)?;
        }
        if let Some(area) = env_parse::<f64>("POSECAP_MIN_FACE_AREA")? {
            config.min_bounding_box_area = area;
        }
        if let Some(distance) = env_parse::<f64>("POSECAP_MAX_CENTER_DISTANCE")? {
            config.max_center_distance = distance;
        }
        if let Some(offset) = env_parse::<f64>("POSECAP_MIN_PERIPHERAL_OFFSET")? {
            config.min_peripheral_offset = offset;
        }
        if let Some(scale) = env_parse::<DetectorScale>("POSECAP_DETECTOR_SCALE")? {
            config.detector_scale = scale;
        }
        if let Some(reference) = env_parse::<AngleReference>("POSECAP_ANGLE_REFERENCE")? {
            config.angle_reference = reference;
        }
        if let Some(origin) = env_parse::<DetectorOrigin>("POSECAP_DETECTOR_ORIGIN")? {
            config.detector_origin = origin;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check thresholds. The layout is validated when it is built.
    pub fn validate(&self) -> CaptureResult<()> {
        if !self.min_bounding_box_area.is_finite() || self.min_bounding_box_area < 0.0 {
            return Err(CaptureError::invalid_config(format!(
                "min_bounding_box_area must be a finite non-negative number, got {}",
                self.min_bounding_box_area
            )));
        }
        if !self.max_center_distance.is_finite() || self.max_center_distance < 0.0 {
            return Err(CaptureError::invalid_config(format!(
                "max_center_distance must be a finite non-negative number, got {}",
                self.max_center_distance
            )));
        }
        if !self.min_peripheral_offset.is_finite()
            || self.min_peripheral_offset < 0.0
            || self.min_peripheral_offset >= self.max_center_distance
        {
            return Err(CaptureError::invalid_config(format!(
                "min_peripheral_offset must be non-negative and below \
                 max_center_distance ({}), got {}",
                self.max_center_distance, self.min_peripheral_offset
            )));
        }
        self.detector_scale.validate()
    }
}

fn env_parse<T>(key: &str) -> CaptureResult<Option<T>>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| CaptureError::invalid_config(format!("{}={:?}: {}", key, raw, e))),
        Err(_) => Ok(None),
    }
}
