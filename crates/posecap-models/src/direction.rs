//! Capture directions and their angular layout.
//!
//! A layout of `K` directions has one front direction plus `K-1` peripheral
//! directions spaced evenly around the circle:
//!
//! - Peripheral direction `i` (for `i` in `0..K-1`) covers the angular
//!   window centered on `i * 360/(K-1)` degrees.
//! - Front always has index `K-1` and sits outside the angular partition.
//!
//! Angles are measured in image space (x right, y down), so 90 degrees
//! points towards the bottom of the frame.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised while building or indexing a direction layout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("Layout needs at least 2 directions (front + 1 peripheral), got {0}")]
    TooFewDirections(usize),

    #[error("Layout of {count} directions has {peripherals} peripheral windows, which do not divide 360 degrees evenly")]
    UnevenAngleStep { count: usize, peripherals: usize },

    #[error("Direction index {index} is out of range for a layout of {count} directions")]
    IndexOutOfRange { index: usize, count: usize },
}

/// A capture direction.
///
/// Ordering follows the direction index: peripheral directions in ascending
/// index, then front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Peripheral direction with its index in `0..K-1`.
    Peripheral(u16),
    /// The front-facing reference direction (index `K-1`).
    Front,
}

impl Direction {
    /// Returns true for the front direction.
    pub fn is_front(&self) -> bool {
        matches!(self, Direction::Front)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Front => write!(f, "front"),
            Direction::Peripheral(index) => write!(f, "peripheral_{}", index),
        }
    }
}

/// Angular window of a peripheral direction, in degrees.
///
/// The window is half-open, `[center - half_width, center + half_width)`,
/// taken modulo 360 so that the window around 0 degrees wraps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngularWindow {
    pub center: f64,
    pub half_width: f64,
}

impl AngularWindow {
    /// Check whether `angle` (degrees, any range) falls inside the window.
    pub fn contains(&self, angle: f64) -> bool {
        if !angle.is_finite() {
            return false;
        }
        let offset = (angle - self.center).rem_euclid(360.0);
        offset < self.half_width || offset >= 360.0 - self.half_width
    }
}

/// Compass labels for the 8-way layout, indexed by peripheral index.
const EIGHT_WAY_LABELS: [&str; 8] = [
    "right",
    "down_right",
    "down",
    "down_left",
    "left",
    "up_left",
    "up",
    "up_right",
];

/// Validated set of `K` capture directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct DirectionLayout {
    count: u16,
}

impl DirectionLayout {
    /// Front plus eight peripheral directions at 45 degree steps.
    pub const EIGHT_WAY: DirectionLayout = DirectionLayout::checked(9);

    /// Front plus four peripheral directions at 90 degree steps.
    pub const FOUR_WAY: DirectionLayout = DirectionLayout::checked(5);

    /// Build a layout in a const context.
    ///
    /// Panics (at compile time when used in a `const`) if `count` breaks the
    /// angle-step arithmetic.
    pub const fn checked(count: usize) -> Self {
        assert!(count >= 2, "layout needs front + at least one peripheral direction");
        assert!(
            360 % (count - 1) == 0,
            "peripheral direction count must divide 360 evenly"
        );
        Self {
            count: count as u16,
        }
    }

    /// Build a layout, rejecting counts that break the angle-step arithmetic.
    pub fn new(count: usize) -> Result<Self, LayoutError> {
        if count < 2 {
            return Err(LayoutError::TooFewDirections(count));
        }
        let peripherals = count - 1;
        if 360 % peripherals != 0 {
            return Err(LayoutError::UnevenAngleStep { count, peripherals });
        }
        Ok(Self {
            count: count as u16,
        })
    }

    /// Total number of directions, front included.
    pub fn count(&self) -> usize {
        self.count as usize
    }

    /// Number of peripheral directions.
    pub fn peripheral_count(&self) -> usize {
        self.count() - 1
    }

    /// Index of the front direction.
    pub fn front_index(&self) -> usize {
        self.count() - 1
    }

    /// Angular distance between neighbouring peripheral window centers.
    pub fn angle_step(&self) -> f64 {
        360.0 / self.peripheral_count() as f64
    }

    /// Slot index of a direction.
    pub fn index_of(&self, direction: Direction) -> Result<usize, LayoutError> {
        match direction {
            Direction::Front => Ok(self.front_index()),
            Direction::Peripheral(index) => {
                let index = index as usize;
                if index < self.peripheral_count() {
                    Ok(index)
                } else {
                    Err(LayoutError::IndexOutOfRange {
                        index,
                        count: self.count(),
                    })
                }
            }
        }
    }

    /// Direction stored at a slot index.
    pub fn direction_at(&self, index: usize) -> Result<Direction, LayoutError> {
        if index == self.front_index() {
            Ok(Direction::Front)
        } else if index < self.peripheral_count() {
            Ok(Direction::Peripheral(index as u16))
        } else {
            Err(LayoutError::IndexOutOfRange {
                index,
                count: self.count(),
            })
        }
    }

    /// All directions in index order (front last).
    pub fn directions(&self) -> impl Iterator<Item = Direction> {
        self.peripherals().chain(std::iter::once(Direction::Front))
    }

    /// Peripheral directions in ascending index order.
    pub fn peripherals(&self) -> impl Iterator<Item = Direction> {
        (0..self.count - 1).map(Direction::Peripheral)
    }

    /// Angular window of a direction. Front has no window.
    pub fn window(&self, direction: Direction) -> Result<Option<AngularWindow>, LayoutError> {
        let index = self.index_of(direction)?;
        if direction.is_front() {
            return Ok(None);
        }
        let step = self.angle_step();
        Ok(Some(AngularWindow {
            center: index as f64 * step,
            half_width: step / 2.0,
        }))
    }

    /// Human-readable label of a direction in this layout.
    pub fn label(&self, direction: Direction) -> String {
        match direction {
            Direction::Front => "front".to_string(),
            Direction::Peripheral(index) if self.peripheral_count() == EIGHT_WAY_LABELS.len() => {
                EIGHT_WAY_LABELS
                    .get(index as usize)
                    .map(|label| label.to_string())
                    .unwrap_or_else(|| direction.to_string())
            }
            Direction::Peripheral(index) => {
                format!("dir{}@{}", index, index as f64 * self.angle_step())
            }
        }
    }
}

impl Default for DirectionLayout {
    fn default() -> Self {
        Self::EIGHT_WAY
    }
}

impl TryFrom<usize> for DirectionLayout {
    type Error = LayoutError;

    fn try_from(count: usize) -> Result<Self, Self::Error> {
        Self::new(count)
    }
}

impl From<DirectionLayout> for usize {
    fn from(layout: DirectionLayout) -> Self {
        layout.count()
    }
}
