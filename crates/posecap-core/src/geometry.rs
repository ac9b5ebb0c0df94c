//! Planar geometry helpers used to derive a face's pose reference point.

use posecap_models::Point2D;
use std::f64::consts::PI;

/// Circle through three landmark points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center: Point2D,
    /// Mean of the three point-to-center distances.
    pub radius: f64,
}

impl Circle {
    /// Returned for degenerate input; means "no derived center".
    pub const SENTINEL: Circle = Circle {
        center: Point2D::ORIGIN,
        radius: 0.0,
    };

    /// Check whether this is the degenerate-input sentinel.
    pub fn is_sentinel(&self) -> bool {
        self.radius == 0.0 && self.center == Point2D::ORIGIN
    }
}

/// Circle passing through `a`, `b` and `c`.
///
/// The center uses the determinant circumcenter formula anchored at `a`.
/// The radius is the arithmetic mean of the distances from the center to
/// each point rather than a single circumradius.
///
/// Near-collinear input returns [`Circle::SENTINEL`].
pub fn circumscribed_circle(a: Point2D, b: Point2D, c: Point2D) -> Circle {
    let k_a = b.x - a.x;
    let k_b = b.y - a.y;
    let k_c = c.x - a.x;
    let k_d = c.y - a.y;

    if !((k_a != 0.0 && k_d != 0.0) || (k_b != 0.0 && k_c != 0.0)) {
        return Circle::SENTINEL;
    }

    let ox = a.x
        + (k_d * (k_a.powi(2) + k_b.powi(2)) - k_b * (k_c.powi(2) + k_d.powi(2)))
            / (k_a * k_d - k_b * k_c)
            / 2.0;
    let oy = if k_b != 0.0 {
        (k_a * (a.x + b.x - ox - ox) + k_b * (a.y + b.y)) / k_b / 2.0
    } else {
        (k_c * (a.x + c.x - ox - ox) + k_d * (a.y + c.y)) / k_d / 2.0
    };
    let center = Point2D::new(ox, oy);

    // Collinear points that slip past the guard divide by a zero determinant
    if !center.is_finite() {
        return Circle::SENTINEL;
    }

    let r_a = distance(center, a);
    let r_b = distance(center, b);
    let r_c = distance(center, c);

    Circle {
        center,
        radius: (r_a + r_b + r_c) / 3.0,
    }
}

/// Euclidean distance between two points.
#[inline]
pub fn distance(p: Point2D, q: Point2D) -> f64 {
    ((p.x - q.x).powi(2) + (p.y - q.y).powi(2)).sqrt()
}

/// Unsigned area of the triangle `a`, `b`, `c`.
pub fn triangle_area(a: Point2D, b: Point2D, c: Point2D) -> f64 {
    ((a.x - c.x) * (b.y - a.y) - (a.x - b.x) * (c.y - a.y)).abs() / 2.0
}

/// Angle of `point` around `origin`, in whole degrees within `[0, 360)`.
///
/// The value is floored, not rounded: 89.9 degrees reports as 89.
pub fn angle_degrees(point: Point2D, origin: Point2D) -> f64 {
    let mut radians = (point.y - origin.y).atan2(point.x - origin.x);
    if radians < 0.0 {
        radians += 2.0 * PI;
    }
    let degrees = (radians * 360.0 / (2.0 * PI)).floor();
    // A tiny negative angle rounds up to a full turn after adding 2*PI
    if degrees >= 360.0 {
        0.0
    } else {
        degrees
    }
}
