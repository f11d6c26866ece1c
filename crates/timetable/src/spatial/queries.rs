//! Distance and interpolation helpers.
//!
//! Uses the Haversine formula for distances on Earth's surface.

use geo::{Coord, HaversineDistance, Line, LineInterpolatePoint, Point};

/// Calculate Haversine distance between two points in meters
pub fn haversine_distance(p1: Point, p2: Point) -> f64 {
    p1.haversine_distance(&p2)
}

/// Point a fraction of the way from `from` to `to`; the fraction is clamped to `[0, 1]`
pub fn interpolate(from: Point, to: Point, fraction: f64) -> Point {
    let line = Line::new(Coord::from(from), Coord::from(to));
    line.line_interpolate_point(fraction.clamp(0.0, 1.0))
        .unwrap_or(from)
}

/// Convert meters to degrees at the equator, an upper bound for R-tree pre-filtering
pub fn meters_to_degrees_approx(meters: f64) -> f64 {
    meters / 111_320.0
}
