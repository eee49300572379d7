//! The four samplers. All are pure and deterministic.
//!
//! Shared contract: `n >= 1` and `v1 != v2`; the output has `n + 1` points,
//! starts at `v1` and ends at `v2` exactly. `generate` in the parent module
//! enforces the preconditions; calling these directly skips that check.

use std::f64::consts::{PI, TAU};

use super::frame::EdgeFrame;
use crate::types::Point;

/// Control points sit at these fractions of the edge.
const SPLINE_CTRL_T: (f64, f64) = (1.0 / 3.0, 2.0 / 3.0);
/// Control point offset along `perp`, as a fraction of the edge length.
const SPLINE_BULGE: f64 = 0.3;
/// Helix radius as a fraction of the edge length.
const HELIX_RADIUS: f64 = 0.15;

#[inline]
fn param(i: usize, n: usize) -> f64 {
    i as f64 / n as f64
}

/// Evenly spaced points on the straight segment.
pub fn linear_points(v1: Point, v2: Point, n: usize) -> Vec<Point> {
    (0..=n).map(|i| v1.lerp(&v2, param(i, n))).collect()
}

/// Semicircle of diameter `|v2 - v1|` in the plane of the edge and `perp`.
pub fn arc_points(v1: Point, v2: Point, n: usize, rotation_deg: f64) -> Vec<Point> {
    let frame = EdgeFrame::new(&v1, &v2, rotation_deg);
    let radius = frame.length / 2.0;
    let mut points = Vec::with_capacity(n + 1);
    points.push(v1);
    for i in 1..n {
        let angle = PI * param(i, n);
        let forward = frame.direction * (radius * (1.0 - angle.cos()));
        let offset = frame.perp * (radius * angle.sin());
        points.push(v1 + forward + offset);
    }
    // n == 0 would duplicate v1 here; callers guarantee n >= 1.
    points.push(v2);
    points
}

/// Cubic Bézier whose inner control points bulge along `perp`.
pub fn spline_points(v1: Point, v2: Point, n: usize, rotation_deg: f64) -> Vec<Point> {
    let frame = EdgeFrame::new(&v1, &v2, rotation_deg);
    let bulge = frame.perp * (frame.length * SPLINE_BULGE);
    let c1 = v1 + frame.direction * (frame.length * SPLINE_CTRL_T.0) + bulge;
    let c2 = v1 + frame.direction * (frame.length * SPLINE_CTRL_T.1) + bulge;
    (0..=n)
        .map(|i| {
            let t = param(i, n);
            let s = 1.0 - t;
            v1 * (s * s * s) + c1 * (3.0 * s * s * t) + c2 * (3.0 * s * t * t) + v2 * (t * t * t)
        })
        .collect()
}

/// One full helical turn around the edge axis.
///
/// Interior points sit at constant distance `0.15 * |v2 - v1|` from the axis.
/// The formula itself starts `radius` away from `v1`; the first and last
/// samples are pinned to the edge vertices instead.
pub fn helix_points(v1: Point, v2: Point, n: usize, rotation_deg: f64) -> Vec<Point> {
    let frame = EdgeFrame::new(&v1, &v2, rotation_deg);
    let perp2 = frame.binormal();
    let radius = frame.length * HELIX_RADIUS;
    let mut points = Vec::with_capacity(n + 1);
    points.push(v1);
    for i in 1..n {
        let t = param(i, n);
        let angle = TAU * t;
        let radial = frame.perp * (radius * angle.cos()) + perp2 * (radius * angle.sin());
        points.push(v1 + frame.direction * (frame.length * t) + radial);
    }
    points.push(v2);
    points
}
