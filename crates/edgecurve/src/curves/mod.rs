//! Curve generators: `(v1, v2, n, rotation) -> n + 1 points` along an edge.
//!
//! Purpose
//! - Produce reproducible point sequences between two edge vertices for each
//!   `CurveType`. Output is deterministic for identical inputs.
//!
//! Conventions
//! - First point is `v1`, last is `v2`, both copied exactly.
//! - Rotation is in degrees about the edge direction (right-hand rule). Linear
//!   ignores it.
//! - Degenerate inputs (`n == 0`, zero-length edge) are rejected by `generate`;
//!   the individual samplers assume valid input.

mod frame;
mod sample;

pub use sample::{arc_points, helix_points, linear_points, spline_points};

use crate::types::{CurveType, Point};
use thiserror::Error;

/// Edges shorter than this are treated as zero-length.
pub const MIN_EDGE_LEN: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CurveError {
    #[error("sample count must be at least 1")]
    ZeroSamples,
    #[error("edge endpoints coincide (length {0:e})")]
    DegenerateEdge(f64),
}

/// Sample `curve` between `v1` and `v2` with `n` segments.
pub fn generate(
    curve: CurveType,
    v1: Point,
    v2: Point,
    n: usize,
    rotation_deg: f64,
) -> Result<Vec<Point>, CurveError> {
    if n == 0 {
        return Err(CurveError::ZeroSamples);
    }
    let len = (v2 - v1).norm();
    if !(len > MIN_EDGE_LEN) {
        return Err(CurveError::DegenerateEdge(len));
    }
    Ok(match curve {
        CurveType::Linear => linear_points(v1, v2, n),
        CurveType::Arc => arc_points(v1, v2, n, rotation_deg),
        CurveType::Spline => spline_points(v1, v2, n, rotation_deg),
        CurveType::Helix => helix_points(v1, v2, n, rotation_deg),
    })
}
