//! Edge frame shared by the rotatable samplers.
//!
//! - `direction`: unit vector from `v1` to `v2`.
//! - `perp`: unit vector orthogonal to `direction`, obtained from
//!   `direction × up` and then rotated about `direction` by the requested angle
//!   (right-hand rule). `up` is `+Z` unless the edge is nearly vertical.

use nalgebra::{Rotation3, Unit, Vector3};

use crate::types::Point;

/// `|direction.z|` at or above which `+X` replaces `+Z` as the up vector.
pub(crate) const STEEP_Z: f64 = 0.9;

#[derive(Clone, Copy, Debug)]
pub(crate) struct EdgeFrame {
    pub direction: Vector3<f64>,
    pub length: f64,
    pub perp: Vector3<f64>,
}

impl EdgeFrame {
    /// Pre: `v1 != v2` (callers reject zero-length edges).
    pub fn new(v1: &Point, v2: &Point, rotation_deg: f64) -> Self {
        let delta = v2 - v1;
        let length = delta.norm();
        let direction = delta / length;
        Self {
            direction,
            length,
            perp: rotated_perpendicular(&direction, rotation_deg),
        }
    }

    /// Second in-plane axis completing `(direction, perp, binormal)`.
    #[inline]
    pub fn binormal(&self) -> Vector3<f64> {
        self.direction.cross(&self.perp).normalize()
    }
}

#[inline]
pub(crate) fn up_for(direction: &Vector3<f64>) -> Vector3<f64> {
    if direction.z.abs() < STEEP_Z {
        Vector3::z()
    } else {
        Vector3::x()
    }
}

pub(crate) fn rotated_perpendicular(direction: &Vector3<f64>, rotation_deg: f64) -> Vector3<f64> {
    let perp = direction.cross(&up_for(direction)).normalize();
    if rotation_deg == 0.0 {
        return perp;
    }
    let axis = Unit::new_normalize(*direction);
    Rotation3::from_axis_angle(&axis, rotation_deg.to_radians()) * perp
}
