//! Collision oracle: face-centroid proximity against visible solid surfaces.
//!
//! This is a cheap heuristic, not a point-to-surface distance. A point close to
//! a face's edge or corner but farther than `threshold` from its centroid is not
//! reported. Distances are measured in each surface's local frame.

use nalgebra::{Matrix4, Point3};
use serde::{Deserialize, Serialize};

use crate::error::CfgError;
use crate::host::SurfaceQuery;
use crate::types::Point;

/// One visible solid surface as seen by the oracle.
#[derive(Clone, Debug, PartialEq)]
pub struct Surface {
    pub world_from_local: Matrix4<f64>,
    /// Face centroids in local coordinates.
    pub face_centroids: Vec<Point>,
}

impl Surface {
    /// `p` mapped into local coordinates; `None` for a singular transform.
    pub fn to_local(&self, p: &Point) -> Option<Point> {
        let inv = self.world_from_local.try_inverse()?;
        Point3::from_homogeneous(inv * Point3::from(*p).to_homogeneous()).map(|q| q.coords)
    }

    /// Whether any face centroid lies strictly closer than `threshold` to `p`.
    pub fn near(&self, p: &Point, threshold: f64) -> bool {
        let Some(local) = self.to_local(p) else {
            return false;
        };
        self.face_centroids
            .iter()
            .any(|c| (local - c).norm() < threshold)
    }
}

/// Short-circuits on the first surface with a face centroid within `threshold`.
/// An empty scene never collides.
pub fn collides<Q: SurfaceQuery + ?Sized>(query: &Q, point: &Point, threshold: f64) -> bool {
    query
        .solid_surfaces()
        .iter()
        .any(|s| s.near(point, threshold))
}

/// Collision filtering options for generation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionCfg {
    pub enabled: bool,
    /// Distance in `[0.001, 1.0]`.
    pub threshold: f64,
}

impl Default for CollisionCfg {
    fn default() -> Self {
        Self {
            enabled: false,
            threshold: 0.05,
        }
    }
}

impl CollisionCfg {
    pub const THRESHOLD_RANGE: (f64, f64) = (0.001, 1.0);

    pub fn validate(&self) -> Result<(), CfgError> {
        let (lo, hi) = Self::THRESHOLD_RANGE;
        if !(lo..=hi).contains(&self.threshold) {
            return Err(CfgError::new(
                "collision.threshold",
                format!("{} not in [{lo}, {hi}]", self.threshold),
            ));
        }
        Ok(())
    }
}

/// Split `candidates` into survivors (with their sample index) and a rejection
/// count. With collision disabled every candidate survives.
pub fn filter_candidates<Q: SurfaceQuery + ?Sized>(
    query: &Q,
    candidates: &[Point],
    cfg: &CollisionCfg,
) -> (Vec<(usize, Point)>, usize) {
    if !cfg.enabled {
        return (candidates.iter().copied().enumerate().collect(), 0);
    }
    let surfaces = query.solid_surfaces();
    let mut kept = Vec::with_capacity(candidates.len());
    let mut rejected = 0;
    for (i, p) in candidates.iter().enumerate() {
        if surfaces.iter().any(|s| s.near(p, cfg.threshold)) {
            rejected += 1;
        } else {
            kept.push((i, *p));
        }
    }
    (kept, rejected)
}
