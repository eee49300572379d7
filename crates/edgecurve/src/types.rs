//! Identifiers, the point type, and engine-wide constants.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// World-space 3D coordinate. Copied on every store, never aliased.
pub type Point = Vector3<f64>;

/// Index of a vertex inside its mesh.
pub type VertexIndex = usize;

/// Drift threshold (distance units) below which an endpoint counts as unmoved.
pub const SYNC_EPS: f64 = 1e-4;

/// Cadence of the recurring endpoint sync, in seconds.
pub const SYNC_INTERVAL_SECS: f64 = 0.1;

/// Key of a polyline in a `PolylineStore`. Assigned monotonically, never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PolylineKey(pub u64);

impl fmt::Display for PolylineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Polyline_{}", self.0)
    }
}

/// Host-side handle of a mesh object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MeshRef(pub u64);

/// Host-side handle of a point object (the user-movable representation of a node).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectRef(pub u64);

/// External vertex an endpoint node tracks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VertexBinding {
    pub mesh: MeshRef,
    pub index: VertexIndex,
}

/// Curve family used to sample a polyline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveType {
    Linear,
    #[default]
    Arc,
    Spline,
    Helix,
}

impl CurveType {
    pub const ALL: [CurveType; 4] = [
        CurveType::Linear,
        CurveType::Arc,
        CurveType::Spline,
        CurveType::Helix,
    ];

    /// Whether an axial rotation changes the sampled shape.
    #[inline]
    pub fn is_rotatable(self) -> bool {
        !matches!(self, CurveType::Linear)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CurveType::Linear => "linear",
            CurveType::Arc => "arc",
            CurveType::Spline => "spline",
            CurveType::Helix => "helix",
        }
    }
}

impl fmt::Display for CurveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CurveType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linear" => Ok(CurveType::Linear),
            "arc" => Ok(CurveType::Arc),
            "spline" => Ok(CurveType::Spline),
            "helix" => Ok(CurveType::Helix),
            other => Err(format!("unknown curve type `{other}`")),
        }
    }
}
