//! Polyline generation from a selected mesh edge.
//!
//! Flow: validate config and selection, sample the curve, drop samples rejected
//! by the collision oracle (no resampling, gaps stay), create one point object
//! per survivor, and bind the first/last samples to the edge's vertices.
//! Nothing is mutated when validation fails.

use serde::{Deserialize, Serialize};

use crate::collision::{filter_candidates, CollisionCfg};
use crate::curves;
use crate::error::{CfgError, OpError};
use crate::host::Host;
use crate::store::PolylineStore;
use crate::types::{CurveType, MeshRef, PolylineKey, VertexBinding, VertexIndex};

/// User-facing generation options.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateCfg {
    /// Number of segments; the curve has `samples + 1` points before filtering.
    pub samples: usize,
    pub curve: CurveType,
    pub rotation_deg: f64,
    pub collision: CollisionCfg,
}

impl Default for GenerateCfg {
    fn default() -> Self {
        Self {
            samples: 10,
            curve: CurveType::Arc,
            rotation_deg: 0.0,
            collision: CollisionCfg::default(),
        }
    }
}

impl GenerateCfg {
    pub const SAMPLES_RANGE: (usize, usize) = (2, 200);
    pub const ROTATION_RANGE: (f64, f64) = (-180.0, 180.0);

    pub fn validate(&self) -> Result<(), CfgError> {
        let (lo, hi) = Self::SAMPLES_RANGE;
        if !(lo..=hi).contains(&self.samples) {
            return Err(CfgError::new(
                "samples",
                format!("{} not in [{lo}, {hi}]", self.samples),
            ));
        }
        validate_rotation(self.rotation_deg)?;
        self.collision.validate()
    }
}

pub(crate) fn validate_rotation(deg: f64) -> Result<(), CfgError> {
    let (lo, hi) = GenerateCfg::ROTATION_RANGE;
    if !(lo..=hi).contains(&deg) {
        return Err(CfgError::new(
            "rotation_deg",
            format!("{deg} not in [{lo}, {hi}]"),
        ));
    }
    Ok(())
}

/// Edges currently selected on a mesh. Generation needs exactly one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdgeSelection {
    pub mesh: MeshRef,
    pub edges: Vec<(VertexIndex, VertexIndex)>,
}

impl EdgeSelection {
    pub fn single(mesh: MeshRef, a: VertexIndex, b: VertexIndex) -> Self {
        Self {
            mesh,
            edges: vec![(a, b)],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GenerateReport {
    pub key: PolylineKey,
    /// Nodes stored in the new polyline.
    pub inserted: usize,
    /// Samples dropped by the collision oracle.
    pub rejected: usize,
}

pub fn generate_polyline<H: Host + ?Sized>(
    store: &mut PolylineStore,
    host: &mut H,
    selection: &EdgeSelection,
    cfg: &GenerateCfg,
) -> Result<GenerateReport, OpError> {
    cfg.validate()?;
    let &[(i1, i2)] = selection.edges.as_slice() else {
        return Err(OpError::selection(format!(
            "select exactly one edge (got {})",
            selection.edges.len()
        )));
    };
    let mesh = selection.mesh;
    if !host.mesh_exists(mesh) {
        return Err(OpError::selection(format!("mesh {mesh:?} does not exist")));
    }
    if i1 == i2 {
        return Err(OpError::selection("edge must join two distinct vertices"));
    }
    let v1 = host
        .read_vertex(mesh, i1)
        .map_err(|e| OpError::selection(e.to_string()))?;
    let v2 = host
        .read_vertex(mesh, i2)
        .map_err(|e| OpError::selection(e.to_string()))?;

    let points = curves::generate(cfg.curve, v1, v2, cfg.samples, cfg.rotation_deg)?;
    let (kept, rejected) = filter_candidates(&*host, &points, &cfg.collision);
    let last = points.len() - 1;

    let key = store.create(cfg.curve, cfg.rotation_deg);
    if let Some(meta) = store.get_metadata_mut(key) {
        meta.edge_start = Some(v1);
        meta.edge_end = Some(v2);
        meta.source_mesh = Some(mesh);
        meta.vertex_indices = (Some(i1), Some(i2));
    }

    let mut inserted = 0;
    for (i, p) in kept {
        let is_endpoint = i == 0 || i == last;
        let obj = host.create_point_object(p);
        let Some(h) = store.insert(key, p, Some(obj), is_endpoint) else {
            continue;
        };
        inserted += 1;
        if is_endpoint {
            if let Some(node) = store.node_mut(h) {
                node.external_vertex = Some(VertexBinding {
                    mesh,
                    index: if i == 0 { i1 } else { i2 },
                });
                node.track(p);
            }
        }
    }

    tracing::info!(%key, curve = %cfg.curve, inserted, rejected, "generated polyline");
    Ok(GenerateReport {
        key,
        inserted,
        rejected,
    })
}
