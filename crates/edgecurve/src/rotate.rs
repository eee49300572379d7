//! Rotation-driven regeneration of existing polylines.
//!
//! Two entry points:
//! - `regenerate`: follows a rotation change on a polyline. A no-op once the
//!   polyline is flagged modified, for linear curves, and when the endpoints
//!   cannot be determined.
//! - `reset_and_rotate`: explicit reset. Clears the modified flag, re-reads each
//!   end from the vertex it is bound to, regenerates, and writes the endpoints
//!   back to bound vertices whose mesh is in edit mode.
//!
//! Both overwrite node positions in sequence order, stopping at the shorter of
//! the node chain and the fresh sample list, and reset endpoint tracking to the
//! new positions so the reconciler sees no drift.

use crate::curves;
use crate::error::OpError;
use crate::generate::validate_rotation;
use crate::host::{MeshMode, PointObjects, VertexSource};
use crate::store::{NodeHandle, PolylineStore};
use crate::types::{CurveType, MeshRef, Point, PolylineKey, VertexBinding, VertexIndex};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegenSkip {
    Modified,
    Linear,
    EndpointsUnknown,
    /// Fewer than two nodes: no segment to resample.
    TooFewPoints,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegenOutcome {
    Regenerated { points: usize },
    Skipped(RegenSkip),
}

pub fn regenerate<H>(
    store: &mut PolylineStore,
    host: &mut H,
    key: PolylineKey,
    rotation_deg: f64,
) -> Result<RegenOutcome, OpError>
where
    H: VertexSource + PointObjects + ?Sized,
{
    validate_rotation(rotation_deg)?;
    let meta = store.get_metadata(key).ok_or(OpError::NotFound(key))?;
    if meta.is_modified {
        return Ok(RegenOutcome::Skipped(RegenSkip::Modified));
    }
    if meta.curve == CurveType::Linear {
        return Ok(RegenOutcome::Skipped(RegenSkip::Linear));
    }
    let mesh_alive = meta.source_mesh.is_some_and(|m| host.mesh_exists(m));
    let (snap_start, snap_end) = (meta.edge_start, meta.edge_end);
    let line = *store.get(key).ok_or(OpError::NotFound(key))?;
    if line.len() < 2 {
        return Ok(RegenOutcome::Skipped(RegenSkip::TooFewPoints));
    }

    let v1 = live_endpoint(store, host, line.head()).or(snap_start);
    let v2 = live_endpoint(store, host, line.tail()).or(snap_end);
    let (Some(v1), Some(v2)) = (v1, v2) else {
        return Ok(RegenOutcome::Skipped(RegenSkip::EndpointsUnknown));
    };

    let points = apply(store, host, key, v1, v2, rotation_deg)?;
    if let Some(meta) = store.get_metadata_mut(key) {
        meta.rotation_deg = rotation_deg;
        if mesh_alive {
            meta.edge_start = Some(v1);
            meta.edge_end = Some(v2);
        }
    }
    tracing::debug!(%key, rotation_deg, points, "regenerated polyline");
    Ok(RegenOutcome::Regenerated { points })
}

pub fn reset_and_rotate<H>(
    store: &mut PolylineStore,
    host: &mut H,
    key: PolylineKey,
    rotation_deg: f64,
) -> Result<RegenOutcome, OpError>
where
    H: VertexSource + PointObjects + ?Sized,
{
    validate_rotation(rotation_deg)?;
    let meta = store.get_metadata(key).ok_or(OpError::NotFound(key))?;
    if meta.curve == CurveType::Linear {
        return Err(OpError::LinearRotation(key));
    }
    let Some((snap_start, snap_end)) = meta.edge() else {
        return Err(OpError::selection(format!("{key} has no generating edge")));
    };
    let (idx_start, idx_end) = meta.vertex_indices;
    let source = meta.source_mesh;
    let line = *store.get(key).ok_or(OpError::NotFound(key))?;

    let start = end_binding(store, line.head(), source, idx_start);
    let end = end_binding(store, line.tail(), source, idx_end);
    let v1 = read_end(store, host, line.head(), start).unwrap_or(snap_start);
    let v2 = read_end(store, host, line.tail(), end).unwrap_or(snap_end);

    if let Some(meta) = store.get_metadata_mut(key) {
        meta.edge_start = Some(v1);
        meta.edge_end = Some(v2);
        meta.rotation_deg = rotation_deg;
        meta.is_modified = false;
    }
    if line.len() < 2 {
        return Ok(RegenOutcome::Skipped(RegenSkip::TooFewPoints));
    }

    let points = apply(store, host, key, v1, v2, rotation_deg)?;
    for h in [line.head(), line.tail()].into_iter().flatten() {
        let Some(node) = store.node(h) else { continue };
        let (Some(b), true) = (node.external_vertex, node.is_endpoint) else {
            continue;
        };
        if host.mesh_mode(b.mesh) != Some(MeshMode::Edit) {
            continue;
        }
        if let Err(e) = host.write_vertex(b.mesh, b.index, node.position) {
            tracing::warn!(%key, index = b.index, error = %e, "endpoint write-back failed");
        }
    }
    tracing::info!(%key, rotation_deg, points, "reset and rotated polyline");
    Ok(RegenOutcome::Regenerated { points })
}

/// Current position of an endpoint node: its point object if readable, else
/// the stored position. `None` if the node is not a live endpoint.
fn live_endpoint<H>(store: &PolylineStore, host: &H, h: Option<NodeHandle>) -> Option<Point>
where
    H: PointObjects + ?Sized,
{
    let node = store.node(h?)?;
    if !node.is_endpoint {
        return None;
    }
    Some(
        node.object
            .and_then(|o| host.position(o).ok())
            .unwrap_or(node.position),
    )
}

/// Vertex an end of the chain reads from: the endpoint node's own binding,
/// else the metadata's source mesh and index for that side.
fn end_binding(
    store: &PolylineStore,
    h: Option<NodeHandle>,
    source: Option<MeshRef>,
    index: Option<VertexIndex>,
) -> Option<VertexBinding> {
    let bound = h
        .and_then(|h| store.node(h))
        .filter(|n| n.is_endpoint)
        .and_then(|n| n.external_vertex);
    bound.or_else(|| {
        Some(VertexBinding {
            mesh: source?,
            index: index?,
        })
    })
}

/// Current position of one end: the bound vertex when its mesh is in edit
/// mode, the endpoint's point object when passive. `None` when neither is
/// readable, so the caller falls back to the snapshot.
fn read_end<H>(
    store: &PolylineStore,
    host: &H,
    h: Option<NodeHandle>,
    binding: Option<VertexBinding>,
) -> Option<Point>
where
    H: VertexSource + PointObjects + ?Sized,
{
    let b = binding?;
    match host.mesh_mode(b.mesh)? {
        MeshMode::Edit => host.read_vertex(b.mesh, b.index).ok(),
        MeshMode::Passive => object_position(store, host, h),
    }
}

fn object_position<H>(store: &PolylineStore, host: &H, h: Option<NodeHandle>) -> Option<Point>
where
    H: PointObjects + ?Sized,
{
    host.position(store.node(h?)?.object?).ok()
}

/// Overwrite node positions with a fresh sampling between `v1` and `v2`.
/// Returns the number of nodes written.
fn apply<H>(
    store: &mut PolylineStore,
    host: &mut H,
    key: PolylineKey,
    v1: Point,
    v2: Point,
    rotation_deg: f64,
) -> Result<usize, OpError>
where
    H: PointObjects + ?Sized,
{
    let curve = store
        .get_metadata(key)
        .ok_or(OpError::NotFound(key))?
        .curve;
    let handles = store.handles(key).ok_or(OpError::NotFound(key))?;
    let points = curves::generate(curve, v1, v2, handles.len() - 1, rotation_deg)?;
    let mut written = 0;
    for (h, p) in handles.into_iter().zip(points) {
        let Some(node) = store.node_mut(h) else {
            continue;
        };
        node.position = p;
        if node.is_endpoint {
            node.track(p);
        }
        if let Some(obj) = node.object {
            if let Err(e) = host.set_position(obj, p) {
                tracing::debug!(%key, error = %e, "point object vanished during regeneration");
            }
        }
        written += 1;
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::mark_modified;
    use crate::generate::{generate_polyline, EdgeSelection, GenerateCfg};
    use crate::host::{MemoryHost, MemoryMesh};
    use crate::types::MeshRef;
    use nalgebra::vector;

    fn close(a: Point, b: Point) -> bool {
        (a - b).norm() < 1e-9
    }

    fn setup(curve: CurveType) -> (MemoryHost, PolylineStore, MeshRef, PolylineKey) {
        let mut host = MemoryHost::new();
        let mesh = host.add_mesh(MemoryMesh::new(vec![
            vector![0.0, 0.0, 0.0],
            vector![2.0, 0.0, 0.0],
        ]));
        let mut store = PolylineStore::new();
        let cfg = GenerateCfg {
            samples: 4,
            curve,
            ..GenerateCfg::default()
        };
        let key = generate_polyline(&mut store, &mut host, &EdgeSelection::single(mesh, 0, 1), &cfg)
            .unwrap()
            .key;
        (host, store, mesh, key)
    }

    #[test]
    fn rotation_regenerates_in_place() {
        let (mut host, mut store, _, key) = setup(CurveType::Arc);
        let before = store.handles(key).unwrap();
        let out = regenerate(&mut store, &mut host, key, -90.0).unwrap();
        assert_eq!(out, RegenOutcome::Regenerated { points: 5 });
        assert_eq!(store.handles(key).unwrap(), before);
        let pts = store.positions(key).unwrap();
        assert!(close(pts[2], vector![1.0, 0.0, 1.0]), "{:?}", pts[2]);
        for (_, n) in store.nodes(key).unwrap() {
            assert!(close(host.position(n.object.unwrap()).unwrap(), n.position));
        }
        assert_eq!(store.get_metadata(key).unwrap().rotation_deg, -90.0);
    }

    #[test]
    fn endpoint_tracking_is_reset_to_regenerated_positions() {
        let (mut host, mut store, _, key) = setup(CurveType::Spline);
        let tail = store.get(key).unwrap().tail().unwrap();
        store.node_mut(tail).unwrap().last_local = None;
        regenerate(&mut store, &mut host, key, 45.0).unwrap();
        let n = store.node(tail).unwrap();
        assert_eq!(n.last_local, Some(n.position));
        assert_eq!(n.last_external, Some(n.position));
    }

    #[test]
    fn modified_and_linear_polylines_are_left_alone() {
        let (mut host, mut store, _, key) = setup(CurveType::Helix);
        let before = store.positions(key).unwrap();
        mark_modified(&mut store, key).unwrap();
        assert_eq!(
            regenerate(&mut store, &mut host, key, 90.0).unwrap(),
            RegenOutcome::Skipped(RegenSkip::Modified)
        );
        assert_eq!(store.positions(key).unwrap(), before);

        let (mut host, mut store, _, key) = setup(CurveType::Linear);
        assert_eq!(
            regenerate(&mut store, &mut host, key, 90.0).unwrap(),
            RegenOutcome::Skipped(RegenSkip::Linear)
        );
        assert_eq!(
            reset_and_rotate(&mut store, &mut host, key, 90.0),
            Err(OpError::LinearRotation(key))
        );
    }

    #[test]
    fn snapshot_survives_rotation_without_source_mesh() {
        let (mut host, mut store, mesh, key) = setup(CurveType::Arc);
        host.remove_mesh(mesh).unwrap();
        regenerate(&mut store, &mut host, key, 90.0).unwrap();
        let meta = store.get_metadata(key).unwrap();
        assert_eq!(meta.edge(), Some((vector![0.0, 0.0, 0.0], vector![2.0, 0.0, 0.0])));
    }

    #[test]
    fn moved_endpoint_objects_drive_regeneration() {
        let (mut host, mut store, _, key) = setup(CurveType::Arc);
        let tail = store.get(key).unwrap().tail().unwrap();
        let obj = store.node(tail).unwrap().object.unwrap();
        host.set_position(obj, vector![4.0, 0.0, 0.0]).unwrap();
        regenerate(&mut store, &mut host, key, 0.0).unwrap();
        let pts = store.positions(key).unwrap();
        assert_eq!(pts[4], vector![4.0, 0.0, 0.0]);
        assert!(close(pts[2], vector![2.0, -2.0, 0.0]));
        // Mesh still exists, so the snapshot follows.
        assert_eq!(store.get_metadata(key).unwrap().edge_end, Some(vector![4.0, 0.0, 0.0]));
    }

    #[test]
    fn deleted_interior_node_leaves_extra_samples_unused() {
        let (mut host, mut store, _, key) = setup(CurveType::Arc);
        let hs = store.handles(key).unwrap();
        let node = store.delete_node(key, hs[1]).unwrap();
        host.destroy_point_object(node.object.unwrap()).unwrap();
        assert_eq!(
            regenerate(&mut store, &mut host, key, 30.0).unwrap(),
            RegenOutcome::Regenerated { points: 4 }
        );
        let pts = store.positions(key).unwrap();
        assert_eq!(pts[0], vector![0.0, 0.0, 0.0]);
        assert_eq!(pts[3], vector![2.0, 0.0, 0.0]);
    }

    #[test]
    fn reset_clears_flag_and_follows_the_mesh() {
        let (mut host, mut store, mesh, key) = setup(CurveType::Arc);
        mark_modified(&mut store, key).unwrap();
        host.move_vertex(mesh, 1, vector![2.0, 2.0, 0.0]).unwrap();
        let out = reset_and_rotate(&mut store, &mut host, key, 0.0).unwrap();
        assert_eq!(out, RegenOutcome::Regenerated { points: 5 });
        let meta = store.get_metadata(key).unwrap();
        assert!(!meta.is_modified);
        assert_eq!(meta.edge_end, Some(vector![2.0, 2.0, 0.0]));
        let pts = store.positions(key).unwrap();
        assert_eq!(pts[4], vector![2.0, 2.0, 0.0]);
        // Endpoints were written back to the bound vertices.
        assert!(close(host.read_vertex(mesh, 1).unwrap(), vector![2.0, 2.0, 0.0]));
        assert_eq!(host.vertex_writes(), 2);
    }

    #[test]
    fn reset_in_passive_mode_reads_endpoint_objects() {
        let (mut host, mut store, mesh, key) = setup(CurveType::Helix);
        host.set_mode(mesh, MeshMode::Passive).unwrap();
        let head = store.get(key).unwrap().head().unwrap();
        let obj = store.node(head).unwrap().object.unwrap();
        host.set_position(obj, vector![-1.0, 0.0, 0.0]).unwrap();
        reset_and_rotate(&mut store, &mut host, key, 10.0).unwrap();
        let meta = store.get_metadata(key).unwrap();
        assert_eq!(meta.edge_start, Some(vector![-1.0, 0.0, 0.0]));
        assert_eq!(host.vertex_writes(), 0);
    }

    #[test]
    fn rotation_out_of_range_is_rejected() {
        let (mut host, mut store, _, key) = setup(CurveType::Arc);
        assert!(matches!(
            regenerate(&mut store, &mut host, key, 200.0),
            Err(OpError::Config(_))
        ));
        assert_eq!(
            regenerate(&mut store, &mut host, PolylineKey(42), 0.0),
            Err(OpError::NotFound(PolylineKey(42)))
        );
    }
}
