//! User editing operators and read-only views over the store.

use serde::Serialize;

use crate::error::OpError;
use crate::host::PointObjects;
use crate::store::{NodeHandle, PolylineStore};
use crate::types::{CurveType, Point, PolylineKey};

/// One line of the polyline list a host shows to its users.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PolylineSummary {
    pub key: PolylineKey,
    pub label: String,
    pub count: usize,
    pub curve: CurveType,
    pub rotation_deg: f64,
    pub is_modified: bool,
}

/// Per-node row of a detail view, in sequence order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointRow {
    pub index: usize,
    pub position: Point,
    pub is_endpoint: bool,
}

/// Delete one node of `key` and release its point object.
///
/// The polyline is flagged modified so later rotations leave it alone.
/// Deleting an endpoint does not promote its neighbour.
pub fn delete_point<O>(
    store: &mut PolylineStore,
    objects: &mut O,
    key: PolylineKey,
    handle: NodeHandle,
) -> Result<(), OpError>
where
    O: PointObjects + ?Sized,
{
    if !store.contains_key(key) {
        return Err(OpError::NotFound(key));
    }
    if !store.contains(key, handle) {
        return Err(OpError::StaleNode(key));
    }
    let node = store
        .delete_node(key, handle)
        .ok_or(OpError::StaleNode(key))?;
    if let Some(obj) = node.object {
        if let Err(e) = objects.destroy_point_object(obj) {
            tracing::debug!(%key, error = %e, "point object already gone");
        }
    }
    mark_modified(store, key)?;
    tracing::debug!(%key, was_endpoint = node.is_endpoint, "deleted point");
    Ok(())
}

/// Set the sticky modified flag. Only `reset_and_rotate` clears it.
pub fn mark_modified(store: &mut PolylineStore, key: PolylineKey) -> Result<(), OpError> {
    store
        .get_metadata_mut(key)
        .ok_or(OpError::NotFound(key))?
        .is_modified = true;
    Ok(())
}

/// Append `source`'s nodes after `target`'s tail. `source` ceases to exist.
/// `target` keeps its curve, rotation and modified flag; the tail side of its
/// edge and vertex indices now comes from `source`.
pub fn merge_polylines(
    store: &mut PolylineStore,
    source: PolylineKey,
    target: PolylineKey,
) -> Result<PolylineKey, OpError> {
    if source == target {
        return Err(OpError::SelfMerge(target));
    }
    for k in [source, target] {
        if !store.contains_key(k) {
            return Err(OpError::NotFound(k));
        }
    }
    let merged = store
        .merge(target, source)
        .ok_or(OpError::NotFound(source))?;
    tracing::info!(%source, %target, "merged polylines");
    Ok(merged)
}

pub fn summaries(store: &PolylineStore) -> Vec<PolylineSummary> {
    store
        .keys()
        .filter_map(|key| {
            let line = store.get(key)?;
            let meta = store.get_metadata(key)?;
            Some(PolylineSummary {
                key,
                label: key.to_string(),
                count: line.len(),
                curve: meta.curve,
                rotation_deg: meta.rotation_deg,
                is_modified: meta.is_modified,
            })
        })
        .collect()
}

pub fn point_rows(store: &PolylineStore, key: PolylineKey) -> Result<Vec<PointRow>, OpError> {
    let nodes = store.nodes(key).ok_or(OpError::NotFound(key))?;
    Ok(nodes
        .enumerate()
        .map(|(index, (_, n))| PointRow {
            index,
            position: n.position,
            is_endpoint: n.is_endpoint,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::{generate_polyline, EdgeSelection, GenerateCfg};
    use crate::host::{MemoryHost, MemoryMesh, VertexSource};
    use crate::rotate::reset_and_rotate;
    use nalgebra::vector;

    fn two_lines() -> (MemoryHost, PolylineStore, PolylineKey, PolylineKey) {
        let mut host = MemoryHost::new();
        let mesh = host.add_mesh(MemoryMesh::new(vec![
            vector![0.0, 0.0, 0.0],
            vector![2.0, 0.0, 0.0],
            vector![2.0, 2.0, 0.0],
        ]));
        let mut store = PolylineStore::new();
        let cfg = GenerateCfg {
            samples: 3,
            ..GenerateCfg::default()
        };
        let a = generate_polyline(&mut store, &mut host, &EdgeSelection::single(mesh, 0, 1), &cfg)
            .unwrap()
            .key;
        let b = generate_polyline(&mut store, &mut host, &EdgeSelection::single(mesh, 1, 2), &cfg)
            .unwrap()
            .key;
        (host, store, a, b)
    }

    #[test]
    fn deleting_a_point_releases_its_object_and_marks_modified() {
        let (mut host, mut store, a, _) = two_lines();
        let h = store.handles(a).unwrap()[1];
        let obj = store.node(h).unwrap().object.unwrap();
        delete_point(&mut store, &mut host, a, h).unwrap();
        assert!(!host.has_object(obj));
        assert_eq!(store.get(a).unwrap().len(), 3);
        assert!(store.get_metadata(a).unwrap().is_modified);

        // The handle is stale now.
        assert_eq!(
            delete_point(&mut store, &mut host, a, h),
            Err(OpError::StaleNode(a))
        );
    }

    #[test]
    fn handle_of_another_polyline_is_rejected() {
        let (mut host, mut store, a, b) = two_lines();
        let foreign_head = store.get(b).unwrap().head().unwrap();
        assert_eq!(
            delete_point(&mut store, &mut host, a, foreign_head),
            Err(OpError::StaleNode(a))
        );
        assert_eq!(store.get(b).unwrap().len(), 4);
        assert!(!store.get_metadata(a).unwrap().is_modified);
    }

    #[test]
    fn interior_node_of_another_polyline_is_rejected() {
        let (mut host, mut store, a, b) = two_lines();
        let foreign = store.handles(b).unwrap()[2];
        let obj = store.node(foreign).unwrap().object.unwrap();
        assert_eq!(
            delete_point(&mut store, &mut host, a, foreign),
            Err(OpError::StaleNode(a))
        );
        for k in [a, b] {
            assert_eq!(store.get(k).unwrap().len(), 4);
            assert_eq!(store.recount(k), Some(4));
        }
        assert!(store.node(foreign).is_some());
        assert!(host.position(obj).is_ok());
        assert!(!store.get_metadata(a).unwrap().is_modified);
    }

    #[test]
    fn reset_after_merge_leaves_the_far_vertex_in_place() {
        let (mut host, mut store, a, b) = two_lines();
        merge_polylines(&mut store, b, a).unwrap();
        let meta = store.get_metadata(a).unwrap();
        assert_eq!(meta.vertex_indices, (Some(0), Some(2)));
        assert_eq!(meta.edge_end, Some(vector![2.0, 2.0, 0.0]));

        let tail = store.get(a).unwrap().tail().unwrap();
        let far = store.node(tail).unwrap().external_vertex.unwrap();
        reset_and_rotate(&mut store, &mut host, a, 30.0).unwrap();
        assert!((host.read_vertex(far.mesh, 2).unwrap() - vector![2.0, 2.0, 0.0]).norm() < 1e-9);
        assert!((host.read_vertex(far.mesh, 1).unwrap() - vector![2.0, 0.0, 0.0]).norm() < 1e-9);
        let pts = store.positions(a).unwrap();
        assert!((pts[0] - vector![0.0, 0.0, 0.0]).norm() < 1e-9);
        assert!((pts[7] - vector![2.0, 2.0, 0.0]).norm() < 1e-9);
    }

    #[test]
    fn merge_appends_and_drops_the_source() {
        let (_, mut store, a, b) = two_lines();
        assert_eq!(merge_polylines(&mut store, a, a), Err(OpError::SelfMerge(a)));
        assert_eq!(
            merge_polylines(&mut store, PolylineKey(9), a),
            Err(OpError::NotFound(PolylineKey(9)))
        );
        assert_eq!(merge_polylines(&mut store, b, a), Ok(a));
        assert!(!store.contains_key(b));
        let rows = point_rows(&store, a).unwrap();
        assert_eq!(rows.len(), 8);
        let flags: Vec<bool> = rows.iter().map(|r| r.is_endpoint).collect();
        assert_eq!(flags, [true, false, false, false, false, false, false, true]);
        assert_eq!(rows[7].position, vector![2.0, 2.0, 0.0]);
    }

    #[test]
    fn summaries_follow_key_order() {
        let (_, mut store, a, b) = two_lines();
        mark_modified(&mut store, b).unwrap();
        let s = summaries(&store);
        assert_eq!(s.len(), 2);
        assert_eq!(s[0].key, a);
        assert_eq!(s[0].label, format!("Polyline_{}", a.0));
        assert_eq!(s[0].count, 4);
        assert_eq!(s[0].curve, CurveType::Arc);
        assert!(!s[0].is_modified);
        assert!(s[1].is_modified);
        assert_eq!(mark_modified(&mut store, PolylineKey(99)), Err(OpError::NotFound(PolylineKey(99))));
    }
}
