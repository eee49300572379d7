//! Endpoint reconciliation: keep each endpoint's point object and its mesh
//! vertex in agreement.
//!
//! Purpose
//! - Run on a fixed cadence, independent of user operations, and decide per
//!   endpoint which side moved since the last pass.
//!
//! State machine (per endpoint, source mesh in edit mode)
//! - Tracking unset: baseline both fields to the vertex position, no writes.
//! - Only the vertex moved: the object follows the vertex.
//! - Only the object moved: the vertex follows the object.
//! - Both moved: the object wins (it is what the user is dragging).
//! - Neither moved: nothing happens.
//! - The bound mesh is gone: `Detached`, nothing happens. The polyline as a
//!   whole is skipped only when no mesh it refers to exists.
//!
//! After any propagation both tracking fields equal the winning position, so
//! the following pass sees no drift and performs no writes. With the mesh in
//! passive mode no vertex can be written; only `last_external` is refreshed,
//! which leaves object edits pending until an edit session resumes.
//!
//! Faults (stale vertex index, missing object, rejected write) are returned per
//! polyline and never abort the other polylines of the same tick.

mod types;

pub use types::{EndpointSync, PolylineSync, SyncCfg, SyncFault, TickReport};

use crate::error::HostError;
use crate::host::{MeshMode, PointObjects, VertexSource};
use crate::store::{NodeHandle, PolylineStore};
use crate::types::PolylineKey;

/// One reconciliation tick over every polyline in `store`.
pub fn reconcile_all<H>(store: &mut PolylineStore, host: &mut H, cfg: &SyncCfg) -> TickReport
where
    H: VertexSource + PointObjects + ?Sized,
{
    let keys: Vec<PolylineKey> = store.keys().collect();
    let results = keys
        .into_iter()
        .map(|key| (key, reconcile_polyline(store, host, key, cfg)))
        .collect();
    TickReport { results }
}

/// Reconcile the head and tail endpoints of one polyline.
pub fn reconcile_polyline<H>(
    store: &mut PolylineStore,
    host: &mut H,
    key: PolylineKey,
    cfg: &SyncCfg,
) -> Result<PolylineSync, SyncFault>
where
    H: VertexSource + PointObjects + ?Sized,
{
    let meta = store.get_metadata(key).ok_or(SyncFault::NotFound(key))?;
    let source = meta.source_mesh;
    let line = *store.get(key).ok_or(SyncFault::NotFound(key))?;
    // A merged polyline can have its ends bound to different meshes.
    let bound = [line.head(), line.tail()]
        .into_iter()
        .flatten()
        .filter_map(|h| store.node(h)?.external_vertex.map(|b| b.mesh));
    if !source.into_iter().chain(bound).any(|m| host.mesh_exists(m)) {
        return Ok(PolylineSync::SourceMissing);
    }
    let head = match line.head() {
        Some(h) => sync_endpoint(store, host, h, cfg),
        None => Ok(EndpointSync::Unbound),
    };
    let tail = match line.tail() {
        Some(t) if line.head() != Some(t) => sync_endpoint(store, host, t, cfg),
        _ => head.clone(),
    };
    Ok(PolylineSync::Checked {
        head: head?,
        tail: tail?,
    })
}

fn sync_endpoint<H>(
    store: &mut PolylineStore,
    host: &mut H,
    h: NodeHandle,
    cfg: &SyncCfg,
) -> Result<EndpointSync, SyncFault>
where
    H: VertexSource + PointObjects + ?Sized,
{
    let Some(node) = store.node(h) else {
        return Ok(EndpointSync::Unbound);
    };
    let Some(binding) = node.external_vertex.filter(|_| node.is_endpoint) else {
        return Ok(EndpointSync::Unbound);
    };
    if !host.mesh_exists(binding.mesh) {
        return Ok(EndpointSync::Detached);
    }
    let obj = node.object.ok_or(SyncFault::MissingObject)?;
    let tracked = node.last_external.zip(node.last_local);

    let mode = host
        .mesh_mode(binding.mesh)
        .ok_or(HostError::MeshMissing(binding.mesh))?;
    let external = host
        .read_vertex(binding.mesh, binding.index)
        .map_err(SyncFault::from_read)?;
    let local = host.position(obj)?;

    let Some((last_external, last_local)) = tracked else {
        if let Some(n) = store.node_mut(h) {
            n.track(external);
        }
        return Ok(EndpointSync::Baseline);
    };

    if mode == MeshMode::Passive {
        if let Some(n) = store.node_mut(h) {
            n.last_external = Some(external);
        }
        return Ok(EndpointSync::Passive);
    }

    let external_moved = (external - last_external).norm() > cfg.eps;
    let local_moved = (local - last_local).norm() > cfg.eps;
    let outcome = match (external_moved, local_moved) {
        (false, false) => return Ok(EndpointSync::Unchanged),
        (true, false) => {
            host.set_position(obj, external)?;
            tracing::debug!(?h, index = binding.index, "endpoint follows vertex");
            EndpointSync::Pulled(external)
        }
        (_, true) => {
            host.write_vertex(binding.mesh, binding.index, local)?;
            tracing::debug!(?h, index = binding.index, "vertex follows endpoint");
            EndpointSync::Pushed(local)
        }
    };
    let winner = match outcome {
        EndpointSync::Pulled(p) | EndpointSync::Pushed(p) => p,
        _ => external,
    };
    if let Some(n) = store.node_mut(h) {
        n.position = winner;
        n.track(winner);
    }
    Ok(outcome)
}
