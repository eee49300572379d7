//! Node, polyline and metadata records held by `PolylineStore`.

use crate::types::{CurveType, MeshRef, ObjectRef, Point, VertexBinding, VertexIndex};

/// Stable reference to a node slot. A handle whose node was deleted is stale:
/// its generation no longer matches the slot and every lookup rejects it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeHandle {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

/// One point of a polyline.
#[derive(Clone, Debug, PartialEq)]
pub struct PolylineNode {
    pub position: Point,
    pub is_endpoint: bool,
    /// Set only on endpoint nodes.
    pub external_vertex: Option<VertexBinding>,
    /// Reconciliation tracking; `None` until the first baseline.
    pub last_external: Option<Point>,
    pub last_local: Option<Point>,
    /// Host point object owned by this node.
    pub object: Option<ObjectRef>,
}

impl PolylineNode {
    pub fn new(position: Point, object: Option<ObjectRef>, is_endpoint: bool) -> Self {
        Self {
            position,
            is_endpoint,
            external_vertex: None,
            last_external: None,
            last_local: None,
            object,
        }
    }

    /// Set both tracking fields to `p`.
    #[inline]
    pub fn track(&mut self, p: Point) {
        self.last_external = Some(p);
        self.last_local = Some(p);
    }

    /// Drop endpoint status together with the binding and tracking state.
    pub(crate) fn demote(&mut self) {
        self.is_endpoint = false;
        self.external_vertex = None;
        self.last_external = None;
        self.last_local = None;
    }
}

/// Ordered chain of nodes. `count` is maintained incrementally.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Polyline {
    pub(crate) head: Option<NodeHandle>,
    pub(crate) tail: Option<NodeHandle>,
    pub(crate) count: usize,
}

impl Polyline {
    #[inline]
    pub fn head(&self) -> Option<NodeHandle> {
        self.head
    }
    #[inline]
    pub fn tail(&self) -> Option<NodeHandle> {
        self.tail
    }
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Per-polyline metadata (fixed schema).
#[derive(Clone, Debug, PartialEq)]
pub struct PolylineMetadata {
    pub curve: CurveType,
    /// Degrees in `[-180, 180]`.
    pub rotation_deg: f64,
    /// Generating edge in world space, snapshotted at creation.
    pub edge_start: Option<Point>,
    pub edge_end: Option<Point>,
    pub source_mesh: Option<MeshRef>,
    pub vertex_indices: (Option<VertexIndex>, Option<VertexIndex>),
    /// Sticky: set by interior edits, cleared only by reset-and-rotate.
    pub is_modified: bool,
}

impl PolylineMetadata {
    pub fn new(curve: CurveType, rotation_deg: f64) -> Self {
        Self {
            curve,
            rotation_deg,
            edge_start: None,
            edge_end: None,
            source_mesh: None,
            vertex_indices: (None, None),
            is_modified: false,
        }
    }

    /// Both ends of the edge snapshot, if recorded.
    pub fn edge(&self) -> Option<(Point, Point)> {
        Some((self.edge_start?, self.edge_end?))
    }
}
