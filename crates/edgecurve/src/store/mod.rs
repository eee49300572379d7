//! Polyline storage: keyed polylines over a shared node arena.
//!
//! Purpose
//! - Own every polyline and its metadata; the only mutator of polyline topology.
//! - Keep interior deletion, tail append and merge O(1) through prev/next handles.
//!
//! Invariants
//! - A key has a polyline iff it has metadata (both live in one `Record`).
//! - `Polyline::count` equals the number of reachable nodes; `recount` is the
//!   traversal cross-check.
//! - Keys are strictly increasing and never reused, even after deletion.
//!
//! Missing keys and stale handles yield `None`; nothing here panics on them.

mod arena;
mod types;

pub use types::{NodeHandle, Polyline, PolylineMetadata, PolylineNode};

use std::collections::BTreeMap;

use crate::host::PointObjects;
use crate::types::{CurveType, ObjectRef, Point, PolylineKey};
use arena::NodeArena;

#[derive(Clone, Debug)]
struct Record {
    line: Polyline,
    meta: PolylineMetadata,
}

#[derive(Clone, Debug, Default)]
pub struct PolylineStore {
    arena: NodeArena,
    records: BTreeMap<PolylineKey, Record>,
    next_key: u64,
}

impl PolylineStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an empty polyline with default metadata.
    pub fn create(&mut self, curve: CurveType, rotation_deg: f64) -> PolylineKey {
        let key = PolylineKey(self.next_key);
        self.next_key += 1;
        self.records.insert(
            key,
            Record {
                line: Polyline::default(),
                meta: PolylineMetadata::new(curve, rotation_deg),
            },
        );
        key
    }

    /// Append a node at the tail of `key`. `None` if the key is absent.
    pub fn insert(
        &mut self,
        key: PolylineKey,
        position: Point,
        object: Option<ObjectRef>,
        is_endpoint: bool,
    ) -> Option<NodeHandle> {
        let record = self.records.get_mut(&key)?;
        let h = self
            .arena
            .alloc(PolylineNode::new(position, object, is_endpoint));
        match record.line.tail {
            Some(tail) => {
                self.arena.set_next(tail, Some(h));
                self.arena.set_prev(h, Some(tail));
            }
            None => record.line.head = Some(h),
        }
        record.line.tail = Some(h);
        record.line.count += 1;
        Some(h)
    }

    /// Unlink `h` from `key` in O(1) and return the removed node.
    ///
    /// Endpoint flags of the neighbours are left as they are. The caller owns
    /// the returned node's object and must release it. `None` if the key is
    /// absent, the handle is stale, or the handle visibly belongs to another
    /// polyline (it sits at a chain end that is not this polyline's end).
    /// Interior handles are not traced back to `key`: callers holding a handle
    /// of unknown origin check `contains` first.
    pub fn delete_node(&mut self, key: PolylineKey, h: NodeHandle) -> Option<PolylineNode> {
        let entry = self.arena.get(h)?;
        let (prev, next) = (entry.prev, entry.next);
        let line = self.get(key)?;
        if (prev.is_none() && line.head != Some(h)) || (next.is_none() && line.tail != Some(h)) {
            return None;
        }
        let record = self.records.get_mut(&key)?;
        match prev {
            Some(p) => self.arena.set_next(p, next),
            None => record.line.head = next,
        }
        match next {
            Some(n) => self.arena.set_prev(n, prev),
            None => record.line.tail = prev,
        }
        record.line.count -= 1;
        self.arena.release(h).map(|e| e.node)
    }

    /// Splice `k2`'s chain after `k1`'s tail; `k2` and its metadata are dropped.
    ///
    /// No node is copied. The two nodes that become interior at the junction
    /// lose their endpoint flag, vertex binding and tracking state. The tail
    /// side of `k1`'s edge snapshot and vertex indices is taken from `k2`, so
    /// the metadata keeps describing the chain's actual ends. An empty `k1`
    /// adopts `k2`'s chain and edge. `None` if either key is absent or
    /// `k1 == k2`.
    pub fn merge(&mut self, k1: PolylineKey, k2: PolylineKey) -> Option<PolylineKey> {
        if k1 == k2 || !self.records.contains_key(&k1) {
            return None;
        }
        let b = self.records.remove(&k2)?;
        let a = self.records.get_mut(&k1)?;
        match (a.line.tail, b.line.head) {
            (Some(a_tail), Some(b_head)) => {
                self.arena.set_next(a_tail, Some(b_head));
                self.arena.set_prev(b_head, Some(a_tail));
                a.line.tail = b.line.tail;
                a.line.count += b.line.count;
                a.meta.edge_end = b.meta.edge_end;
                a.meta.vertex_indices.1 = b.meta.vertex_indices.1;
                if a.meta.source_mesh.is_none() {
                    a.meta.source_mesh = b.meta.source_mesh;
                }
                if a.line.head != Some(a_tail) {
                    if let Some(e) = self.arena.get_mut(a_tail) {
                        e.node.demote();
                    }
                }
                if a.line.tail != Some(b_head) {
                    if let Some(e) = self.arena.get_mut(b_head) {
                        e.node.demote();
                    }
                }
            }
            (None, Some(_)) => {
                a.line = b.line;
                a.meta.edge_start = b.meta.edge_start;
                a.meta.edge_end = b.meta.edge_end;
                a.meta.vertex_indices = b.meta.vertex_indices;
                a.meta.source_mesh = b.meta.source_mesh;
            }
            (_, None) => {}
        }
        Some(k1)
    }

    /// Remove `key`, destroying every node's point object. Returns the number of
    /// nodes released, `None` if the key is absent.
    pub fn delete_polyline<O>(&mut self, key: PolylineKey, objects: &mut O) -> Option<usize>
    where
        O: PointObjects + ?Sized,
    {
        let record = self.records.remove(&key)?;
        let mut cur = record.line.head;
        let mut released = 0;
        while let Some(h) = cur {
            let Some(entry) = self.arena.release(h) else {
                break;
            };
            if let Some(obj) = entry.node.object {
                // Objects the host already removed are fine to skip.
                let _ = objects.destroy_point_object(obj);
            }
            released += 1;
            cur = entry.next;
        }
        Some(released)
    }

    #[inline]
    pub fn get(&self, key: PolylineKey) -> Option<&Polyline> {
        self.records.get(&key).map(|r| &r.line)
    }

    #[inline]
    pub fn get_metadata(&self, key: PolylineKey) -> Option<&PolylineMetadata> {
        self.records.get(&key).map(|r| &r.meta)
    }

    #[inline]
    pub fn get_metadata_mut(&mut self, key: PolylineKey) -> Option<&mut PolylineMetadata> {
        self.records.get_mut(&key).map(|r| &mut r.meta)
    }

    #[inline]
    pub fn node(&self, h: NodeHandle) -> Option<&PolylineNode> {
        self.arena.get(h).map(|e| &e.node)
    }

    #[inline]
    pub fn node_mut(&mut self, h: NodeHandle) -> Option<&mut PolylineNode> {
        self.arena.get_mut(h).map(|e| &mut e.node)
    }

    #[inline]
    pub fn next(&self, h: NodeHandle) -> Option<NodeHandle> {
        self.arena.get(h)?.next
    }

    #[inline]
    pub fn prev(&self, h: NodeHandle) -> Option<NodeHandle> {
        self.arena.get(h)?.prev
    }

    /// Nodes of `key` in sequence order.
    pub fn nodes(&self, key: PolylineKey) -> Option<Nodes<'_>> {
        let line = self.get(key)?;
        Some(Nodes {
            arena: &self.arena,
            cur: line.head,
        })
    }

    /// Handles of `key` in sequence order (for loops that mutate nodes).
    pub fn handles(&self, key: PolylineKey) -> Option<Vec<NodeHandle>> {
        Some(self.nodes(key)?.map(|(h, _)| h).collect())
    }

    pub fn positions(&self, key: PolylineKey) -> Option<Vec<Point>> {
        Some(self.nodes(key)?.map(|(_, n)| n.position).collect())
    }

    /// Count by traversal; must agree with `Polyline::len`.
    pub fn recount(&self, key: PolylineKey) -> Option<usize> {
        Some(self.nodes(key)?.count())
    }

    /// Whether `h` is reachable from `key`'s head (O(n)).
    pub fn contains(&self, key: PolylineKey, h: NodeHandle) -> bool {
        self.nodes(key)
            .map(|mut it| it.any(|(x, _)| x == h))
            .unwrap_or(false)
    }

    #[inline]
    pub fn contains_key(&self, key: PolylineKey) -> bool {
        self.records.contains_key(&key)
    }

    /// Live keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = PolylineKey> + '_ {
        self.records.keys().copied()
    }

    /// Number of polylines.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of live nodes across all polylines.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.arena.live()
    }
}

/// Iterator over `(handle, node)` pairs of one polyline.
pub struct Nodes<'a> {
    arena: &'a NodeArena,
    cur: Option<NodeHandle>,
}

impl<'a> Iterator for Nodes<'a> {
    type Item = (NodeHandle, &'a PolylineNode);

    fn next(&mut self) -> Option<Self::Item> {
        let h = self.cur?;
        let entry = self.arena.get(h)?;
        self.cur = entry.next;
        Some((h, &entry.node))
    }
}
