//! In-memory host: meshes, point objects, and a manually advanced timer clock.
//!
//! Used by the test suites and the CLI. Direct mutators (`move_vertex`,
//! `set_mode`, `remove_mesh`, `set_position` through `PointObjects`) stand in
//! for the user acting in a real editor.

use std::collections::BTreeMap;

use nalgebra::{Matrix4, Point3};

use super::{MeshMode, PointObjects, Scheduler, SurfaceQuery, TimerId, VertexSource};
use crate::collision::Surface;
use crate::error::HostError;
use crate::types::{MeshRef, ObjectRef, Point, VertexIndex};

/// Slack when comparing the clock against a timer's due time.
const CLOCK_EPS: f64 = 1e-9;

#[derive(Clone, Debug, PartialEq)]
pub struct MemoryMesh {
    pub world_from_local: Matrix4<f64>,
    /// Local-space vertex coordinates.
    pub vertices: Vec<Point>,
    /// Vertex index lists, one per face.
    pub faces: Vec<Vec<usize>>,
    pub mode: MeshMode,
    pub visible: bool,
    /// Participates in collision queries.
    pub solid: bool,
}

impl MemoryMesh {
    pub fn new(vertices: Vec<Point>) -> Self {
        Self {
            world_from_local: Matrix4::identity(),
            vertices,
            faces: Vec::new(),
            mode: MeshMode::Edit,
            visible: true,
            solid: true,
        }
    }

    pub fn with_transform(mut self, world_from_local: Matrix4<f64>) -> Self {
        self.world_from_local = world_from_local;
        self
    }

    pub fn with_faces(mut self, faces: Vec<Vec<usize>>) -> Self {
        self.faces = faces;
        self
    }

    pub fn with_mode(mut self, mode: MeshMode) -> Self {
        self.mode = mode;
        self
    }

    /// Mean of each face's vertices; faces with bad indices are skipped.
    pub fn face_centroids(&self) -> Vec<Point> {
        self.faces
            .iter()
            .filter(|f| !f.is_empty())
            .filter_map(|f| {
                let sum = f.iter().try_fold(Point::zeros(), |acc, &i| {
                    self.vertices.get(i).map(|v| acc + v)
                })?;
                Some(sum / f.len() as f64)
            })
            .collect()
    }

    fn to_world(&self, local: &Point) -> Point {
        let h = self.world_from_local * Point3::from(*local).to_homogeneous();
        Point3::from_homogeneous(h)
            .map(|p| p.coords)
            .unwrap_or(*local)
    }

    fn to_local(&self, world: &Point) -> Option<Point> {
        let inv = self.world_from_local.try_inverse()?;
        Point3::from_homogeneous(inv * Point3::from(*world).to_homogeneous()).map(|p| p.coords)
    }
}

#[derive(Clone, Copy, Debug)]
struct Timer {
    interval: f64,
    due: f64,
}

#[derive(Clone, Debug, Default)]
pub struct MemoryHost {
    meshes: BTreeMap<MeshRef, MemoryMesh>,
    objects: BTreeMap<ObjectRef, Point>,
    timers: BTreeMap<TimerId, Timer>,
    next_id: u64,
    clock: f64,
    vertex_writes: usize,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn fresh_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn add_mesh(&mut self, mesh: MemoryMesh) -> MeshRef {
        let r = MeshRef(self.fresh_id());
        self.meshes.insert(r, mesh);
        r
    }

    pub fn remove_mesh(&mut self, mesh: MeshRef) -> Option<MemoryMesh> {
        self.meshes.remove(&mesh)
    }

    pub fn mesh(&self, mesh: MeshRef) -> Option<&MemoryMesh> {
        self.meshes.get(&mesh)
    }

    pub fn mesh_mut(&mut self, mesh: MeshRef) -> Option<&mut MemoryMesh> {
        self.meshes.get_mut(&mesh)
    }

    pub fn set_mode(&mut self, mesh: MeshRef, mode: MeshMode) -> Result<(), HostError> {
        let m = self
            .meshes
            .get_mut(&mesh)
            .ok_or(HostError::MeshMissing(mesh))?;
        m.mode = mode;
        Ok(())
    }

    /// Move a vertex to a world position regardless of mode (a user edit).
    pub fn move_vertex(
        &mut self,
        mesh: MeshRef,
        index: VertexIndex,
        world: Point,
    ) -> Result<(), HostError> {
        let m = self
            .meshes
            .get_mut(&mesh)
            .ok_or(HostError::MeshMissing(mesh))?;
        let local = m.to_local(&world).ok_or(HostError::SingularTransform(mesh))?;
        let len = m.vertices.len();
        let v = m
            .vertices
            .get_mut(index)
            .ok_or(HostError::VertexOutOfRange { mesh, index, len })?;
        *v = local;
        Ok(())
    }

    /// Number of engine-initiated vertex writes so far.
    pub fn vertex_writes(&self) -> usize {
        self.vertex_writes
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn has_object(&self, obj: ObjectRef) -> bool {
        self.objects.contains_key(&obj)
    }

    pub fn now(&self) -> f64 {
        self.clock
    }

    pub fn timer_count(&self) -> usize {
        self.timers.len()
    }

    /// Advance the clock by `dt` seconds; returns every firing in due order.
    /// A timer that falls several intervals behind fires once per interval.
    /// A timer with a non-positive interval fires at most once per call.
    pub fn advance(&mut self, dt: f64) -> Vec<TimerId> {
        self.clock += dt;
        let mut fired: Vec<(f64, TimerId)> = Vec::new();
        for (id, t) in self.timers.iter_mut() {
            if t.interval <= 0.0 {
                if t.due <= self.clock + CLOCK_EPS {
                    fired.push((t.due, *id));
                    t.due = self.clock;
                }
                continue;
            }
            while t.due <= self.clock + CLOCK_EPS {
                fired.push((t.due, *id));
                t.due += t.interval;
            }
        }
        fired.sort_by(|a, b| a.0.total_cmp(&b.0));
        fired.into_iter().map(|(_, id)| id).collect()
    }
}

impl VertexSource for MemoryHost {
    fn mesh_mode(&self, mesh: MeshRef) -> Option<MeshMode> {
        self.meshes.get(&mesh).map(|m| m.mode)
    }

    fn vertex_count(&self, mesh: MeshRef) -> Option<usize> {
        self.meshes.get(&mesh).map(|m| m.vertices.len())
    }

    fn read_vertex(&self, mesh: MeshRef, index: VertexIndex) -> Result<Point, HostError> {
        let m = self.meshes.get(&mesh).ok_or(HostError::MeshMissing(mesh))?;
        let local = m.vertices.get(index).ok_or(HostError::VertexOutOfRange {
            mesh,
            index,
            len: m.vertices.len(),
        })?;
        Ok(m.to_world(local))
    }

    fn write_vertex(
        &mut self,
        mesh: MeshRef,
        index: VertexIndex,
        p: Point,
    ) -> Result<(), HostError> {
        match self.mesh_mode(mesh) {
            None => return Err(HostError::MeshMissing(mesh)),
            Some(MeshMode::Passive) => return Err(HostError::NotEditable(mesh)),
            Some(MeshMode::Edit) => {}
        }
        self.move_vertex(mesh, index, p)?;
        self.vertex_writes += 1;
        Ok(())
    }
}

impl PointObjects for MemoryHost {
    fn create_point_object(&mut self, position: Point) -> ObjectRef {
        let r = ObjectRef(self.fresh_id());
        self.objects.insert(r, position);
        r
    }

    fn destroy_point_object(&mut self, obj: ObjectRef) -> Result<(), HostError> {
        self.objects
            .remove(&obj)
            .map(|_| ())
            .ok_or(HostError::ObjectMissing(obj))
    }

    fn position(&self, obj: ObjectRef) -> Result<Point, HostError> {
        self.objects
            .get(&obj)
            .copied()
            .ok_or(HostError::ObjectMissing(obj))
    }

    fn set_position(&mut self, obj: ObjectRef, p: Point) -> Result<(), HostError> {
        let slot = self
            .objects
            .get_mut(&obj)
            .ok_or(HostError::ObjectMissing(obj))?;
        *slot = p;
        Ok(())
    }
}

impl SurfaceQuery for MemoryHost {
    fn solid_surfaces(&self) -> Vec<Surface> {
        self.meshes
            .values()
            .filter(|m| m.visible && m.solid)
            .map(|m| Surface {
                world_from_local: m.world_from_local,
                face_centroids: m.face_centroids(),
            })
            .collect()
    }
}

impl Scheduler for MemoryHost {
    fn register_recurring(&mut self, interval_secs: f64) -> TimerId {
        let id = TimerId(self.fresh_id());
        self.timers.insert(
            id,
            Timer {
                interval: interval_secs,
                due: self.clock + interval_secs,
            },
        );
        id
    }

    fn unregister(&mut self, id: TimerId) -> bool {
        self.timers.remove(&id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::vector;

    fn close(a: Point, b: Point) -> bool {
        (a - b).norm() < 1e-12
    }

    fn shifted_quad(host: &mut MemoryHost) -> MeshRef {
        let mesh = MemoryMesh::new(vec![
            vector![0.0, 0.0, 0.0],
            vector![1.0, 0.0, 0.0],
            vector![1.0, 1.0, 0.0],
            vector![0.0, 1.0, 0.0],
        ])
        .with_transform(Matrix4::new_translation(&vector![0.0, 0.0, 2.0]))
        .with_faces(vec![vec![0, 1, 2, 3]]);
        host.add_mesh(mesh)
    }

    #[test]
    fn vertices_round_trip_through_world_space() {
        let mut host = MemoryHost::new();
        let m = shifted_quad(&mut host);
        assert_eq!(host.read_vertex(m, 1).unwrap(), vector![1.0, 0.0, 2.0]);
        host.write_vertex(m, 1, vector![3.0, 0.0, 2.5]).unwrap();
        assert!(close(host.mesh(m).unwrap().vertices[1], vector![3.0, 0.0, 0.5]));
        assert_eq!(host.vertex_writes(), 1);
        assert!(matches!(
            host.read_vertex(m, 9),
            Err(HostError::VertexOutOfRange { len: 4, .. })
        ));
    }

    #[test]
    fn passive_mesh_rejects_engine_writes() {
        let mut host = MemoryHost::new();
        let m = shifted_quad(&mut host);
        host.set_mode(m, MeshMode::Passive).unwrap();
        assert_eq!(
            host.write_vertex(m, 0, vector![0.0, 0.0, 0.0]),
            Err(HostError::NotEditable(m))
        );
        // User edits still go through.
        host.move_vertex(m, 0, vector![0.0, 0.0, 5.0]).unwrap();
        assert!(close(host.read_vertex(m, 0).unwrap(), vector![0.0, 0.0, 5.0]));
        assert_eq!(host.vertex_writes(), 0);
    }

    #[test]
    fn surfaces_carry_face_centroids() {
        let mut host = MemoryHost::new();
        let m = shifted_quad(&mut host);
        let s = host.solid_surfaces();
        assert_eq!(s.len(), 1);
        assert_eq!(s[0].face_centroids, vec![vector![0.5, 0.5, 0.0]]);
        host.mesh_mut(m).unwrap().visible = false;
        assert!(host.solid_surfaces().is_empty());
    }

    #[test]
    fn timers_fire_on_their_interval() {
        let mut host = MemoryHost::new();
        let t = host.register_recurring(0.1);
        assert!(host.advance(0.05).is_empty());
        assert_eq!(host.advance(0.05), vec![t]);
        assert_eq!(host.advance(0.25), vec![t, t]);
        assert!(host.unregister(t));
        assert!(!host.unregister(t));
        assert!(host.advance(1.0).is_empty());
    }

    #[test]
    fn zero_interval_timer_fires_once_per_advance() {
        let mut host = MemoryHost::new();
        let t = host.register_recurring(0.0);
        assert_eq!(host.advance(1.0), vec![t]);
        assert_eq!(host.advance(0.0), vec![t]);
    }

    #[test]
    fn objects_are_created_and_destroyed() {
        let mut host = MemoryHost::new();
        let o = host.create_point_object(vector![1.0, 2.0, 3.0]);
        host.set_position(o, vector![0.0, 0.0, 1.0]).unwrap();
        assert_eq!(host.position(o).unwrap(), vector![0.0, 0.0, 1.0]);
        host.destroy_point_object(o).unwrap();
        assert_eq!(host.position(o), Err(HostError::ObjectMissing(o)));
        assert_eq!(host.object_count(), 0);
    }
}
