//! Collaborator interfaces the engine consumes from its host application.
//!
//! The host owns meshes, the user-movable point objects, the scene's solid
//! surfaces, and the timer loop. The engine only reads and writes through these
//! traits; `MemoryHost` implements all of them in memory.
//!
//! All positions crossing these traits are world-space.

mod memory;

pub use memory::{MemoryHost, MemoryMesh};

use crate::collision::Surface;
use crate::error::HostError;
use crate::types::{MeshRef, ObjectRef, Point, VertexIndex};

/// Interaction state of a mesh. Vertex writes are only possible while editing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeshMode {
    Edit,
    Passive,
}

/// Read (and, in edit mode, write) mesh vertices.
pub trait VertexSource {
    /// `None` if the mesh no longer exists.
    fn mesh_mode(&self, mesh: MeshRef) -> Option<MeshMode>;

    fn vertex_count(&self, mesh: MeshRef) -> Option<usize>;

    fn read_vertex(&self, mesh: MeshRef, index: VertexIndex) -> Result<Point, HostError>;

    /// Fails with `HostError::NotEditable` outside an edit session.
    fn write_vertex(&mut self, mesh: MeshRef, index: VertexIndex, p: Point)
        -> Result<(), HostError>;

    #[inline]
    fn mesh_exists(&self, mesh: MeshRef) -> bool {
        self.mesh_mode(mesh).is_some()
    }
}

/// Factory and accessor for the host-side point representations of nodes.
pub trait PointObjects {
    fn create_point_object(&mut self, position: Point) -> ObjectRef;

    fn destroy_point_object(&mut self, obj: ObjectRef) -> Result<(), HostError>;

    fn position(&self, obj: ObjectRef) -> Result<Point, HostError>;

    fn set_position(&mut self, obj: ObjectRef, p: Point) -> Result<(), HostError>;
}

/// Visible solid surfaces of the scene, for the collision oracle.
pub trait SurfaceQuery {
    fn solid_surfaces(&self) -> Vec<Surface>;
}

/// Identifier of a recurring timer registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(pub u64);

/// Recurring callbacks at a fixed interval. The host calls back into the
/// registrant (see `Session::on_sync_timer`) whenever a timer fires.
pub trait Scheduler {
    fn register_recurring(&mut self, interval_secs: f64) -> TimerId;

    /// `false` if the id was not registered.
    fn unregister(&mut self, id: TimerId) -> bool;
}

/// Everything generation and synchronization need from a host.
pub trait Host: VertexSource + PointObjects + SurfaceQuery {}

impl<T: VertexSource + PointObjects + SurfaceQuery> Host for T {}
