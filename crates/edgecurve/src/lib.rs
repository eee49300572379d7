//! Edge-bound polylines: curve sampling, storage, and endpoint synchronization.
//!
//! Purpose
//! - Generate ordered point sequences along a mesh edge using one of four curve
//!   families (linear, arc, cubic spline, helix) with an axial rotation.
//! - Keep every polyline's two endpoints synchronized with the mesh vertices they
//!   were generated from, while interior points stay freely editable.
//!
//! Layout
//! - `curves`: pure samplers `(v1, v2, n, rotation) -> n+1 points`.
//! - `collision`: face-centroid proximity oracle used to filter samples.
//! - `store`: arena-backed doubly-linked polylines plus fixed-schema metadata.
//! - `reconcile`: the recurring endpoint sync state machine.
//! - `rotate`: rotation-driven regeneration of existing polylines.
//! - `generate`, `edit`: the operations a host exposes to its users.
//! - `session`: host-integration layer that owns the store and the sync timer.
//! - `host`: the collaborator traits plus `MemoryHost`, an in-memory scene.
//!
//! Everything runs on one logical thread; operations never suspend mid-mutation,
//! so no locking is involved anywhere.

pub mod collision;
pub mod curves;
pub mod edit;
pub mod error;
pub mod generate;
pub mod host;
pub mod reconcile;
pub mod rotate;
pub mod session;
pub mod store;
pub mod types;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use error::{CfgError, HostError, OpError};
pub use types::{CurveType, MeshRef, ObjectRef, Point, PolylineKey, VertexBinding, VertexIndex};

/// Common exports for hosts and tools driving the engine.
pub mod prelude {
    pub use crate::collision::{collides, CollisionCfg, Surface};
    pub use crate::curves::{generate, CurveError};
    pub use crate::edit::{delete_point, mark_modified, merge_polylines, point_rows, summaries};
    pub use crate::generate::{generate_polyline, EdgeSelection, GenerateCfg, GenerateReport};
    pub use crate::host::{
        Host, MemoryHost, MeshMode, PointObjects, Scheduler, SurfaceQuery, TimerId, VertexSource,
    };
    pub use crate::reconcile::{reconcile_all, reconcile_polyline, PolylineSync, SyncCfg, TickReport};
    pub use crate::rotate::{regenerate, reset_and_rotate, RegenOutcome};
    pub use crate::session::Session;
    pub use crate::store::{NodeHandle, PolylineMetadata, PolylineNode, PolylineStore};
    pub use crate::types::*;
    pub use crate::{CfgError, HostError, OpError};
}
