//! Error types surfaced synchronously by user-triggered operations.
//!
//! Store lookups do not use these: they return `Option` so a missing key is an
//! explicit, checkable result. Reconciliation faults live in `reconcile` and are
//! never surfaced to callers of user operations.

use crate::curves::CurveError;
use crate::types::{MeshRef, ObjectRef, PolylineKey, VertexIndex};
use thiserror::Error;

/// Failure reported by a host collaborator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HostError {
    #[error("mesh {0:?} does not exist")]
    MeshMissing(MeshRef),
    #[error("mesh {0:?} is not in an editable session")]
    NotEditable(MeshRef),
    #[error("vertex {index} out of range for mesh {mesh:?} ({len} vertices)")]
    VertexOutOfRange {
        mesh: MeshRef,
        index: VertexIndex,
        len: usize,
    },
    #[error("mesh {0:?} has a singular world transform")]
    SingularTransform(MeshRef),
    #[error("point object {0:?} does not exist")]
    ObjectMissing(ObjectRef),
}

/// Rejected configuration value.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid config `{field}`: {reason}")]
pub struct CfgError {
    pub field: &'static str,
    pub reason: String,
}

impl CfgError {
    pub(crate) fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Failure of a generation, rotation, editing or deletion operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OpError {
    #[error("invalid selection: {reason}")]
    InvalidSelection { reason: String },
    #[error("no polyline selected")]
    NoActivePolyline,
    #[error("{0} not found")]
    NotFound(PolylineKey),
    #[error("cannot merge {0} with itself")]
    SelfMerge(PolylineKey),
    #[error("cannot rotate linear polyline {0}")]
    LinearRotation(PolylineKey),
    #[error("node does not belong to {0}")]
    StaleNode(PolylineKey),
    #[error(transparent)]
    Config(#[from] CfgError),
    #[error(transparent)]
    Curve(#[from] CurveError),
    #[error(transparent)]
    Host(#[from] HostError),
}

impl OpError {
    pub(crate) fn selection(reason: impl Into<String>) -> Self {
        Self::InvalidSelection {
            reason: reason.into(),
        }
    }
}
