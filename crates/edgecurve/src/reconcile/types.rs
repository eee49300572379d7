//! Result and configuration types of the reconciler.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{CfgError, HostError};
use crate::types::{Point, PolylineKey, VertexIndex, SYNC_EPS, SYNC_INTERVAL_SECS};

/// Reconciler tolerances and cadence.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncCfg {
    /// Drift (distance units) above which a side counts as moved.
    pub eps: f64,
    pub interval_secs: f64,
}

impl Default for SyncCfg {
    fn default() -> Self {
        Self {
            eps: SYNC_EPS,
            interval_secs: SYNC_INTERVAL_SECS,
        }
    }
}

impl SyncCfg {
    pub fn validate(&self) -> Result<(), CfgError> {
        if !(self.eps > 0.0 && self.eps.is_finite()) {
            return Err(CfgError::new("eps", format!("{} must be positive", self.eps)));
        }
        if !(self.interval_secs > 0.0 && self.interval_secs.is_finite()) {
            return Err(CfgError::new(
                "interval_secs",
                format!("{} must be positive", self.interval_secs),
            ));
        }
        Ok(())
    }
}

/// What happened to one endpoint during a tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EndpointSync {
    /// Not an endpoint bound to a vertex; nothing to do.
    Unbound,
    /// First sighting: tracking initialized, no propagation.
    Baseline,
    Unchanged,
    /// The vertex moved and the point object was moved onto it.
    Pulled(Point),
    /// The point object moved (possibly together with the vertex) and the vertex
    /// was written to match it.
    Pushed(Point),
    /// Source mesh not editable; only vertex tracking was refreshed.
    Passive,
    /// The bound vertex's mesh no longer exists.
    Detached,
}

impl EndpointSync {
    /// Whether anything was written to the host.
    #[inline]
    pub fn wrote(&self) -> bool {
        matches!(self, EndpointSync::Pulled(_) | EndpointSync::Pushed(_))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PolylineSync {
    /// Neither the source mesh nor any endpoint's bound mesh exists; skipped
    /// this tick.
    SourceMissing,
    Checked {
        head: EndpointSync,
        tail: EndpointSync,
    },
}

impl PolylineSync {
    pub fn wrote(&self) -> bool {
        match self {
            PolylineSync::SourceMissing => false,
            PolylineSync::Checked { head, tail } => head.wrote() || tail.wrote(),
        }
    }
}

/// Per-polyline failure of a tick. Never fatal; the next tick retries.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyncFault {
    #[error("{0} not found")]
    NotFound(PolylineKey),
    #[error("bound vertex {index} no longer exists ({len} vertices)")]
    StaleVertex { index: VertexIndex, len: usize },
    #[error("endpoint has no point object")]
    MissingObject,
    #[error(transparent)]
    Host(#[from] HostError),
}

impl SyncFault {
    pub(crate) fn from_read(e: HostError) -> Self {
        match e {
            HostError::VertexOutOfRange { index, len, .. } => SyncFault::StaleVertex { index, len },
            other => SyncFault::Host(other),
        }
    }
}

/// Aggregated outcome of one tick, in key order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    pub results: Vec<(PolylineKey, Result<PolylineSync, SyncFault>)>,
}

impl TickReport {
    pub fn faults(&self) -> impl Iterator<Item = (PolylineKey, &SyncFault)> + '_ {
        self.results
            .iter()
            .filter_map(|(k, r)| r.as_ref().err().map(|e| (*k, e)))
    }

    /// Number of polylines for which something was written.
    pub fn writes(&self) -> usize {
        self.results
            .iter()
            .filter(|(_, r)| r.as_ref().is_ok_and(|s| s.wrote()))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.results
            .iter()
            .filter(|(_, r)| matches!(r, Ok(PolylineSync::SourceMissing)))
            .count()
    }
}
