//! Host-integration layer.
//!
//! A `Session` owns the store, remembers which polyline the user has selected,
//! and owns the recurring sync timer. Hosts forward user actions to the
//! `*_active` methods and timer callbacks to `on_sync_timer`.

use crate::edit;
use crate::error::{CfgError, OpError};
use crate::generate::{generate_polyline, EdgeSelection, GenerateCfg, GenerateReport};
use crate::host::{Host, PointObjects, Scheduler, TimerId, VertexSource};
use crate::reconcile::{reconcile_all, SyncCfg, TickReport};
use crate::rotate::{self, RegenOutcome};
use crate::store::{NodeHandle, PolylineStore};
use crate::types::PolylineKey;

#[derive(Debug, Default)]
pub struct Session {
    store: PolylineStore,
    active: Option<PolylineKey>,
    sync: SyncCfg,
    timer: Option<TimerId>,
}

impl Session {
    /// A session with the given sync settings, rejected if they do not validate.
    pub fn new(sync: SyncCfg) -> Result<Self, CfgError> {
        sync.validate()?;
        Ok(Self {
            sync,
            ..Self::default()
        })
    }

    pub fn store(&self) -> &PolylineStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut PolylineStore {
        &mut self.store
    }

    pub fn sync_cfg(&self) -> &SyncCfg {
        &self.sync
    }

    pub fn active(&self) -> Option<PolylineKey> {
        self.active
    }

    pub fn timer(&self) -> Option<TimerId> {
        self.timer
    }

    /// Register the recurring sync timer unless one is already running.
    pub fn enable_sync<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S) -> TimerId {
        if let Some(id) = self.timer {
            return id;
        }
        let id = scheduler.register_recurring(self.sync.interval_secs);
        tracing::debug!(?id, interval = self.sync.interval_secs, "sync timer registered");
        self.timer = Some(id);
        id
    }

    /// `false` if no timer was running.
    pub fn disable_sync<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S) -> bool {
        match self.timer.take() {
            Some(id) => scheduler.unregister(id),
            None => false,
        }
    }

    pub fn select(&mut self, key: PolylineKey) -> Result<(), OpError> {
        if !self.store.contains_key(key) {
            return Err(OpError::NotFound(key));
        }
        self.active = Some(key);
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.active = None;
    }

    /// Generate from `selection`, make the result active and start syncing.
    pub fn generate<H>(
        &mut self,
        host: &mut H,
        selection: &EdgeSelection,
        cfg: &GenerateCfg,
    ) -> Result<GenerateReport, OpError>
    where
        H: Host + Scheduler + ?Sized,
    {
        let report = generate_polyline(&mut self.store, host, selection, cfg)?;
        self.active = Some(report.key);
        self.enable_sync(host);
        Ok(report)
    }

    pub fn rotate_active<H>(&mut self, host: &mut H, rotation_deg: f64) -> Result<RegenOutcome, OpError>
    where
        H: VertexSource + PointObjects + ?Sized,
    {
        let key = self.require_active()?;
        rotate::regenerate(&mut self.store, host, key, rotation_deg)
    }

    pub fn reset_and_rotate_active<H>(
        &mut self,
        host: &mut H,
        rotation_deg: f64,
    ) -> Result<RegenOutcome, OpError>
    where
        H: VertexSource + PointObjects + ?Sized,
    {
        let key = self.require_active()?;
        rotate::reset_and_rotate(&mut self.store, host, key, rotation_deg)
    }

    /// Delete the active polyline with all of its point objects. Returns the
    /// number of nodes released; the selection is cleared either way.
    pub fn delete_active<O: PointObjects + ?Sized>(&mut self, objects: &mut O) -> Result<usize, OpError> {
        let key = self.require_active()?;
        self.active = None;
        let released = self
            .store
            .delete_polyline(key, objects)
            .ok_or(OpError::NotFound(key))?;
        tracing::info!(%key, released, "deleted polyline");
        Ok(released)
    }

    pub fn delete_point<O: PointObjects + ?Sized>(
        &mut self,
        objects: &mut O,
        handle: NodeHandle,
    ) -> Result<(), OpError> {
        let key = self.require_active()?;
        edit::delete_point(&mut self.store, objects, key, handle)
    }

    /// Append `source` to the active polyline.
    pub fn merge_into_active(&mut self, source: PolylineKey) -> Result<PolylineKey, OpError> {
        let target = self.require_active()?;
        edit::merge_polylines(&mut self.store, source, target)
    }

    pub fn mark_active_modified(&mut self) -> Result<(), OpError> {
        let key = self.require_active()?;
        edit::mark_modified(&mut self.store, key)
    }

    /// One reconciliation tick. Faults are logged and left for the next tick.
    pub fn on_sync_timer<H>(&mut self, host: &mut H) -> TickReport
    where
        H: VertexSource + PointObjects + ?Sized,
    {
        let report = reconcile_all(&mut self.store, host, &self.sync);
        for (key, fault) in report.faults() {
            tracing::warn!(%key, %fault, "endpoint sync failed");
        }
        report
    }

    fn require_active(&self) -> Result<PolylineKey, OpError> {
        self.active.ok_or(OpError::NoActivePolyline)
    }
}
