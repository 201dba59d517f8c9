//! Debounced snapshot writer and startup restore.
//!
//! Every workspace mutation re-arms a single delay timer; only the final
//! quiet period triggers a write (debounce, not throttle). The state that
//! gets written is read when the timer fires, never a copy captured when it
//! was armed. Teardown cancels a pending timer; a write that has already
//! started is left to finish.

use chrono::Utc;
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::audit::AuditTrail;
use super::timeline::TimelineStore;
use crate::data::{AuditLevel, DurableRecordStore, WorkspaceSnapshot};
use crate::util::{record_key, spawn_after, DelayedTask};

/// Snapshot schema version written into every record
pub const SNAPSHOT_VERSION: u32 = 1;

/// Maximum number of retained workspace snapshots
pub const SNAPSHOT_RETENTION: usize = 5;

pub struct AutosaveScheduler {
    state: Arc<Mutex<TimelineStore>>,
    snapshots: DurableRecordStore<WorkspaceSnapshot>,
    audit: AuditTrail,
    debounce: Duration,
    pending: Mutex<Option<DelayedTask>>,
}

impl AutosaveScheduler {
    /// Build the scheduler, restoring the latest snapshot (if any) into the
    /// store before any further mutation can arrive.
    pub fn start(
        state: Arc<Mutex<TimelineStore>>,
        snapshots: DurableRecordStore<WorkspaceSnapshot>,
        audit: AuditTrail,
        debounce: Duration,
    ) -> Self {
        if let Some(snapshot) = snapshots.read_latest() {
            state.lock().restore(snapshot.state);
            audit.record(
                "routing.snapshot.restore",
                AuditLevel::Info,
                None,
                Some(json!({"snapshot_id": snapshot.id, "version": snapshot.version})),
            );
            debug!(snapshot_id = %snapshot.id, "Restored workspace snapshot");
        }

        Self {
            state,
            snapshots,
            audit,
            debounce,
            pending: Mutex::new(None),
        }
    }

    /// Re-arm the debounce timer. A timer that has not fired yet is
    /// cancelled and replaced.
    pub fn notify_mutation(&self) {
        let state = self.state.clone();
        let snapshots = self.snapshots.clone();
        let audit = self.audit.clone();

        let mut pending = self.pending.lock();
        if let Some(task) = pending.take() {
            task.cancel();
        }
        *pending = Some(spawn_after(self.debounce, move || async move {
            flush_snapshot(&state, &snapshots, &audit).await;
        }));
    }

    /// Write a snapshot immediately, cancelling any pending timer.
    pub async fn flush_now(&self) {
        if let Some(task) = self.pending.lock().take() {
            task.cancel();
        }
        flush_snapshot(&self.state, &self.snapshots, &self.audit).await;
    }

    /// Cancel a pending timer. An already-dispatched write completes on its
    /// own.
    pub fn shutdown(&self) {
        if let Some(task) = self.pending.lock().take() {
            task.cancel();
        }
    }
}

impl Drop for AutosaveScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn flush_snapshot(
    state: &Arc<Mutex<TimelineStore>>,
    snapshots: &DurableRecordStore<WorkspaceSnapshot>,
    audit: &AuditTrail,
) {
    // Serialize the state as it is *now*, at fire time.
    let snapshot = WorkspaceSnapshot {
        id: record_key(),
        created_at: Utc::now(),
        state: state.lock().snapshot_state(),
        version: SNAPSHOT_VERSION,
        persisted: snapshots.is_available(),
    };
    let snapshot_id = snapshot.id.clone();

    let store = snapshots.clone();
    let write = tokio::task::spawn_blocking(move || store.write(&snapshot.id, &snapshot)).await;

    match write {
        Ok(receipt) => {
            audit.record(
                "routing.snapshot.save",
                AuditLevel::Info,
                None,
                Some(json!({"snapshot_id": snapshot_id, "persisted": receipt.persisted})),
            );
        }
        Err(err) => {
            warn!(error = %err, "Snapshot write task failed");
            audit.record(
                "routing.snapshot.save",
                AuditLevel::Error,
                Some("Snapshot write task failed".to_string()),
                Some(json!({"snapshot_id": snapshot_id})),
            );
        }
    }
}
