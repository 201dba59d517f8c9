//! Durable queue of audit records.
//!
//! A thin specialization of [`DurableRecordStore`] for user/system action
//! records. Enqueueing never fails from the caller's point of view: when the
//! medium is unavailable the entry simply reports `persisted: false`. The
//! queue is traceability only; nothing in the engine reads it for control
//! flow.

use chrono::Utc;
use serde_json::Value;

use super::database::Database;
use super::models::{AuditEntry, AuditLevel};
use super::record_store::DurableRecordStore;
use crate::util::record_key;

/// Maximum number of retained audit records
pub const AUDIT_RETENTION: usize = 50;

#[derive(Clone)]
pub struct AuditQueue {
    store: DurableRecordStore<AuditEntry>,
}

impl AuditQueue {
    /// Create an audit queue with the default retention bound.
    pub fn new(db: Option<&Database>) -> Self {
        Self::with_retention(db, AUDIT_RETENTION)
    }

    pub fn with_retention(db: Option<&Database>, retention: usize) -> Self {
        Self {
            store: DurableRecordStore::new(db, "audit_queue", retention),
        }
    }

    /// Record an action. Returns the entry as written, with `persisted`
    /// reflecting whether it reached durable storage.
    pub fn enqueue(
        &self,
        action: &str,
        level: AuditLevel,
        message: Option<String>,
        context: Option<Value>,
    ) -> AuditEntry {
        let mut entry = AuditEntry {
            id: record_key(),
            action: action.to_string(),
            level,
            message,
            context,
            created_at: Utc::now(),
            persisted: self.store.is_available(),
        };
        entry.persisted = self.store.write(&entry.id, &entry).persisted;
        entry
    }

    /// All retained entries, oldest first.
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.store.read_all()
    }

    /// The most recently recorded entry.
    pub fn latest(&self) -> Option<AuditEntry> {
        self.store.read_latest()
    }

    pub fn count(&self) -> usize {
        self.store.count()
    }
}
