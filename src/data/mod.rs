//! Durable persistence layer: database wrapper, bounded record stores, and
//! the workspace data models.

pub mod audit_queue;
pub mod database;
pub mod migrations;
pub mod models;
pub mod record_store;

pub use audit_queue::{AuditQueue, AUDIT_RETENTION};
pub use database::{Database, DatabaseError};
pub use models::{
    AuditEntry, AuditLevel, GroupIdentity, LinkOrigin, ProductTab, StepLink, TimelineStep,
    WorkspaceSnapshot, WorkspaceState,
};
pub use record_store::{DurableRecordStore, WriteReceipt};
