//! Routing workspace engine.
//!
//! The client-resident state machine behind a manufacturing-process routing
//! editor: it owns the editable step sequence across product tabs, provides
//! bounded undo/redo, survives restarts through debounced durable
//! snapshots, and reconciles optimistic local edits against a remote save
//! API with checkpoint rollback on failure.
//!
//! Durability is best-effort by design: when the local medium is
//! unavailable the engine keeps working in memory only. The durable store
//! assumes a single writer per instance; there is no cross-process
//! coordination.

pub mod config;
pub mod data;
pub mod engine;
pub mod remote;
pub mod util;

pub use config::{EngineConfig, Persistence};
pub use data::{
    AuditEntry, AuditLevel, AuditQueue, Database, DatabaseError, DurableRecordStore,
    GroupIdentity, LinkOrigin, ProductTab, StepLink, TimelineStep, WorkspaceSnapshot,
    WorkspaceState, WriteReceipt,
};
pub use engine::{
    AuditTrail, AutosaveScheduler, HistoryEntry, HistoryManager, RoutingCore, SaveGroupRequest,
    SaveOutcome, SaveReconciler, TimelineStore,
};
pub use remote::{
    ErrorDetails, GroupDetail, GroupList, GroupListQuery, HttpPredictionClient,
    HttpRoutingGroupClient, PredictRequest, PredictResponse, PredictedItem, PredictedOperation,
    PredictionApi, RemoteError, RoutingGroupApi, RoutingGroupPayload, UiAuditClient,
};
