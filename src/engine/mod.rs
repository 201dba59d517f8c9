//! The routing workspace engine: in-memory timeline state, undo/redo,
//! debounced durable autosave, and optimistic remote save reconciliation.

pub mod audit;
pub mod autosave;
pub mod core;
pub mod history;
pub mod reconciler;
pub mod timeline;

pub use audit::AuditTrail;
pub use autosave::{AutosaveScheduler, SNAPSHOT_RETENTION, SNAPSHOT_VERSION};
pub use history::{HistoryEntry, HistoryManager, DEFAULT_UNDO_DEPTH};
pub use reconciler::{SaveGroupRequest, SaveOutcome, SaveReconciler};
pub use self::core::RoutingCore;
pub use timeline::TimelineStore;
