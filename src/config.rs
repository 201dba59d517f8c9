//! Engine configuration

use std::path::PathBuf;
use std::time::Duration;

use crate::data::AUDIT_RETENTION;
use crate::engine::history::DEFAULT_UNDO_DEPTH;

/// Where the durable workspace medium lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Persistence {
    /// The default location (~/.routeline/routeline.db)
    DefaultPath,
    /// An explicit database file path
    Path(PathBuf),
    /// Process-lifetime storage only (no file on disk)
    InMemory,
    /// No durable medium at all; snapshots and audit degrade to no-ops
    Disabled,
}

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Durable medium for snapshots and the audit queue
    pub persistence: Persistence,
    /// Base URL of the prediction service
    pub prediction_base_url: String,
    /// Base URL of the routing group service
    pub routing_api_base_url: String,
    /// Base URL of the UI audit endpoint (None = local audit only)
    pub audit_api_base_url: Option<String>,
    /// Username attached to remote audit reports
    pub username: Option<String>,
    /// Quiet period before an autosave snapshot is written
    pub autosave_debounce: Duration,
    /// Bound on every remote call
    pub request_timeout: Duration,
    /// Retained workspace snapshots
    pub snapshot_retention: usize,
    /// Retained audit records
    pub audit_retention: usize,
    /// Retained undo points
    pub undo_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            persistence: Persistence::DefaultPath,
            prediction_base_url: "http://localhost:8000".to_string(),
            routing_api_base_url: "http://localhost:8000".to_string(),
            audit_api_base_url: None,
            username: None,
            autosave_debounce: Duration::from_secs(30),
            request_timeout: Duration::from_secs(15),
            snapshot_retention: crate::engine::SNAPSHOT_RETENTION,
            audit_retention: AUDIT_RETENTION,
            undo_depth: DEFAULT_UNDO_DEPTH,
        }
    }
}
