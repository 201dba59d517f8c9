//! Data models for the routing workspace: timeline steps, product tabs,
//! and the durable record types (snapshots and audit entries).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

/// One production operation instance inside a timeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelineStep {
    /// Stable opaque identifier; never changes once assigned
    pub id: String,
    /// 1-based position within the timeline; contiguous `1..N`
    pub seq: u32,
    /// Manufacturing process code (e.g. "CUT", "WELD")
    pub process_code: String,
    /// Human-readable process description
    pub description: Option<String>,
    /// Setup time in minutes
    pub setup_time: Option<f64>,
    /// Run time in minutes
    pub run_time: Option<f64>,
    /// Wait time in minutes
    pub wait_time: Option<f64>,
    /// Item/product code this step was recommended for
    pub item_code: Option<String>,
    /// Prediction candidate the step originated from
    pub candidate_id: Option<String>,
    pub routing_set_code: Option<String>,
    pub variant_code: Option<String>,
    pub primary_routing_code: Option<String>,
    pub secondary_routing_code: Option<String>,
    pub branch_code: Option<String>,
    pub branch_label: Option<String>,
    pub branch_path: Option<String>,
    /// Open key-value bag forwarded verbatim to the save payload
    pub sql_values: Option<Value>,
    /// Open metadata bag
    pub metadata: Option<Value>,
}

impl TimelineStep {
    /// Create a new step with a fresh id. `seq` starts at 0 and is assigned
    /// by the timeline when the step is inserted.
    pub fn new(process_code: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            seq: 0,
            process_code: process_code.into(),
            description: None,
            setup_time: None,
            run_time: None,
            wait_time: None,
            item_code: None,
            candidate_id: None,
            routing_set_code: None,
            variant_code: None,
            primary_routing_code: None,
            secondary_routing_code: None,
            branch_code: None,
            branch_label: None,
            branch_path: None,
            sql_values: None,
            metadata: None,
        }
    }
}

/// How a step connection came to exist.
///
/// Only manual connections are ever sent to the save API; auto links are
/// derived from step adjacency and recomputed by consumers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LinkOrigin {
    Manual,
    Auto,
}

/// A connection between two steps of the same timeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepLink {
    pub from_step_id: String,
    pub to_step_id: String,
    pub origin: LinkOrigin,
}

impl StepLink {
    pub fn manual(from_step_id: impl Into<String>, to_step_id: impl Into<String>) -> Self {
        Self {
            from_step_id: from_step_id.into(),
            to_step_id: to_step_id.into(),
            origin: LinkOrigin::Manual,
        }
    }

    pub fn auto(from_step_id: impl Into<String>, to_step_id: impl Into<String>) -> Self {
        Self {
            from_step_id: from_step_id.into(),
            to_step_id: to_step_id.into(),
            origin: LinkOrigin::Auto,
        }
    }
}

/// One independently editable session, keyed by item/product code
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductTab {
    /// Unique identifier
    pub id: String,
    /// Item/product code the tab edits a routing for
    pub product_code: String,
    /// Display name
    pub product_name: String,
    /// Prediction candidate the tab was seeded from
    pub candidate_id: Option<String>,
    /// Ordered step sequence
    pub timeline: Vec<TimelineStep>,
    /// Connections between steps (manual and auto-derived)
    pub links: Vec<StepLink>,
}

impl ProductTab {
    pub fn new(product_code: impl Into<String>, product_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            product_code: product_code.into(),
            product_name: product_name.into(),
            candidate_id: None,
            timeline: Vec::new(),
            links: Vec::new(),
        }
    }
}

/// Server-assigned identity of a saved routing group
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupIdentity {
    pub group_id: String,
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

/// Serializable subset of workspace state captured into snapshots
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkspaceState {
    pub tabs: Vec<ProductTab>,
    pub active_tab_id: Option<String>,
    pub active_group: Option<GroupIdentity>,
    /// Last timeline confirmed persisted remotely, per tab id
    pub checkpoints: HashMap<String, Vec<TimelineStep>>,
    pub erp_required: bool,
    pub dirty: bool,
    pub last_saved_at: Option<DateTime<Utc>>,
}

/// Durable workspace snapshot record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkspaceSnapshot {
    /// Monotonic, lexicographically sortable record key
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub state: WorkspaceState,
    /// Snapshot schema version
    pub version: u32,
    /// Whether the write reached durable storage
    pub persisted: bool,
}

/// Severity of an audit entry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuditLevel {
    Info,
    Error,
}

impl AuditLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditLevel::Info => "info",
            AuditLevel::Error => "error",
        }
    }
}

/// Durable record of a user or system action, kept for traceability
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEntry {
    /// Monotonic, lexicographically sortable record key
    pub id: String,
    /// Dotted action name, e.g. `routing.snapshot.save`
    pub action: String,
    pub level: AuditLevel,
    pub message: Option<String>,
    pub context: Option<Value>,
    pub created_at: DateTime<Utc>,
    /// Whether the write reached durable storage
    pub persisted: bool,
}
