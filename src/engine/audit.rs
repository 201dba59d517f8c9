//! Audit trail: local durable queue plus the optional remote mirror.
//!
//! Recording never fails and never blocks: the local enqueue degrades with
//! the medium, and the remote report is fire-and-forget.

use serde_json::{json, Value};
use std::sync::Arc;

use crate::data::{AuditEntry, AuditLevel, AuditQueue};
use crate::remote::UiAuditClient;

#[derive(Clone)]
pub struct AuditTrail {
    queue: AuditQueue,
    remote: Option<Arc<UiAuditClient>>,
}

impl AuditTrail {
    pub fn new(queue: AuditQueue, remote: Option<Arc<UiAuditClient>>) -> Self {
        Self { queue, remote }
    }

    /// Record an action locally and mirror it to the UI audit endpoint.
    pub fn record(
        &self,
        action: &str,
        level: AuditLevel,
        message: Option<String>,
        context: Option<Value>,
    ) -> AuditEntry {
        let entry = self.queue.enqueue(action, level, message, context);
        if let Some(remote) = &self.remote {
            remote.report(
                action,
                json!({
                    "level": entry.level,
                    "message": entry.message,
                    "context": entry.context,
                }),
            );
        }
        entry
    }

    pub fn queue(&self) -> &AuditQueue {
        &self.queue
    }
}
