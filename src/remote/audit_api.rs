//! Fire-and-forget reporting to the UI audit service.
//!
//! Reports are posted from a spawned task; a failure is logged and dropped.
//! Nothing in the engine ever waits on, or fails because of, this client.

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Serialize)]
struct AuditReport {
    action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<String>,
    payload: Value,
}

/// Client for the UI audit endpoint
pub struct UiAuditClient {
    base_url: String,
    username: Option<String>,
    client: Client,
    timeout: Duration,
}

impl UiAuditClient {
    pub fn new(
        base_url: impl Into<String>,
        username: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            username,
            client: Client::new(),
            timeout,
        }
    }

    /// Post an audit report without waiting for the outcome.
    ///
    /// Outside a tokio runtime the report is skipped; local audit records
    /// are unaffected either way.
    pub fn report(&self, action: &str, payload: Value) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            debug!(action, "No async runtime; skipping remote audit report");
            return;
        };

        let report = AuditReport {
            action: action.to_string(),
            username: self.username.clone(),
            payload,
        };
        let url = format!("{}/audit", self.base_url);
        let client = self.client.clone();
        let timeout = self.timeout;

        handle.spawn(async move {
            let result = client
                .post(&url)
                .timeout(timeout)
                .json(&report)
                .send()
                .await;
            match result {
                Ok(response) if !response.status().is_success() => {
                    debug!(action = %report.action, status = %response.status(), "Audit report rejected");
                }
                Err(err) => {
                    debug!(action = %report.action, error = %err, "Audit report failed");
                }
                _ => {}
            }
        });
    }
}
