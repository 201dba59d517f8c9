//! Routing Group API client: wire types, trait seam, and the HTTP
//! implementation.
//!
//! The wire payload serializes every optional step field as an explicit
//! `null` (no `skip_serializing_if`), which the save service requires.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use super::error::RemoteError;
use crate::data::{GroupIdentity, StepLink, TimelineStep};

/// One timeline step in save-payload form
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoutingStepPayload {
    pub seq: u32,
    pub process_code: String,
    pub description: Option<String>,
    /// Run time on the wire; the editor calls this `run_time`
    pub duration_min: Option<f64>,
    pub setup_time: Option<f64>,
    pub wait_time: Option<f64>,
    pub routing_set_code: Option<String>,
    pub variant_code: Option<String>,
    pub primary_routing_code: Option<String>,
    pub secondary_routing_code: Option<String>,
    pub branch_code: Option<String>,
    pub branch_label: Option<String>,
    pub branch_path: Option<String>,
    pub sql_values: Option<Value>,
    pub metadata: Option<Value>,
}

impl From<&TimelineStep> for RoutingStepPayload {
    fn from(step: &TimelineStep) -> Self {
        Self {
            seq: step.seq,
            process_code: step.process_code.clone(),
            description: step.description.clone(),
            duration_min: step.run_time,
            setup_time: step.setup_time,
            wait_time: step.wait_time,
            routing_set_code: step.routing_set_code.clone(),
            variant_code: step.variant_code.clone(),
            primary_routing_code: step.primary_routing_code.clone(),
            secondary_routing_code: step.secondary_routing_code.clone(),
            branch_code: step.branch_code.clone(),
            branch_label: step.branch_label.clone(),
            branch_path: step.branch_path.clone(),
            sql_values: step.sql_values.clone(),
            metadata: step.metadata.clone(),
        }
    }
}

/// A manual step connection in save-payload form
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectionPayload {
    pub source: String,
    pub target: String,
}

impl From<&StepLink> for ConnectionPayload {
    fn from(link: &StepLink) -> Self {
        Self {
            source: link.from_step_id.clone(),
            target: link.to_step_id.clone(),
        }
    }
}

/// Create-group request body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoutingGroupPayload {
    pub group_name: String,
    pub item_codes: Vec<String>,
    pub steps: Vec<RoutingStepPayload>,
    pub connections: Vec<ConnectionPayload>,
    pub erp_required: bool,
    pub metadata: Option<Value>,
}

/// Full group detail returned by the read side
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupDetail {
    pub group_id: String,
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default)]
    pub item_codes: Vec<String>,
    #[serde(default)]
    pub steps: Vec<RoutingStepPayload>,
    #[serde(default)]
    pub erp_required: bool,
    #[serde(default)]
    pub metadata: Option<Value>,
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

impl GroupDetail {
    pub fn identity(&self) -> GroupIdentity {
        GroupIdentity {
            group_id: self.group_id.clone(),
            version: self.version,
            updated_at: self.updated_at,
        }
    }
}

/// Query parameters for the list endpoint
#[derive(Debug, Clone, Default, Serialize)]
pub struct GroupListQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    pub limit: u32,
    pub offset: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupSummary {
    pub group_id: String,
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default)]
    pub item_codes: Vec<String>,
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Pagination {
    pub limit: u32,
    pub offset: u32,
    pub total: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupList {
    pub items: Vec<GroupSummary>,
    pub pagination: Pagination,
}

/// Seam for the routing group service, so tests can substitute a mock
/// without touching the network.
#[async_trait]
pub trait RoutingGroupApi: Send + Sync {
    async fn create_group(&self, payload: &RoutingGroupPayload)
        -> Result<GroupIdentity, RemoteError>;
    async fn fetch_group(&self, group_id: &str) -> Result<GroupDetail, RemoteError>;
    async fn list_groups(&self, query: &GroupListQuery) -> Result<GroupList, RemoteError>;
}

/// HTTP client for the routing group service
pub struct HttpRoutingGroupClient {
    base_url: String,
    client: Client,
    timeout: Duration,
}

impl HttpRoutingGroupClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            client: Client::new(),
            timeout,
        }
    }

    async fn read_body(response: reqwest::Response) -> Result<String, RemoteError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(RemoteError::from_reqwest)?;
        if !status.is_success() {
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    fn parse<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, RemoteError> {
        serde_json::from_str(body).map_err(|err| RemoteError::Payload(err.to_string()))
    }
}

#[async_trait]
impl RoutingGroupApi for HttpRoutingGroupClient {
    async fn create_group(
        &self,
        payload: &RoutingGroupPayload,
    ) -> Result<GroupIdentity, RemoteError> {
        let url = format!("{}/routing/groups", self.base_url);
        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(payload)
            .send()
            .await
            .map_err(RemoteError::from_reqwest)?;

        let body = Self::read_body(response).await?;
        Self::parse(&body)
    }

    async fn fetch_group(&self, group_id: &str) -> Result<GroupDetail, RemoteError> {
        let url = format!("{}/routing/groups/{}", self.base_url, group_id);
        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(RemoteError::from_reqwest)?;

        let body = Self::read_body(response).await?;
        Self::parse(&body)
    }

    async fn list_groups(&self, query: &GroupListQuery) -> Result<GroupList, RemoteError> {
        let url = format!("{}/routing/groups", self.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .query(query)
            .send()
            .await
            .map_err(RemoteError::from_reqwest)?;

        let body = Self::read_body(response).await?;
        Self::parse(&body)
    }
}
