//! Mock API clients for deterministic testing.
//!
//! Implement the RoutingGroupApi / PredictionApi traits with scriptable
//! responses so engine tests never touch the network. Builder-style
//! configuration: queue failures, preload groups, then assert on the
//! recorded calls.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use super::error::RemoteError;
use super::prediction::{PredictRequest, PredictResponse, PredictedItem, PredictionApi};
use super::routing_group::{
    GroupDetail, GroupList, GroupListQuery, GroupSummary, Pagination, RoutingGroupApi,
    RoutingGroupPayload,
};
use crate::data::GroupIdentity;

#[derive(Default)]
struct MockGroupState {
    /// Queued create outcomes, consumed front-first; empty queue = success
    create_results: VecDeque<Result<GroupIdentity, RemoteError>>,
    create_calls: Vec<RoutingGroupPayload>,
    groups: HashMap<String, GroupDetail>,
    created: u64,
}

/// Mock routing group client with scriptable create outcomes
#[derive(Clone, Default)]
pub struct MockRoutingGroupClient {
    state: Arc<Mutex<MockGroupState>>,
}

impl MockRoutingGroupClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an explicit outcome for the next `create_group` call.
    pub fn with_create_result(self, result: Result<GroupIdentity, RemoteError>) -> Self {
        self.state.lock().create_results.push_back(result);
        self
    }

    /// Queue a generic server failure for the next `create_group` call.
    pub fn failing(self) -> Self {
        self.with_create_result(Err(RemoteError::Status {
            status: 500,
            body: "mock failure".to_string(),
        }))
    }

    /// Queue a timeout for the next `create_group` call.
    pub fn timing_out(self) -> Self {
        self.with_create_result(Err(RemoteError::Timeout))
    }

    /// Preload a group for `fetch_group` / `list_groups`.
    pub fn with_group(self, detail: GroupDetail) -> Self {
        self.state.lock().groups.insert(detail.group_id.clone(), detail);
        self
    }

    /// Payloads received by `create_group`, in call order.
    pub fn create_calls(&self) -> Vec<RoutingGroupPayload> {
        self.state.lock().create_calls.clone()
    }

    pub fn create_call_count(&self) -> usize {
        self.state.lock().create_calls.len()
    }
}

#[async_trait]
impl RoutingGroupApi for MockRoutingGroupClient {
    async fn create_group(
        &self,
        payload: &RoutingGroupPayload,
    ) -> Result<GroupIdentity, RemoteError> {
        let mut state = self.state.lock();
        state.create_calls.push(payload.clone());

        if let Some(result) = state.create_results.pop_front() {
            return result;
        }

        state.created += 1;
        Ok(GroupIdentity {
            group_id: format!("grp-mock-{}", state.created),
            version: 1,
            updated_at: Utc::now(),
        })
    }

    async fn fetch_group(&self, group_id: &str) -> Result<GroupDetail, RemoteError> {
        self.state
            .lock()
            .groups
            .get(group_id)
            .cloned()
            .ok_or_else(|| RemoteError::Status {
                status: 404,
                body: format!(r#"{{"detail":"Group {group_id} not found"}}"#),
            })
    }

    async fn list_groups(&self, query: &GroupListQuery) -> Result<GroupList, RemoteError> {
        let state = self.state.lock();
        let mut items: Vec<GroupSummary> = state
            .groups
            .values()
            .map(|detail| GroupSummary {
                group_id: detail.group_id.clone(),
                group_name: detail.group_name.clone(),
                item_codes: detail.item_codes.clone(),
                version: detail.version,
                updated_at: detail.updated_at,
            })
            .collect();
        items.sort_by(|a, b| a.group_id.cmp(&b.group_id));

        let total = items.len() as u64;
        let items = items
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .collect();

        Ok(GroupList {
            items,
            pagination: Pagination {
                limit: query.limit,
                offset: query.offset,
                total,
            },
        })
    }
}

#[derive(Default)]
struct MockPredictionState {
    results: VecDeque<Result<Vec<PredictedItem>, RemoteError>>,
    call_count: usize,
}

/// Mock prediction client returning pre-configured recommendation items
#[derive(Clone, Default)]
pub struct MockPredictionClient {
    state: Arc<Mutex<MockPredictionState>>,
}

impl MockPredictionClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(self, items: Vec<PredictedItem>) -> Self {
        self.state.lock().results.push_back(Ok(items));
        self
    }

    pub fn failing(self) -> Self {
        self.state.lock().results.push_back(Err(RemoteError::Status {
            status: 500,
            body: "mock failure".to_string(),
        }));
        self
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().call_count
    }
}

#[async_trait]
impl PredictionApi for MockPredictionClient {
    async fn predict(&self, _request: &PredictRequest) -> Result<PredictResponse, RemoteError> {
        let mut state = self.state.lock();
        state.call_count += 1;
        let items = match state.results.pop_front() {
            Some(result) => result?,
            None => Vec::new(),
        };
        Ok(PredictResponse {
            items,
            candidates: serde_json::Value::Null,
            metrics: serde_json::Value::Null,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> RoutingGroupPayload {
        RoutingGroupPayload {
            group_name: "test".to_string(),
            item_codes: vec!["ITM-001".to_string()],
            steps: Vec::new(),
            connections: Vec::new(),
            erp_required: false,
            metadata: None,
        }
    }

    #[tokio::test]
    async fn test_default_create_succeeds_with_fresh_ids() {
        let mock = MockRoutingGroupClient::new();

        let first = mock.create_group(&payload()).await.unwrap();
        let second = mock.create_group(&payload()).await.unwrap();

        assert_ne!(first.group_id, second.group_id);
        assert_eq!(mock.create_call_count(), 2);
    }

    #[tokio::test]
    async fn test_queued_failure_then_success() {
        let mock = MockRoutingGroupClient::new().failing();

        assert!(mock.create_group(&payload()).await.is_err());
        assert!(mock.create_group(&payload()).await.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_unknown_group_is_404() {
        let mock = MockRoutingGroupClient::new();
        match mock.fetch_group("missing").await {
            Err(RemoteError::Status { status, .. }) => assert_eq!(status, 404),
            other => panic!("expected 404, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_list_groups_paginates() {
        let mut mock = MockRoutingGroupClient::new();
        for i in 0..3 {
            mock = mock.with_group(GroupDetail {
                group_id: format!("grp-{i}"),
                group_name: Some(format!("Line {i}")),
                item_codes: vec![format!("ITM-00{i}")],
                steps: Vec::new(),
                erp_required: false,
                metadata: None,
                version: 1,
                updated_at: Utc::now(),
            });
        }

        let page = mock
            .list_groups(&GroupListQuery {
                owner: None,
                search: None,
                limit: 2,
                offset: 1,
            })
            .await
            .unwrap();

        assert_eq!(page.pagination.total, 3);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].group_id, "grp-1");
    }
}
