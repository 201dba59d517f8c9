//! Optimistic remote save with checkpoint rollback.
//!
//! Validation failures return synchronously without touching the network.
//! A confirmed save advances the tab's checkpoint; a failed save restores
//! the checkpoint wholesale and reports a classified message. Nothing here
//! panics across the boundary: callers always get a `SaveOutcome`.

use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use super::audit::AuditTrail;
use super::timeline::TimelineStore;
use crate::data::{AuditLevel, GroupIdentity, LinkOrigin, ProductTab, TimelineStep};
use crate::remote::{
    ConnectionPayload, ErrorDetails, GroupDetail, RemoteError, RoutingGroupApi,
    RoutingGroupPayload, RoutingStepPayload,
};

/// Request to persist one tab's timeline as a routing group
#[derive(Debug, Clone)]
pub struct SaveGroupRequest {
    pub tab_id: String,
    pub group_name: String,
    pub metadata: Option<serde_json::Value>,
}

/// Result surface of save/load operations
#[derive(Debug, Clone, PartialEq)]
pub struct SaveOutcome {
    pub ok: bool,
    pub message: Option<String>,
    /// Field-level server messages, when the failure had them
    pub field_errors: Vec<String>,
    pub group: Option<GroupIdentity>,
}

impl SaveOutcome {
    fn rejected(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: Some(message.into()),
            field_errors: Vec::new(),
            group: None,
        }
    }

    fn saved(group: GroupIdentity) -> Self {
        Self {
            ok: true,
            message: None,
            field_errors: Vec::new(),
            group: Some(group),
        }
    }

    fn failed(message: String, field_errors: Vec<String>) -> Self {
        Self {
            ok: false,
            message: Some(message),
            field_errors,
            group: None,
        }
    }
}

pub struct SaveReconciler {
    state: Arc<Mutex<TimelineStore>>,
    groups: Arc<dyn RoutingGroupApi>,
    audit: AuditTrail,
}

impl SaveReconciler {
    pub fn new(
        state: Arc<Mutex<TimelineStore>>,
        groups: Arc<dyn RoutingGroupApi>,
        audit: AuditTrail,
    ) -> Self {
        Self {
            state,
            groups,
            audit,
        }
    }

    /// Save a tab's timeline as a routing group.
    ///
    /// Callers gate concurrency: one in-flight save per tab (the UI
    /// disables the save action while `saving` is set).
    pub async fn save_group(&self, request: SaveGroupRequest) -> SaveOutcome {
        // Validate and serialize under one lock; no network call happens
        // unless both checks pass.
        let payload = {
            let state = self.state.lock();
            if request.group_name.trim().is_empty() {
                return SaveOutcome::rejected("Enter a group name.");
            }
            let Some(tab) = state.tab(&request.tab_id) else {
                return SaveOutcome::rejected("The session tab no longer exists.");
            };
            if tab.timeline.is_empty() {
                return SaveOutcome::rejected("Add at least one step before saving.");
            }
            build_payload(&request, tab, state.erp_required())
        };

        match self.groups.create_group(&payload).await {
            Ok(identity) => {
                {
                    let mut state = self.state.lock();
                    state.capture_last_success(&request.tab_id);
                    state.mark_saved(identity.clone());
                }
                self.audit.record(
                    "routing.group.save",
                    AuditLevel::Info,
                    None,
                    Some(json!({
                        "tab_id": request.tab_id,
                        "group_id": identity.group_id,
                        "version": identity.version,
                    })),
                );
                SaveOutcome::saved(identity)
            }
            Err(err) => {
                {
                    let mut state = self.state.lock();
                    state.rollback_to_last_success(&request.tab_id);
                }
                let (message, field_errors) = describe(&err);
                debug!(tab_id = %request.tab_id, error = %err, "Routing group save failed");
                self.audit.record(
                    "routing.group.save",
                    AuditLevel::Error,
                    Some(message.clone()),
                    Some(json!({
                        "tab_id": request.tab_id,
                        "field_errors": field_errors,
                    })),
                );
                SaveOutcome::failed(message, field_errors)
            }
        }
    }

    /// Load a saved routing group into the active tab, replacing its
    /// timeline wholesale and checkpointing the result.
    pub async fn load_group(&self, group_id: &str) -> SaveOutcome {
        if self.state.lock().active_tab().is_none() {
            return SaveOutcome::rejected("Open a session tab before loading a group.");
        }

        match self.groups.fetch_group(group_id).await {
            Ok(detail) => {
                let identity = detail.identity();
                let installed = {
                    let mut state = self.state.lock();
                    let steps = steps_from_detail(&detail);
                    match state.replace_active_timeline(steps) {
                        Some(tab_id) => {
                            state.capture_last_success(&tab_id);
                            state.mark_saved(identity.clone());
                            Some(tab_id)
                        }
                        None => None,
                    }
                };
                let Some(tab_id) = installed else {
                    return SaveOutcome::rejected("Open a session tab before loading a group.");
                };
                self.audit.record(
                    "routing.group.load",
                    AuditLevel::Info,
                    None,
                    Some(json!({"tab_id": tab_id, "group_id": identity.group_id})),
                );
                SaveOutcome::saved(identity)
            }
            Err(err) => {
                let (message, field_errors) = describe(&err);
                debug!(group_id, error = %err, "Routing group load failed");
                self.audit.record(
                    "routing.group.load",
                    AuditLevel::Error,
                    Some(message.clone()),
                    Some(json!({"group_id": group_id})),
                );
                SaveOutcome::failed(message, field_errors)
            }
        }
    }
}

fn build_payload(
    request: &SaveGroupRequest,
    tab: &ProductTab,
    erp_required: bool,
) -> RoutingGroupPayload {
    let step_ids: HashSet<&str> = tab.timeline.iter().map(|step| step.id.as_str()).collect();

    // Only manual connections whose endpoints both survive in the current
    // timeline are sent; auto-derived adjacency links never are.
    let connections = tab
        .links
        .iter()
        .filter(|link| {
            link.origin == LinkOrigin::Manual
                && step_ids.contains(link.from_step_id.as_str())
                && step_ids.contains(link.to_step_id.as_str())
        })
        .map(ConnectionPayload::from)
        .collect();

    RoutingGroupPayload {
        group_name: request.group_name.trim().to_string(),
        item_codes: vec![tab.product_code.clone()],
        steps: tab.timeline.iter().map(RoutingStepPayload::from).collect(),
        connections,
        erp_required,
        metadata: request.metadata.clone(),
    }
}

fn steps_from_detail(detail: &GroupDetail) -> Vec<TimelineStep> {
    let mut payloads: Vec<&RoutingStepPayload> = detail.steps.iter().collect();
    payloads.sort_by_key(|payload| payload.seq);

    payloads
        .into_iter()
        .map(|payload| {
            let mut step = TimelineStep::new(&payload.process_code);
            step.description = payload.description.clone();
            step.run_time = payload.duration_min;
            step.setup_time = payload.setup_time;
            step.wait_time = payload.wait_time;
            step.item_code = detail.item_codes.first().cloned();
            step.routing_set_code = payload.routing_set_code.clone();
            step.variant_code = payload.variant_code.clone();
            step.primary_routing_code = payload.primary_routing_code.clone();
            step.secondary_routing_code = payload.secondary_routing_code.clone();
            step.branch_code = payload.branch_code.clone();
            step.branch_label = payload.branch_label.clone();
            step.branch_path = payload.branch_path.clone();
            step.sql_values = payload.sql_values.clone();
            step.metadata = payload.metadata.clone();
            step
        })
        .collect()
}

fn describe(err: &RemoteError) -> (String, Vec<String>) {
    match err.classify() {
        ErrorDetails::Fields(fields) => {
            ("The save service rejected some fields.".to_string(), fields)
        }
        ErrorDetails::Summary(message) => (message, Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{AuditQueue, Database, StepLink};
    use crate::engine::history::DEFAULT_UNDO_DEPTH;
    use crate::remote::MockRoutingGroupClient;
    use chrono::Utc;

    struct Fixture {
        state: Arc<Mutex<TimelineStore>>,
        mock: MockRoutingGroupClient,
        reconciler: SaveReconciler,
        audit: AuditTrail,
        tab_id: String,
    }

    fn setup(mock: MockRoutingGroupClient) -> Fixture {
        let db = Database::open_in_memory().unwrap();
        let audit = AuditTrail::new(AuditQueue::new(Some(&db)), None);
        let state = Arc::new(Mutex::new(TimelineStore::new(DEFAULT_UNDO_DEPTH)));
        let tab_id = {
            let mut state = state.lock();
            let mut tab = ProductTab::new("ITM-001", "Widget");
            tab.timeline = vec![TimelineStep::new("CUT"), TimelineStep::new("WELD")];
            let id = tab.id.clone();
            state.add_tab(tab);
            state.insert_step(2, TimelineStep::new("PACK"));
            state.undo();
            id
        };
        let reconciler = SaveReconciler::new(state.clone(), Arc::new(mock.clone()), audit.clone());
        Fixture {
            state,
            mock,
            reconciler,
            audit,
            tab_id,
        }
    }

    fn request(fixture: &Fixture, name: &str) -> SaveGroupRequest {
        SaveGroupRequest {
            tab_id: fixture.tab_id.clone(),
            group_name: name.to_string(),
            metadata: None,
        }
    }

    #[tokio::test]
    async fn test_empty_name_short_circuits_without_network() {
        let fixture = setup(MockRoutingGroupClient::new());

        let outcome = fixture.reconciler.save_group(request(&fixture, "")).await;

        assert!(!outcome.ok);
        assert_eq!(outcome.message.as_deref(), Some("Enter a group name."));
        assert_eq!(fixture.mock.create_call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_timeline_short_circuits_without_network() {
        let fixture = setup(MockRoutingGroupClient::new());
        {
            let mut state = fixture.state.lock();
            state.add_tab(ProductTab::new("ITM-002", "Empty"));
        }
        let tab_id = fixture.state.lock().active_tab_id().unwrap().to_string();

        let outcome = fixture
            .reconciler
            .save_group(SaveGroupRequest {
                tab_id,
                group_name: "Line A".to_string(),
                metadata: None,
            })
            .await;

        assert!(!outcome.ok);
        assert_eq!(
            outcome.message.as_deref(),
            Some("Add at least one step before saving.")
        );
        assert_eq!(fixture.mock.create_call_count(), 0);
    }

    #[tokio::test]
    async fn test_successful_save_checkpoints_and_clears_dirty() {
        let fixture = setup(MockRoutingGroupClient::new());

        let outcome = fixture
            .reconciler
            .save_group(request(&fixture, "Line A"))
            .await;

        assert!(outcome.ok);
        let identity = outcome.group.unwrap();

        let state = fixture.state.lock();
        assert!(!state.is_dirty());
        assert_eq!(state.active_group().unwrap().group_id, identity.group_id);
        let checkpoint = state.checkpoint(&fixture.tab_id).unwrap();
        assert_eq!(checkpoint, state.tab(&fixture.tab_id).unwrap().timeline);
        drop(state);

        let entry = fixture.audit.queue().latest().unwrap();
        assert_eq!(entry.action, "routing.group.save");
        assert_eq!(entry.level, AuditLevel::Info);
    }

    #[tokio::test]
    async fn test_failed_save_rolls_back_to_checkpoint() {
        let fixture = setup(MockRoutingGroupClient::new().failing());

        let t0 = {
            let mut state = fixture.state.lock();
            state.capture_last_success(&fixture.tab_id);
            state.tab(&fixture.tab_id).unwrap().timeline.clone()
        };
        {
            let mut state = fixture.state.lock();
            state.insert_step(0, TimelineStep::new("GRIND"));
        }

        let outcome = fixture
            .reconciler
            .save_group(request(&fixture, "Line A"))
            .await;

        assert!(!outcome.ok);
        assert!(outcome.message.is_some());
        {
            let state = fixture.state.lock();
            assert_eq!(state.tab(&fixture.tab_id).unwrap().timeline, t0);
        }

        let entry = fixture.audit.queue().latest().unwrap();
        assert_eq!(entry.action, "routing.group.save");
        assert_eq!(entry.level, AuditLevel::Error);
    }

    #[tokio::test]
    async fn test_timeout_is_a_failure_like_any_other() {
        let fixture = setup(MockRoutingGroupClient::new().timing_out());

        let t0 = {
            let mut state = fixture.state.lock();
            state.capture_last_success(&fixture.tab_id);
            state.tab(&fixture.tab_id).unwrap().timeline.clone()
        };

        let outcome = fixture
            .reconciler
            .save_group(request(&fixture, "Line A"))
            .await;

        assert!(!outcome.ok);
        assert_eq!(
            fixture.state.lock().tab(&fixture.tab_id).unwrap().timeline,
            t0
        );
    }

    #[tokio::test]
    async fn test_field_errors_are_classified() {
        let mock = MockRoutingGroupClient::new().with_create_result(Err(RemoteError::Status {
            status: 422,
            body: r#"{"detail":[{"loc":["body","group_name"],"msg":"too long"}]}"#.to_string(),
        }));
        let fixture = setup(mock);

        let outcome = fixture
            .reconciler
            .save_group(request(&fixture, "Line A"))
            .await;

        assert!(!outcome.ok);
        assert_eq!(outcome.field_errors, vec!["body.group_name: too long"]);
    }

    #[tokio::test]
    async fn test_payload_filters_auto_and_dangling_links() {
        let fixture = setup(MockRoutingGroupClient::new());
        {
            let mut state = fixture.state.lock();
            let (first, second) = {
                let timeline = &state.tab(&fixture.tab_id).unwrap().timeline;
                (timeline[0].id.clone(), timeline[1].id.clone())
            };
            state.add_link(StepLink::manual(&first, &second));
            state.add_link(StepLink::auto(&second, &first));
            state.add_link(StepLink::manual(&first, "gone-step"));
        }

        let outcome = fixture
            .reconciler
            .save_group(request(&fixture, "Line A"))
            .await;
        assert!(outcome.ok);

        let calls = fixture.mock.create_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].connections.len(), 1);
        assert_eq!(calls[0].group_name, "Line A");
        assert_eq!(calls[0].item_codes, vec!["ITM-001"]);
        assert_eq!(calls[0].steps.len(), 2);
    }

    #[tokio::test]
    async fn test_load_group_replaces_active_timeline() {
        let detail = GroupDetail {
            group_id: "grp-9".to_string(),
            group_name: Some("Line B".to_string()),
            item_codes: vec!["ITM-009".to_string()],
            steps: vec![
                RoutingStepPayload {
                    seq: 2,
                    process_code: "PACK".to_string(),
                    description: None,
                    duration_min: Some(3.0),
                    setup_time: None,
                    wait_time: None,
                    routing_set_code: None,
                    variant_code: None,
                    primary_routing_code: None,
                    secondary_routing_code: None,
                    branch_code: None,
                    branch_label: None,
                    branch_path: None,
                    sql_values: None,
                    metadata: None,
                },
                RoutingStepPayload {
                    seq: 1,
                    process_code: "CUT".to_string(),
                    description: Some("Cut stock".to_string()),
                    duration_min: Some(7.5),
                    setup_time: Some(2.0),
                    wait_time: None,
                    routing_set_code: None,
                    variant_code: None,
                    primary_routing_code: None,
                    secondary_routing_code: None,
                    branch_code: None,
                    branch_label: None,
                    branch_path: None,
                    sql_values: None,
                    metadata: None,
                },
            ],
            erp_required: false,
            metadata: None,
            version: 4,
            updated_at: Utc::now(),
        };
        let fixture = setup(MockRoutingGroupClient::new().with_group(detail));

        let outcome = fixture.reconciler.load_group("grp-9").await;
        assert!(outcome.ok);

        let state = fixture.state.lock();
        let timeline = &state.tab(&fixture.tab_id).unwrap().timeline;
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline[0].process_code, "CUT");
        assert_eq!(timeline[0].seq, 1);
        assert_eq!(timeline[0].run_time, Some(7.5));
        assert_eq!(timeline[1].process_code, "PACK");
        assert_eq!(state.active_group().unwrap().group_id, "grp-9");
        assert_eq!(
            state.checkpoint(&fixture.tab_id).unwrap(),
            timeline.as_slice()
        );
    }

    #[tokio::test]
    async fn test_load_group_failure_reports_message() {
        let fixture = setup(MockRoutingGroupClient::new());

        let outcome = fixture.reconciler.load_group("missing").await;

        assert!(!outcome.ok);
        assert_eq!(
            outcome.message.as_deref(),
            Some("Group missing not found")
        );
    }
}
