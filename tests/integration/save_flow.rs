//! Integration tests for the edit → save → rollback flow
//!
//! Drives a full engine (mock remote clients, in-memory durable medium)
//! through recommendation loading, step edits, undo, and optimistic saves.

use std::sync::Arc;
use std::time::Duration;

use routeline::{
    EngineConfig, Persistence, PredictRequest, RoutingCore, SaveGroupRequest, TimelineStep,
};
use routeline::remote::{MockPredictionClient, MockRoutingGroupClient, PredictedItem, PredictedOperation};

fn test_config() -> EngineConfig {
    EngineConfig {
        persistence: Persistence::InMemory,
        autosave_debounce: Duration::from_millis(40),
        ..EngineConfig::default()
    }
}

fn recommended_item() -> PredictedItem {
    PredictedItem {
        item_code: "ITM-001".to_string(),
        candidate_id: Some("cand-1".to_string()),
        operations: vec![
            PredictedOperation {
                proc_seq: 10,
                proc_code: "CUT".to_string(),
                proc_desc: Some("Cut stock".to_string()),
                setup_time: Some(4.0),
                run_time: Some(9.0),
                wait_time: None,
            },
            PredictedOperation {
                proc_seq: 20,
                proc_code: "WELD".to_string(),
                proc_desc: None,
                setup_time: None,
                run_time: Some(12.0),
                wait_time: Some(3.0),
            },
        ],
    }
}

async fn seeded_core(groups: MockRoutingGroupClient) -> (RoutingCore, String) {
    let prediction = MockPredictionClient::new().with_items(vec![recommended_item()]);
    let core = RoutingCore::with_clients(test_config(), Arc::new(groups), Arc::new(prediction));

    core.load_recommendations(PredictRequest::new(vec!["ITM-001".to_string()]))
        .await
        .unwrap();
    let tab_id = core.with_state(|s| s.active_tab_id().unwrap().to_string());
    (core, tab_id)
}

#[tokio::test]
async fn test_edit_save_then_failed_save_rolls_back() {
    let groups = MockRoutingGroupClient::new(); // first save succeeds
    let (core, tab_id) = seeded_core(groups.clone()).await;

    // First save confirms the two recommended steps as the checkpoint.
    let outcome = core
        .save_group(SaveGroupRequest {
            tab_id: tab_id.clone(),
            group_name: "Line A".to_string(),
            metadata: None,
        })
        .await;
    assert!(outcome.ok);
    let saved_timeline =
        core.with_state(|s| s.tab(&tab_id).unwrap().timeline.clone());

    // Edit past the checkpoint, then fail the next save.
    core.insert_step(2, TimelineStep::new("PACK"));
    assert_eq!(core.with_state(|s| s.tab(&tab_id).unwrap().timeline.len()), 3);

    let groups = groups.failing();
    let outcome = core
        .save_group(SaveGroupRequest {
            tab_id: tab_id.clone(),
            group_name: "Line A".to_string(),
            metadata: None,
        })
        .await;
    assert!(!outcome.ok);
    assert!(outcome.message.is_some());
    assert_eq!(groups.create_call_count(), 2);

    // The rolled-back timeline is exactly the last confirmed one.
    let timeline = core.with_state(|s| s.tab(&tab_id).unwrap().timeline.clone());
    assert_eq!(timeline, saved_timeline);

    core.shutdown();
}

#[tokio::test]
async fn test_validation_failures_never_reach_the_network() {
    let groups = MockRoutingGroupClient::new();
    let (core, tab_id) = seeded_core(groups.clone()).await;

    let outcome = core
        .save_group(SaveGroupRequest {
            tab_id: tab_id.clone(),
            group_name: "   ".to_string(),
            metadata: None,
        })
        .await;
    assert!(!outcome.ok);
    assert_eq!(outcome.message.as_deref(), Some("Enter a group name."));
    assert_eq!(groups.create_call_count(), 0);

    core.shutdown();
}

#[tokio::test]
async fn test_undo_redo_round_trip_after_loading() {
    let (core, tab_id) = seeded_core(MockRoutingGroupClient::new()).await;

    let loaded = core.with_state(|s| s.tab(&tab_id).unwrap().timeline.clone());
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[0].process_code, "CUT");

    core.insert_step(2, TimelineStep::new("PACK"));
    let edited = core.with_state(|s| s.tab(&tab_id).unwrap().timeline.clone());

    assert!(core.undo());
    assert_eq!(
        core.with_state(|s| s.tab(&tab_id).unwrap().timeline.clone()),
        loaded
    );

    assert!(core.redo());
    assert_eq!(
        core.with_state(|s| s.tab(&tab_id).unwrap().timeline.clone()),
        edited
    );

    core.shutdown();
}

#[tokio::test]
async fn test_save_payload_reflects_current_sequence() {
    let groups = MockRoutingGroupClient::new();
    let (core, tab_id) = seeded_core(groups.clone()).await;

    // Move WELD ahead of CUT before saving.
    let weld_id = core.with_state(|s| s.tab(&tab_id).unwrap().timeline[1].id.clone());
    assert!(core.move_step(&weld_id, 0));

    let outcome = core
        .save_group(SaveGroupRequest {
            tab_id,
            group_name: "Line A".to_string(),
            metadata: Some(serde_json::json!({"revision": "B"})),
        })
        .await;
    assert!(outcome.ok);

    let calls = groups.create_calls();
    assert_eq!(calls.len(), 1);
    let steps = &calls[0].steps;
    assert_eq!(steps[0].process_code, "WELD");
    assert_eq!(steps[0].seq, 1);
    assert_eq!(steps[1].process_code, "CUT");
    assert_eq!(steps[1].seq, 2);
    // run_time travels as duration_min.
    assert_eq!(steps[0].duration_min, Some(12.0));
    assert_eq!(calls[0].metadata, Some(serde_json::json!({"revision": "B"})));

    core.shutdown();
}
