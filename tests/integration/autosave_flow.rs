//! Integration tests for durable autosave and reload recovery
//!
//! Uses an on-disk database in a temp directory so a second engine can
//! reopen the same medium, the way a page reload would.

use std::sync::Arc;
use std::time::Duration;

use routeline::remote::{MockPredictionClient, MockRoutingGroupClient};
use routeline::{
    EngineConfig, Persistence, ProductTab, RoutingCore, SaveGroupRequest, TimelineStep,
};
use tempfile::TempDir;

const DEBOUNCE: Duration = Duration::from_millis(40);

fn config_at(dir: &TempDir) -> EngineConfig {
    EngineConfig {
        persistence: Persistence::Path(dir.path().join("routeline.db")),
        autosave_debounce: DEBOUNCE,
        ..EngineConfig::default()
    }
}

fn fresh_core(config: EngineConfig) -> RoutingCore {
    RoutingCore::with_clients(
        config,
        Arc::new(MockRoutingGroupClient::new()),
        Arc::new(MockPredictionClient::new()),
    )
}

fn add_widget_tab(core: &RoutingCore) -> String {
    let mut tab = ProductTab::new("ITM-001", "Widget");
    tab.timeline = vec![TimelineStep::new("CUT")];
    let tab_id = tab.id.clone();
    core.add_tab(tab);
    tab_id
}

#[tokio::test]
async fn test_workspace_survives_reload() {
    let dir = TempDir::new().unwrap();

    // Session one: edit, wait out the quiet period, tear down.
    {
        let core = fresh_core(config_at(&dir));
        let tab_id = add_widget_tab(&core);
        core.insert_step(1, TimelineStep::new("WELD"));
        core.set_erp_required(true);

        tokio::time::sleep(DEBOUNCE * 4).await;
        core.shutdown();

        assert!(core.with_state(|s| s.tab(&tab_id).is_some()));
    }

    // Session two: the constructor restores the snapshot before anything
    // else happens.
    let core = fresh_core(config_at(&dir));
    core.with_state(|s| {
        assert_eq!(s.tabs().len(), 1);
        let tab = &s.tabs()[0];
        assert_eq!(tab.product_code, "ITM-001");
        assert_eq!(tab.timeline.len(), 2);
        assert_eq!(tab.timeline[1].process_code, "WELD");
        assert!(s.erp_required());
        assert!(s.is_dirty());
    });

    let restore = core
        .audit()
        .queue()
        .entries()
        .into_iter()
        .find(|entry| entry.action == "routing.snapshot.restore");
    assert!(restore.is_some());

    core.shutdown();
}

#[tokio::test]
async fn test_shutdown_before_quiet_period_writes_nothing() {
    let dir = TempDir::new().unwrap();

    {
        let core = fresh_core(config_at(&dir));
        add_widget_tab(&core);
        core.shutdown();
        tokio::time::sleep(DEBOUNCE * 4).await;
    }

    let core = fresh_core(config_at(&dir));
    assert_eq!(core.with_state(|s| s.tabs().len()), 0);
    core.shutdown();
}

#[tokio::test]
async fn test_snapshot_retention_only_keeps_latest_five() {
    let dir = TempDir::new().unwrap();
    let core = fresh_core(config_at(&dir));
    add_widget_tab(&core);

    for i in 0..8 {
        core.insert_step(0, TimelineStep::new(format!("OP{i}")));
        core.flush_snapshot().await;
    }

    // Reopen the medium directly and count retained snapshots.
    let db = routeline::Database::open(dir.path().join("routeline.db")).unwrap();
    let snapshots: routeline::DurableRecordStore<routeline::WorkspaceSnapshot> =
        routeline::DurableRecordStore::new(Some(&db), "workspace_snapshots", 5);
    assert_eq!(snapshots.count(), 5);

    let latest = snapshots.read_latest().unwrap();
    assert_eq!(latest.state.tabs[0].timeline.len(), 9);

    core.shutdown();
}

#[tokio::test]
async fn test_checkpoints_ride_along_in_snapshots() {
    let dir = TempDir::new().unwrap();

    {
        let core = fresh_core(config_at(&dir));
        let tab_id = add_widget_tab(&core);
        let outcome = core
            .save_group(SaveGroupRequest {
                tab_id: tab_id.clone(),
                group_name: "Line A".to_string(),
                metadata: None,
            })
            .await;
        assert!(outcome.ok);
        core.flush_snapshot().await;
        core.shutdown();
    }

    let core = fresh_core(config_at(&dir));
    core.with_state(|s| {
        let tab_id = s.tabs()[0].id.clone();
        assert!(s.checkpoint(&tab_id).is_some());
        assert!(s.active_group().is_some());
        assert!(!s.is_dirty());
    });
    core.shutdown();
}
