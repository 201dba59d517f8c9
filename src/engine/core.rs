//! Engine facade: builds the object graph from a configuration and exposes
//! the mutation entry points that keep the autosave scheduler informed.
//!
//! Everything is owned by this struct; there is no module-level state.
//! Tests construct a fresh engine (usually via [`RoutingCore::with_clients`]
//! and mock API clients) per test.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::warn;

use super::audit::AuditTrail;
use super::autosave::AutosaveScheduler;
use super::reconciler::{SaveGroupRequest, SaveOutcome, SaveReconciler};
use super::timeline::TimelineStore;
use crate::config::{EngineConfig, Persistence};
use crate::data::{
    AuditQueue, Database, DurableRecordStore, ProductTab, StepLink, TimelineStep,
    WorkspaceSnapshot,
};
use crate::remote::{
    HttpPredictionClient, HttpRoutingGroupClient, PredictRequest, PredictResponse, PredictionApi,
    RemoteError, RoutingGroupApi, UiAuditClient,
};

pub struct RoutingCore {
    config: EngineConfig,
    /// Owned to keep the shared connection alive
    _database: Option<Database>,
    state: Arc<Mutex<TimelineStore>>,
    autosave: AutosaveScheduler,
    reconciler: SaveReconciler,
    prediction: Arc<dyn PredictionApi>,
    audit: AuditTrail,
}

impl RoutingCore {
    /// Build an engine with HTTP clients from the configuration.
    pub fn new(config: EngineConfig) -> Self {
        let groups: Arc<dyn RoutingGroupApi> = Arc::new(HttpRoutingGroupClient::new(
            config.routing_api_base_url.clone(),
            config.request_timeout,
        ));
        let prediction: Arc<dyn PredictionApi> = Arc::new(HttpPredictionClient::new(
            config.prediction_base_url.clone(),
            config.request_timeout,
        ));
        Self::with_clients(config, groups, prediction)
    }

    /// Build an engine with explicit API clients (the seam tests use).
    pub fn with_clients(
        config: EngineConfig,
        groups: Arc<dyn RoutingGroupApi>,
        prediction: Arc<dyn PredictionApi>,
    ) -> Self {
        let opened = match &config.persistence {
            Persistence::DefaultPath => Some(Database::open_default()),
            Persistence::Path(path) => Some(Database::open(path.clone())),
            Persistence::InMemory => Some(Database::open_in_memory()),
            Persistence::Disabled => None,
        };
        let database = match opened {
            Some(Ok(db)) => Some(db),
            Some(Err(err)) => {
                warn!(error = %err, "Failed to open database; continuing without durability");
                None
            }
            None => None,
        };

        let snapshots: DurableRecordStore<WorkspaceSnapshot> = DurableRecordStore::new(
            database.as_ref(),
            "workspace_snapshots",
            config.snapshot_retention,
        );
        let remote_audit = config.audit_api_base_url.as_ref().map(|base_url| {
            Arc::new(UiAuditClient::new(
                base_url.clone(),
                config.username.clone(),
                config.request_timeout,
            ))
        });
        let audit = AuditTrail::new(
            AuditQueue::with_retention(database.as_ref(), config.audit_retention),
            remote_audit,
        );

        let state = Arc::new(Mutex::new(TimelineStore::new(config.undo_depth)));
        let autosave = AutosaveScheduler::start(
            state.clone(),
            snapshots,
            audit.clone(),
            config.autosave_debounce,
        );
        let reconciler = SaveReconciler::new(state.clone(), groups, audit.clone());

        Self {
            config,
            _database: database,
            state,
            autosave,
            reconciler,
            prediction,
            audit,
        }
    }

    // --- recommendations --------------------------------------------------

    /// Fetch recommendations and seed the workspace from them.
    pub async fn load_recommendations(
        &self,
        request: PredictRequest,
    ) -> Result<PredictResponse, RemoteError> {
        let response = self.prediction.predict(&request).await?;
        self.state.lock().load_recommendations(&response.items);
        self.autosave.notify_mutation();
        Ok(response)
    }

    // --- mutations (autosave-aware) ---------------------------------------

    pub fn add_tab(&self, tab: ProductTab) {
        self.state.lock().add_tab(tab);
        self.autosave.notify_mutation();
    }

    pub fn remove_tab(&self, tab_id: &str) -> bool {
        let changed = self.state.lock().remove_tab(tab_id);
        if changed {
            self.autosave.notify_mutation();
        }
        changed
    }

    pub fn set_active_tab(&self, tab_id: &str) -> bool {
        let changed = self.state.lock().set_active_tab(tab_id);
        if changed {
            self.autosave.notify_mutation();
        }
        changed
    }

    pub fn insert_step(&self, position: usize, step: TimelineStep) -> bool {
        let changed = self.state.lock().insert_step(position, step);
        if changed {
            self.autosave.notify_mutation();
        }
        changed
    }

    pub fn remove_step(&self, step_id: &str) -> bool {
        let changed = self.state.lock().remove_step(step_id);
        if changed {
            self.autosave.notify_mutation();
        }
        changed
    }

    pub fn move_step(&self, step_id: &str, new_position: usize) -> bool {
        let changed = self.state.lock().move_step(step_id, new_position);
        if changed {
            self.autosave.notify_mutation();
        }
        changed
    }

    pub fn add_link(&self, link: StepLink) -> bool {
        let changed = self.state.lock().add_link(link);
        if changed {
            self.autosave.notify_mutation();
        }
        changed
    }

    pub fn set_erp_required(&self, erp_required: bool) -> bool {
        let changed = self.state.lock().set_erp_required(erp_required);
        if changed {
            self.autosave.notify_mutation();
        }
        changed
    }

    pub fn undo(&self) -> bool {
        let changed = self.state.lock().undo();
        if changed {
            self.autosave.notify_mutation();
        }
        changed
    }

    pub fn redo(&self) -> bool {
        let changed = self.state.lock().redo();
        if changed {
            self.autosave.notify_mutation();
        }
        changed
    }

    // --- remote save/load -------------------------------------------------

    pub async fn save_group(&self, request: SaveGroupRequest) -> SaveOutcome {
        let outcome = self.reconciler.save_group(request).await;
        // Both outcomes change snapshot-worthy state (checkpoint or
        // rolled-back timeline).
        self.autosave.notify_mutation();
        outcome
    }

    pub async fn load_group(&self, group_id: &str) -> SaveOutcome {
        let outcome = self.reconciler.load_group(group_id).await;
        if outcome.ok {
            self.autosave.notify_mutation();
        }
        outcome
    }

    // --- access & teardown ------------------------------------------------

    /// Read a view of the workspace state.
    pub fn with_state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&TimelineStore) -> T,
    {
        f(&self.state.lock())
    }

    pub fn state(&self) -> Arc<Mutex<TimelineStore>> {
        self.state.clone()
    }

    pub fn audit(&self) -> &AuditTrail {
        &self.audit
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Flush a snapshot immediately (explicit host-driven save point).
    pub async fn flush_snapshot(&self) {
        self.autosave.flush_now().await;
    }

    /// Cancel pending autosave work. Call on session end.
    pub fn shutdown(&self) {
        self.autosave.shutdown();
    }
}
