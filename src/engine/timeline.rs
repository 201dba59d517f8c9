//! In-memory workspace state: product tabs, the editable step timeline,
//! and the session flags that ride along with it.
//!
//! All mutations are synchronous and run to completion under the owning
//! lock. Step-level mutations capture an undo point before applying, then
//! renumber `seq` so it always reads `1..N`. Mutations aimed at ids that no
//! longer exist return `false` instead of panicking, so a stale UI event
//! cannot take the engine down.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use super::history::{HistoryEntry, HistoryManager};
use crate::data::{GroupIdentity, ProductTab, StepLink, TimelineStep, WorkspaceState};
use crate::remote::PredictedItem;

pub struct TimelineStore {
    tabs: Vec<ProductTab>,
    active_tab_id: Option<String>,
    active_group: Option<GroupIdentity>,
    checkpoints: HashMap<String, Vec<TimelineStep>>,
    erp_required: bool,
    dirty: bool,
    last_saved_at: Option<DateTime<Utc>>,
    history: HistoryManager,
}

impl TimelineStore {
    pub fn new(undo_depth: usize) -> Self {
        Self {
            tabs: Vec::new(),
            active_tab_id: None,
            active_group: None,
            checkpoints: HashMap::new(),
            erp_required: false,
            dirty: false,
            last_saved_at: None,
            history: HistoryManager::new(undo_depth),
        }
    }

    // --- session loading -------------------------------------------------

    /// Replace all tabs from a prediction response. Steps are ordered by
    /// ascending source sequence number and renumbered `1..N`. History and
    /// checkpoints from the previous session are discarded.
    pub fn load_recommendations(&mut self, items: &[PredictedItem]) {
        self.tabs = items
            .iter()
            .map(|item| {
                let mut tab = ProductTab::new(&item.item_code, &item.item_code);
                tab.candidate_id = item.candidate_id.clone();

                let mut operations = item.operations.clone();
                operations.sort_by_key(|op| op.proc_seq);

                tab.timeline = operations
                    .into_iter()
                    .map(|op| {
                        let mut step = TimelineStep::new(op.proc_code);
                        step.description = op.proc_desc;
                        step.setup_time = op.setup_time;
                        step.run_time = op.run_time;
                        step.wait_time = op.wait_time;
                        step.item_code = Some(item.item_code.clone());
                        step.candidate_id = item.candidate_id.clone();
                        step
                    })
                    .collect();
                renumber(&mut tab.timeline);
                tab
            })
            .collect();

        self.active_tab_id = self.tabs.first().map(|tab| tab.id.clone());
        self.active_group = None;
        self.checkpoints.clear();
        self.history.clear();
        self.dirty = false;
        self.last_saved_at = None;
    }

    // --- tab management --------------------------------------------------

    /// Add a tab and make it active.
    pub fn add_tab(&mut self, tab: ProductTab) {
        self.active_tab_id = Some(tab.id.clone());
        self.tabs.push(tab);
        self.dirty = true;
    }

    /// Remove a tab. Removing the active tab selects the most recently
    /// remaining tab, or none.
    pub fn remove_tab(&mut self, tab_id: &str) -> bool {
        let Some(index) = self.tab_index(tab_id) else {
            return false;
        };
        self.tabs.remove(index);
        self.checkpoints.remove(tab_id);
        self.history.purge_tab(tab_id);

        if self.active_tab_id.as_deref() == Some(tab_id) {
            self.active_tab_id = self.tabs.last().map(|tab| tab.id.clone());
        }
        self.dirty = true;
        true
    }

    pub fn set_active_tab(&mut self, tab_id: &str) -> bool {
        if self.tab_index(tab_id).is_none() {
            return false;
        }
        self.active_tab_id = Some(tab_id.to_string());
        true
    }

    // --- step mutations (active tab) -------------------------------------

    /// Insert a step at the given zero-based index (clamped to the end) of
    /// the active timeline.
    pub fn insert_step(&mut self, position: usize, step: TimelineStep) -> bool {
        let Some(index) = self.active_index() else {
            return false;
        };
        self.capture_active(index);

        let timeline = &mut self.tabs[index].timeline;
        let position = position.min(timeline.len());
        timeline.insert(position, step);
        renumber(timeline);
        self.dirty = true;
        true
    }

    /// Remove a step by id from the active timeline.
    pub fn remove_step(&mut self, step_id: &str) -> bool {
        let Some(index) = self.active_index() else {
            return false;
        };
        let Some(step_index) = self.tabs[index]
            .timeline
            .iter()
            .position(|step| step.id == step_id)
        else {
            return false;
        };
        self.capture_active(index);

        let timeline = &mut self.tabs[index].timeline;
        timeline.remove(step_index);
        renumber(timeline);
        self.dirty = true;
        true
    }

    /// Move a step to a new zero-based index. Array-move semantics: the
    /// step is removed at its old index and reinserted at the new one,
    /// preserving the relative order of every other step.
    pub fn move_step(&mut self, step_id: &str, new_position: usize) -> bool {
        let Some(index) = self.active_index() else {
            return false;
        };
        let Some(old_position) = self.tabs[index]
            .timeline
            .iter()
            .position(|step| step.id == step_id)
        else {
            return false;
        };
        let new_position = new_position.min(self.tabs[index].timeline.len() - 1);
        if new_position == old_position {
            return false;
        }
        self.capture_active(index);

        let timeline = &mut self.tabs[index].timeline;
        let step = timeline.remove(old_position);
        timeline.insert(new_position, step);
        renumber(timeline);
        self.dirty = true;
        true
    }

    /// Attach a connection to the active tab.
    pub fn add_link(&mut self, link: StepLink) -> bool {
        let Some(index) = self.active_index() else {
            return false;
        };
        self.tabs[index].links.push(link);
        self.dirty = true;
        true
    }

    /// Session-scoped ERP export flag; no other side effects.
    pub fn set_erp_required(&mut self, erp_required: bool) -> bool {
        if self.erp_required == erp_required {
            return false;
        }
        self.erp_required = erp_required;
        true
    }

    // --- undo / redo ------------------------------------------------------

    pub fn undo(&mut self) -> bool {
        let Some(tab_id) = self.history.undo_target_tab().map(str::to_string) else {
            return false;
        };
        let Some(index) = self.tab_index(&tab_id) else {
            self.history.purge_tab(&tab_id);
            return false;
        };
        let current = HistoryEntry {
            tab_id: tab_id.clone(),
            timeline: self.tabs[index].timeline.clone(),
        };
        let Some(previous) = self.history.undo(current) else {
            return false;
        };
        self.tabs[index].timeline = previous.timeline;
        self.dirty = true;
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(tab_id) = self.history.redo_target_tab().map(str::to_string) else {
            return false;
        };
        let Some(index) = self.tab_index(&tab_id) else {
            self.history.purge_tab(&tab_id);
            return false;
        };
        let current = HistoryEntry {
            tab_id: tab_id.clone(),
            timeline: self.tabs[index].timeline.clone(),
        };
        let Some(next) = self.history.redo(current) else {
            return false;
        };
        self.tabs[index].timeline = next.timeline;
        self.dirty = true;
        true
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // --- save reconciliation hooks ---------------------------------------

    /// Copy the tab's current timeline into its checkpoint. Called only
    /// after the remote service confirmed the save.
    pub fn capture_last_success(&mut self, tab_id: &str) -> bool {
        let Some(index) = self.tab_index(tab_id) else {
            return false;
        };
        self.checkpoints
            .insert(tab_id.to_string(), self.tabs[index].timeline.clone());
        true
    }

    /// Restore the tab's timeline from its checkpoint, or from the oldest
    /// retained undo point (the pre-edit timeline) when the tab was never
    /// saved. The dirty flag is left alone: the workspace is still
    /// unsaved remotely.
    pub fn rollback_to_last_success(&mut self, tab_id: &str) -> bool {
        let Some(index) = self.tab_index(tab_id) else {
            return false;
        };
        let restored = if let Some(checkpoint) = self.checkpoints.get(tab_id) {
            checkpoint.clone()
        } else if let Some(entry) = self.history.oldest_for_tab(tab_id) {
            entry.timeline.clone()
        } else {
            return false;
        };
        self.tabs[index].timeline = restored;
        true
    }

    /// Record a confirmed remote save.
    pub fn mark_saved(&mut self, identity: GroupIdentity) {
        self.active_group = Some(identity);
        self.dirty = false;
        self.last_saved_at = Some(Utc::now());
    }

    /// Replace the active tab's timeline wholesale (remote group load).
    /// Returns the tab id the timeline was installed into.
    pub fn replace_active_timeline(&mut self, mut steps: Vec<TimelineStep>) -> Option<String> {
        let index = self.active_index()?;
        renumber(&mut steps);
        let tab_id = self.tabs[index].id.clone();
        self.history.purge_tab(&tab_id);
        self.tabs[index].timeline = steps;
        Some(tab_id)
    }

    // --- snapshots --------------------------------------------------------

    /// Serializable subset of the workspace, for durable snapshots.
    pub fn snapshot_state(&self) -> WorkspaceState {
        WorkspaceState {
            tabs: self.tabs.clone(),
            active_tab_id: self.active_tab_id.clone(),
            active_group: self.active_group.clone(),
            checkpoints: self.checkpoints.clone(),
            erp_required: self.erp_required,
            dirty: self.dirty,
            last_saved_at: self.last_saved_at,
        }
    }

    /// Install a previously snapshotted state. Undo history does not
    /// survive a restore.
    pub fn restore(&mut self, state: WorkspaceState) {
        self.tabs = state.tabs;
        self.active_tab_id = state.active_tab_id;
        self.active_group = state.active_group;
        self.checkpoints = state.checkpoints;
        self.erp_required = state.erp_required;
        self.dirty = state.dirty;
        self.last_saved_at = state.last_saved_at;
        self.history.clear();
    }

    // --- accessors --------------------------------------------------------

    pub fn tabs(&self) -> &[ProductTab] {
        &self.tabs
    }

    pub fn tab(&self, tab_id: &str) -> Option<&ProductTab> {
        self.tabs.iter().find(|tab| tab.id == tab_id)
    }

    pub fn active_tab(&self) -> Option<&ProductTab> {
        self.active_index().map(|index| &self.tabs[index])
    }

    pub fn active_tab_id(&self) -> Option<&str> {
        self.active_tab_id.as_deref()
    }

    pub fn active_group(&self) -> Option<&GroupIdentity> {
        self.active_group.as_ref()
    }

    pub fn checkpoint(&self, tab_id: &str) -> Option<&[TimelineStep]> {
        self.checkpoints.get(tab_id).map(Vec::as_slice)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn erp_required(&self) -> bool {
        self.erp_required
    }

    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.last_saved_at
    }

    fn tab_index(&self, tab_id: &str) -> Option<usize> {
        self.tabs.iter().position(|tab| tab.id == tab_id)
    }

    fn active_index(&self) -> Option<usize> {
        let active_tab_id = self.active_tab_id.as_deref()?;
        self.tab_index(active_tab_id)
    }

    fn capture_active(&mut self, index: usize) {
        self.history.capture(HistoryEntry {
            tab_id: self.tabs[index].id.clone(),
            timeline: self.tabs[index].timeline.clone(),
        });
    }
}

/// Reassign `seq` so it reads `1..N` in array order.
fn renumber(timeline: &mut [TimelineStep]) {
    for (index, step) in timeline.iter_mut().enumerate() {
        step.seq = (index + 1) as u32;
    }
}
