//! Linear undo/redo stacks over timeline snapshots.
//!
//! Entries are full copies of a tab's timeline, captured before each step
//! mutation. The stacks are bounded: once `depth` undo points exist, the
//! oldest is dropped on the next capture.

use crate::data::TimelineStep;

/// Default number of retained undo points
pub const DEFAULT_UNDO_DEPTH: usize = 50;

/// One undo point: the timeline of a tab as it was before a mutation
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    /// Tab the timeline was captured from; undo restores into this tab
    pub tab_id: String,
    pub timeline: Vec<TimelineStep>,
}

#[derive(Debug)]
pub struct HistoryManager {
    past: Vec<HistoryEntry>,
    future: Vec<HistoryEntry>,
    depth: usize,
}

impl HistoryManager {
    pub fn new(depth: usize) -> Self {
        Self {
            past: Vec::new(),
            future: Vec::new(),
            depth: depth.max(1),
        }
    }

    /// Record an undo point. Any redoable states are discarded.
    pub fn capture(&mut self, entry: HistoryEntry) {
        self.push_past(entry);
        self.future.clear();
    }

    /// Pop the most recent undo point, stashing `current` as the redo
    /// target. The caller installs the returned timeline.
    pub fn undo(&mut self, current: HistoryEntry) -> Option<HistoryEntry> {
        let previous = self.past.pop()?;
        self.future.push(current);
        Some(previous)
    }

    /// Pop the most recent redo point, stashing `current` as the undo
    /// target. The caller installs the returned timeline.
    pub fn redo(&mut self, current: HistoryEntry) -> Option<HistoryEntry> {
        let next = self.future.pop()?;
        self.push_past(current);
        Some(next)
    }

    /// Tab id of the state `undo` would restore, if any.
    pub fn undo_target_tab(&self) -> Option<&str> {
        self.past.last().map(|entry| entry.tab_id.as_str())
    }

    /// Tab id of the state `redo` would restore, if any.
    pub fn redo_target_tab(&self) -> Option<&str> {
        self.future.last().map(|entry| entry.tab_id.as_str())
    }

    /// The oldest retained undo point for a tab (its pre-edit timeline
    /// while the capture window has not rolled over).
    pub fn oldest_for_tab(&self, tab_id: &str) -> Option<&HistoryEntry> {
        self.past.iter().find(|entry| entry.tab_id == tab_id)
    }

    /// Drop every entry captured from the given tab, both stacks.
    pub fn purge_tab(&mut self, tab_id: &str) {
        self.past.retain(|entry| entry.tab_id != tab_id);
        self.future.retain(|entry| entry.tab_id != tab_id);
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    fn push_past(&mut self, entry: HistoryEntry) {
        self.past.push(entry);
        if self.past.len() > self.depth {
            self.past.remove(0);
        }
    }
}
