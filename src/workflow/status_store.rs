// src/workflow/status_store.rs
//! Shared state read by the panel and written by the workflow coordinator.
//!
//! The store is a cheap cloneable handle. The app inserts one as a Bevy resource;
//! tests build their own isolated instances.

use bevy::log::debug;
use bevy::prelude::Resource;
use chrono::{DateTime, Local};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::models::{ItemMeta, PreviewTable, StatusInfo};

pub const STATUS_HISTORY_LIMIT: usize = 50;

#[derive(Debug, Clone)]
pub struct StatusEntry {
    pub at: DateTime<Local>,
    pub status: StatusInfo,
}

#[derive(Debug, Default)]
pub struct StatusSnapshot {
    pub loading: bool,
    pub status: StatusInfo,
    pub item_meta: Vec<ItemMeta>,
    pub preview: Option<PreviewTable>,
    /// Oldest first, capped at `STATUS_HISTORY_LIMIT`.
    pub history: VecDeque<StatusEntry>,
    /// Bumped on every status write.
    pub revision: u64,
}

fn write_status(state: &mut StatusSnapshot, status: StatusInfo) {
    debug!("Status -> {:?}: {}", status.kind, status.message);
    state.revision += 1;
    if state.history.len() == STATUS_HISTORY_LIMIT {
        state.history.pop_front();
    }
    state.history.push_back(StatusEntry {
        at: Local::now(),
        status: status.clone(),
    });
    state.status = status;
}

#[derive(Resource, Debug, Clone, Default)]
pub struct StatusStore {
    inner: Arc<Mutex<StatusSnapshot>>,
}

impl StatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Setters must never fail, so a poisoned lock is recovered rather than propagated.
    fn lock(&self) -> MutexGuard<'_, StatusSnapshot> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Borrow the whole snapshot for the duration of `f` (used by the per-frame UI).
    pub fn read<R>(&self, f: impl FnOnce(&StatusSnapshot) -> R) -> R {
        let guard = self.lock();
        f(&guard)
    }

    pub fn get(&self) -> StatusInfo {
        self.lock().status.clone()
    }

    pub fn set(&self, status: StatusInfo) {
        write_status(&mut self.lock(), status);
    }

    pub fn revision(&self) -> u64 {
        self.lock().revision
    }

    /// Write `status` only if nothing else was written since `revision`.
    pub fn replace_if_unchanged(&self, revision: u64, status: StatusInfo) -> bool {
        let mut state = self.lock();
        if state.revision != revision {
            return false;
        }
        write_status(&mut state, status);
        true
    }

    pub fn history(&self) -> Vec<StatusEntry> {
        self.lock().history.iter().cloned().collect()
    }

    pub fn set_loading(&self, loading: bool) {
        self.lock().loading = loading;
    }

    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    pub fn set_item_metadata(&self, items: Vec<ItemMeta>) {
        self.lock().item_meta = items;
    }

    pub fn clear_item_metadata(&self) {
        self.lock().item_meta.clear();
    }

    pub fn item_metadata(&self) -> Vec<ItemMeta> {
        self.lock().item_meta.clone()
    }

    pub fn item_count(&self) -> usize {
        self.lock().item_meta.len()
    }

    pub fn set_preview(&self, preview: PreviewTable) {
        self.lock().preview = Some(preview);
    }

    pub fn clear_preview(&self) {
        self.lock().preview = None;
    }

    pub fn preview(&self) -> Option<PreviewTable> {
        self.lock().preview.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::models::{ItemTable, StatusKind};

    fn item(code: &str) -> ItemMeta {
        ItemMeta {
            code: code.to_string(),
            size_code: "01".to_string(),
            table: ItemTable::default(),
        }
    }

    #[test]
    fn starts_empty_and_idle() {
        let store = StatusStore::new();
        assert!(!store.is_loading());
        assert_eq!(store.get(), StatusInfo::default());
        assert_eq!(store.get().kind, StatusKind::Normal);
        assert!(store.item_metadata().is_empty());
        assert!(store.preview().is_none());
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn set_overwrites_and_records_history() {
        let store = StatusStore::new();
        store.set(StatusInfo::normal("parsing"));
        store.set(StatusInfo::error("invalid format"));

        assert_eq!(store.get(), StatusInfo::error("invalid format"));
        assert_eq!(store.revision(), 2);
        let history = store.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].status.message, "parsing");
        assert_eq!(history[1].status.message, "invalid format");
    }

    #[test]
    fn history_is_bounded() {
        let store = StatusStore::new();
        for i in 0..(STATUS_HISTORY_LIMIT + 7) {
            store.set(StatusInfo::normal(format!("step {i}")));
        }
        let history = store.history();
        assert_eq!(history.len(), STATUS_HISTORY_LIMIT);
        assert_eq!(history[0].status.message, "step 7");
    }

    #[test]
    fn conditional_replace_respects_newer_writes() {
        let store = StatusStore::new();
        store.set(StatusInfo::normal("exported 3 tables"));
        let revision = store.revision();

        store.set(StatusInfo::normal("parsing"));
        assert!(!store.replace_if_unchanged(revision, StatusInfo::done()));
        assert_eq!(store.get().message, "parsing");

        assert!(store.replace_if_unchanged(store.revision(), StatusInfo::done()));
        assert_eq!(store.get(), StatusInfo::done());
    }

    #[test]
    fn items_are_replaced_wholesale_and_cleared() {
        let store = StatusStore::new();
        store.set_item_metadata(vec![item("A"), item("B")]);
        store.set_item_metadata(vec![item("C")]);
        assert_eq!(store.item_metadata(), vec![item("C")]);

        store.clear_item_metadata();
        assert_eq!(store.item_count(), 0);
    }

    #[test]
    fn clones_share_state() {
        let store = StatusStore::new();
        let reader = store.clone();
        store.set_loading(true);
        assert!(reader.is_loading());
        let loading = reader.read(|snapshot| snapshot.loading);
        assert!(loading);
    }

    #[test]
    fn poisoned_lock_does_not_break_setters() {
        let store = StatusStore::new();
        let poisoner = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.inner.lock().unwrap();
            panic!("poison the store");
        })
        .join();

        store.set_loading(true);
        store.set(StatusInfo::normal("still works"));
        assert!(store.is_loading());
        assert_eq!(store.get().message, "still works");
    }
}
