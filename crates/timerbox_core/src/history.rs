//! Append-only record of completed runs.

use crate::model::{HistoryEntry, NewHistoryEntry, new_id};
use crate::storage::{HISTORY_KEY, KeyValueStore, load_collection, save_collection};
use std::sync::Arc;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryAction {
    Append(HistoryEntry),
    Clear,
    Replace(Vec<HistoryEntry>),
}

pub fn reduce_history(mut entries: Vec<HistoryEntry>, action: HistoryAction) -> Vec<HistoryEntry> {
    match action {
        HistoryAction::Append(entry) => {
            entries.push(entry);
            entries
        }
        HistoryAction::Clear => Vec::new(),
        HistoryAction::Replace(replacement) => replacement,
    }
}

/// Newest first. Unparseable timestamps sort last.
pub fn sort_by_recency(entries: &mut [HistoryEntry]) {
    entries.sort_by_key(|entry| {
        std::cmp::Reverse(OffsetDateTime::parse(&entry.completed_at, &Rfc3339).ok())
    });
}

pub struct HistoryCollection {
    entries: Vec<HistoryEntry>,
    store: Arc<dyn KeyValueStore>,
}

impl HistoryCollection {
    pub async fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let entries = load_collection(store.as_ref(), HISTORY_KEY).await;
        Self { entries, store }
    }

    /// In completion order.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn by_recency(&self) -> Vec<HistoryEntry> {
        let mut entries = self.entries.clone();
        sort_by_recency(&mut entries);
        entries
    }

    pub async fn append(&mut self, new_entry: NewHistoryEntry) -> HistoryEntry {
        let entry = new_entry.into_entry(new_id());
        info!(timer_id = %entry.timer_id, entry_id = %entry.id, "recorded completion");
        self.dispatch(HistoryAction::Append(entry.clone())).await;
        entry
    }

    pub async fn clear(&mut self) {
        info!(count = self.entries.len(), "clearing history");
        self.dispatch(HistoryAction::Clear).await;
    }

    pub async fn persist(&self) -> bool {
        save_collection(self.store.as_ref(), HISTORY_KEY, &self.entries).await
    }

    async fn dispatch(&mut self, action: HistoryAction) {
        let entries = std::mem::take(&mut self.entries);
        self.entries = reduce_history(entries, action);
        self.persist().await;
    }
}
