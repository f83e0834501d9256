//! The ordered timer collection and its persistence.

use crate::model::{NewTimer, Timer, TimerPatch, TimerStatus, new_id};
use crate::storage::{KeyValueStore, TIMERS_KEY, load_collection, save_collection};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerAction {
    Add(Timer),
    Update(TimerPatch),
    Delete(String),
    Replace(Vec<Timer>),
}

/// Applies one action to the collection. Unknown ids leave it unchanged.
pub fn reduce_timers(mut timers: Vec<Timer>, action: TimerAction) -> Vec<Timer> {
    match action {
        TimerAction::Add(timer) => {
            timers.push(timer);
            timers
        }
        TimerAction::Update(patch) => {
            if let Some(timer) = timers.iter_mut().find(|timer| timer.id == patch.id) {
                patch.apply_to(timer);
            }
            timers
        }
        TimerAction::Delete(id) => {
            timers.retain(|timer| timer.id != id);
            timers
        }
        TimerAction::Replace(replacement) => replacement,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryGroup {
    pub category: String,
    pub timers: Vec<Timer>,
}

/// Groups timers by category in order of first appearance. With a filter,
/// only the matching category is returned.
pub fn group_by_category(timers: &[Timer], filter: Option<&str>) -> Vec<CategoryGroup> {
    let mut groups: Vec<CategoryGroup> = Vec::new();
    for timer in timers {
        if filter.is_some_and(|category| category != timer.category) {
            continue;
        }
        match groups
            .iter_mut()
            .find(|group| group.category == timer.category)
        {
            Some(group) => group.timers.push(timer.clone()),
            None => groups.push(CategoryGroup {
                category: timer.category.clone(),
                timers: vec![timer.clone()],
            }),
        }
    }
    groups
}

pub struct TimerCollection {
    timers: Vec<Timer>,
    store: Arc<dyn KeyValueStore>,
}

impl TimerCollection {
    /// Rehydrates from the store. Timers saved while running come back
    /// paused with their remaining time intact.
    pub async fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let mut timers: Vec<Timer> = load_collection(store.as_ref(), TIMERS_KEY).await;
        for timer in timers.iter_mut().filter(|timer| timer.is_running()) {
            debug!(timer_id = %timer.id, remaining = timer.remaining, "pausing timer left running");
            timer.status = TimerStatus::Paused;
        }
        Self { timers, store }
    }

    pub fn list(&self) -> &[Timer] {
        &self.timers
    }

    pub fn get(&self, id: &str) -> Option<&Timer> {
        self.timers.iter().find(|timer| timer.id == id)
    }

    /// Exact id match, else the single timer whose id starts with `needle`.
    pub fn resolve(&self, needle: &str) -> Option<&Timer> {
        let needle = needle.trim();
        if needle.is_empty() {
            return None;
        }
        if let Some(timer) = self.get(needle) {
            return Some(timer);
        }

        let mut matches = self.timers.iter().filter(|timer| timer.id.starts_with(needle));
        let first = matches.next()?;
        match matches.next() {
            Some(_) => None,
            None => Some(first),
        }
    }

    pub async fn add(&mut self, new_timer: NewTimer) -> Timer {
        let timer = new_timer.into_timer(new_id());
        info!(timer_id = %timer.id, name = %timer.name, "added timer");
        self.dispatch(TimerAction::Add(timer.clone())).await;
        timer
    }

    /// Merges `patch` over the matching timer. `None` when the id is unknown.
    pub async fn update(&mut self, patch: TimerPatch) -> Option<Timer> {
        let id = patch.id.clone();
        self.get(&id)?;
        self.dispatch(TimerAction::Update(patch)).await;
        self.get(&id).cloned()
    }

    pub async fn delete(&mut self, id: &str) -> Option<Timer> {
        let removed = self.get(id).cloned()?;
        info!(timer_id = %id, "deleted timer");
        self.dispatch(TimerAction::Delete(id.to_string())).await;
        Some(removed)
    }

    pub async fn persist(&self) -> bool {
        save_collection(self.store.as_ref(), TIMERS_KEY, &self.timers).await
    }

    async fn dispatch(&mut self, action: TimerAction) {
        let timers = std::mem::take(&mut self.timers);
        self.timers = reduce_timers(timers, action);
        self.persist().await;
    }
}

#[cfg(test)]
mod tests {
    use super::{TimerAction, TimerCollection, group_by_category, reduce_timers};
    use crate::model::{NewTimer, Timer, TimerPatch, TimerStatus};
    use crate::storage::tests::BrokenStore;
    use crate::storage::{KeyValueStore, MemoryStore, TIMERS_KEY, save_collection};
    use std::sync::Arc;

    fn timer(id: &str, name: &str, category: &str) -> Timer {
        NewTimer {
            name: name.to_string(),
            duration: 60,
            category: category.to_string(),
            halfway_alert: false,
        }
        .into_timer(id.to_string())
    }

    fn new_timer(name: &str, duration: u64, category: &str) -> NewTimer {
        NewTimer {
            name: name.to_string(),
            duration,
            category: category.to_string(),
            halfway_alert: false,
        }
    }

    #[test]
    fn reduce_appends_in_order() {
        let timers = reduce_timers(Vec::new(), TimerAction::Add(timer("a", "One", "X")));
        let timers = reduce_timers(timers, TimerAction::Add(timer("b", "Two", "X")));

        let ids: Vec<_> = timers.iter().map(|timer| timer.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn reduce_update_after_delete_is_noop() {
        let timers = vec![timer("a", "One", "X"), timer("b", "Two", "X")];
        let timers = reduce_timers(timers, TimerAction::Delete("a".to_string()));
        let snapshot = timers.clone();

        let patch = TimerPatch {
            name: Some("Renamed".to_string()),
            ..TimerPatch::new("a")
        };
        let timers = reduce_timers(timers, TimerAction::Update(patch));

        assert_eq!(timers, snapshot);
    }

    #[test]
    fn reduce_update_merges_partial_fields() {
        let timers = vec![timer("a", "One", "X")];
        let patch = TimerPatch::new("a").status(TimerStatus::Running).remaining(42);
        let timers = reduce_timers(timers, TimerAction::Update(patch));

        assert_eq!(timers[0].name, "One");
        assert_eq!(timers[0].category, "X");
        assert_eq!(timers[0].duration, 60);
        assert_eq!(timers[0].remaining, 42);
        assert_eq!(timers[0].status, TimerStatus::Running);
    }

    #[test]
    fn reduce_replace_swaps_everything() {
        let timers = vec![timer("a", "One", "X")];
        let replacement = vec![timer("z", "Other", "Y")];
        assert_eq!(
            reduce_timers(timers, TimerAction::Replace(replacement.clone())),
            replacement
        );
    }

    #[test]
    fn grouping_keeps_first_appearance_order() {
        let timers = vec![
            timer("a", "Run", "Workout"),
            timer("b", "Read", "Study"),
            timer("c", "Squats", "Workout"),
        ];
        let groups = group_by_category(&timers, None);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].category, "Workout");
        assert_eq!(groups[0].timers.len(), 2);
        assert_eq!(groups[1].category, "Study");
    }

    #[test]
    fn grouping_applies_filter() {
        let timers = vec![timer("a", "Run", "Workout"), timer("b", "Read", "Study")];
        let groups = group_by_category(&timers, Some("Study"));

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].timers[0].id, "b");
        assert!(group_by_category(&timers, Some("Cooking")).is_empty());
    }

    #[tokio::test]
    async fn add_assigns_unique_ids_and_persists() {
        let store = Arc::new(MemoryStore::new());
        let mut collection = TimerCollection::load(store.clone()).await;

        let first = collection.add(new_timer("Pushups", 30, "Workout")).await;
        let second = collection.add(new_timer("Pushups", 30, "Workout")).await;

        assert_ne!(first.id, second.id);
        assert_eq!(first.status, TimerStatus::Paused);
        assert_eq!(first.remaining, 30);

        let reloaded = TimerCollection::load(store).await;
        assert_eq!(reloaded.list(), collection.list());
    }

    #[tokio::test]
    async fn update_unknown_id_returns_none() {
        let store = Arc::new(MemoryStore::new());
        let mut collection = TimerCollection::load(store).await;
        collection.add(new_timer("Read", 60, "Study")).await;
        let before = collection.list().to_vec();

        let patch = TimerPatch {
            name: Some("Ghost".to_string()),
            ..TimerPatch::new("missing")
        };
        assert!(collection.update(patch).await.is_none());
        assert_eq!(collection.list(), before.as_slice());
    }

    #[tokio::test]
    async fn delete_then_update_leaves_collection_unchanged() {
        let store = Arc::new(MemoryStore::new());
        let mut collection = TimerCollection::load(store.clone()).await;
        let kept = collection.add(new_timer("Read", 60, "Study")).await;
        let doomed = collection.add(new_timer("Nap", 600, "Rest")).await;

        assert_eq!(collection.delete(&doomed.id).await, Some(doomed.clone()));
        assert!(collection.delete(&doomed.id).await.is_none());
        let patch = TimerPatch {
            duration: Some(5),
            ..TimerPatch::new(doomed.id.clone())
        };
        assert!(collection.update(patch).await.is_none());

        assert_eq!(collection.list(), std::slice::from_ref(&kept));
        let reloaded = TimerCollection::load(store).await;
        assert_eq!(reloaded.list(), std::slice::from_ref(&kept));
    }

    #[tokio::test]
    async fn running_timers_load_paused() {
        let store = Arc::new(MemoryStore::new());
        let mut running = timer("a", "Run", "Workout");
        running.status = TimerStatus::Running;
        running.remaining = 12;
        save_collection(store.as_ref(), TIMERS_KEY, &[running]).await;

        let collection = TimerCollection::load(store).await;
        let loaded = collection.get("a").unwrap();

        assert_eq!(loaded.status, TimerStatus::Paused);
        assert_eq!(loaded.remaining, 12);
    }

    #[tokio::test]
    async fn resolve_accepts_unique_prefix_only() {
        let store = Arc::new(MemoryStore::new());
        let timers = vec![
            timer("abc-1", "One", "X"),
            timer("abd-2", "Two", "X"),
        ];
        save_collection(store.as_ref(), TIMERS_KEY, &timers).await;
        let collection = TimerCollection::load(store).await;

        assert_eq!(collection.resolve("abc").map(|t| t.name.as_str()), Some("One"));
        assert_eq!(collection.resolve("abd-2").map(|t| t.name.as_str()), Some("Two"));
        assert!(collection.resolve("ab").is_none());
        assert!(collection.resolve("  ").is_none());
    }

    #[tokio::test]
    async fn save_failures_keep_memory_state() {
        let store: Arc<dyn KeyValueStore> = Arc::new(BrokenStore { content: None });
        let mut collection = TimerCollection::load(store).await;

        let added = collection.add(new_timer("Read", 60, "Study")).await;

        assert_eq!(collection.list(), std::slice::from_ref(&added));
        assert!(!collection.persist().await);
    }
}
