//! The single owner of timer and history state.
//!
//! `TimerApi` is opened once per process, routes every user action and
//! every scheduler tick through one mutation path, and flushes both
//! collections on [`TimerApi::shutdown`].

use crate::error::AppError;
use crate::export::{self, ExportFormat};
use crate::history::HistoryCollection;
use crate::model::{HistoryEntry, NewTimer, Timer, TimerPatch};
use crate::notify::Notifier;
use crate::runtime::{CompletionEvent, StartOutcome, TimerRuntime};
use crate::scheduler::{TICK_PERIOD, Tick, TickScheduler};
use crate::storage::KeyValueStore;
use crate::timers::{CategoryGroup, TimerCollection, group_by_category};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    Start,
    Pause,
    Reset,
}

/// Fields a user may change on an existing timer. `None` keeps the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerEdit {
    pub name: Option<String>,
    pub duration: Option<u64>,
    pub category: Option<String>,
    pub halfway_alert: Option<bool>,
}

/// Parses a whole number of seconds.
pub fn parse_duration(raw: &str) -> Result<u64, AppError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| AppError::invalid_input("duration must be a whole number of seconds"))
}

fn validate_name(raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("name is required"));
    }
    Ok(trimmed.to_string())
}

pub struct TimerApi {
    timers: TimerCollection,
    history: HistoryCollection,
    runtimes: HashMap<String, TimerRuntime>,
    scheduler: TickScheduler,
    ticks: mpsc::UnboundedReceiver<Tick>,
    notifier: Box<dyn Notifier>,
    default_category: String,
}

impl TimerApi {
    /// Loads both collections from `store`.
    pub async fn open(store: Arc<dyn KeyValueStore>, notifier: Box<dyn Notifier>) -> Self {
        let timers = TimerCollection::load(Arc::clone(&store)).await;
        let history = HistoryCollection::load(store).await;
        let (scheduler, ticks) = TickScheduler::new(TICK_PERIOD);
        debug!(
            timers = timers.list().len(),
            history = history.entries().len(),
            "opened timer store"
        );

        Self {
            timers,
            history,
            runtimes: HashMap::new(),
            scheduler,
            ticks,
            notifier,
            default_category: crate::config::DEFAULT_CATEGORY.to_string(),
        }
    }

    pub fn with_default_category<S: Into<String>>(mut self, category: S) -> Self {
        self.default_category = category.into();
        self
    }

    pub fn timers(&self) -> &[Timer] {
        self.timers.list()
    }

    pub fn timer(&self, id: &str) -> Option<&Timer> {
        self.timers.get(id)
    }

    /// Looks a timer up by full id or unique id prefix.
    pub fn resolve(&self, needle: &str) -> Option<&Timer> {
        self.timers.resolve(needle)
    }

    pub fn grouped(&self, category: Option<&str>) -> Vec<CategoryGroup> {
        group_by_category(self.timers.list(), category)
    }

    /// Completed runs, newest first.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history.by_recency()
    }

    pub fn has_running(&self) -> bool {
        self.runtimes.values().any(TimerRuntime::is_running)
    }

    pub async fn create_timer(
        &mut self,
        name: &str,
        duration: u64,
        category: Option<&str>,
        halfway_alert: bool,
    ) -> Result<Timer, AppError> {
        let name = validate_name(name)?;
        let category = category
            .map(str::trim)
            .filter(|category| !category.is_empty())
            .unwrap_or(self.default_category.as_str())
            .to_string();

        let timer = self
            .timers
            .add(NewTimer {
                name,
                duration,
                category,
                halfway_alert,
            })
            .await;
        Ok(timer)
    }

    /// Applies `edit` to the timer with `id`. A changed duration resets the
    /// countdown and stops it. `Ok(None)` when no such timer exists.
    pub async fn edit_timer(&mut self, id: &str, edit: TimerEdit) -> Result<Option<Timer>, AppError> {
        let name = edit.name.as_deref().map(validate_name).transpose()?;
        let category = match edit.category.as_deref().map(str::trim) {
            Some("") => return Err(AppError::invalid_input("category cannot be empty")),
            other => other.map(str::to_string),
        };

        if self.runtime_mut(id).is_none() {
            return Ok(None);
        }

        let patch = TimerPatch {
            name,
            duration: edit.duration,
            category,
            halfway_alert: edit.halfway_alert,
            ..TimerPatch::new(id)
        };
        let Some(updated) = self.timers.update(patch).await else {
            return Ok(None);
        };

        if let Some(runtime) = self.runtimes.get_mut(id) {
            runtime.apply_edit(&updated);
            if !runtime.is_running() {
                self.scheduler.cancel(id);
            }
        }
        Ok(self.reconcile(id).await)
    }

    pub async fn delete_timer(&mut self, id: &str) -> Option<Timer> {
        self.scheduler.cancel(id);
        self.runtimes.remove(id);
        self.timers.delete(id).await
    }

    /// `None` when no such timer exists.
    pub async fn start(&mut self, id: &str) -> Option<StartOutcome> {
        let outcome = self.runtime_mut(id)?.start();
        match outcome {
            StartOutcome::Started => {
                self.scheduler.schedule(id);
                self.reconcile(id).await;
                info!(timer_id = %id, "timer started");
            }
            StartOutcome::NothingRemaining => {
                debug!(timer_id = %id, "start refused, nothing remaining");
            }
            StartOutcome::AlreadyRunning => {}
        }
        Some(outcome)
    }

    pub async fn pause(&mut self, id: &str) -> Option<Timer> {
        if self.runtime_mut(id)?.pause() {
            info!(timer_id = %id, "timer paused");
        }
        self.scheduler.cancel(id);
        self.reconcile(id).await
    }

    pub async fn reset(&mut self, id: &str) -> Option<Timer> {
        self.runtime_mut(id)?.reset();
        self.scheduler.cancel(id);
        info!(timer_id = %id, "timer reset");
        self.reconcile(id).await
    }

    /// Runs `action` on every timer in `category`, one persisted update at a
    /// time. Returns the affected timers as they ended up.
    pub async fn bulk(&mut self, category: &str, action: BulkAction) -> Vec<Timer> {
        let ids: Vec<String> = self
            .timers
            .list()
            .iter()
            .filter(|timer| timer.category == category)
            .map(|timer| timer.id.clone())
            .collect();

        let mut affected = Vec::with_capacity(ids.len());
        for id in ids {
            match action {
                BulkAction::Start => {
                    self.start(&id).await;
                }
                BulkAction::Pause => {
                    self.pause(&id).await;
                }
                BulkAction::Reset => {
                    self.reset(&id).await;
                }
            }
            if let Some(timer) = self.timers.get(&id) {
                affected.push(timer.clone());
            }
        }
        affected
    }

    /// Waits for the next scheduler tick. Pending forever while nothing runs.
    pub async fn next_tick(&mut self) -> Option<Tick> {
        self.ticks.recv().await
    }

    /// Applies one tick. On completion the run is recorded in history and
    /// the notifier is told, both exactly once.
    pub async fn apply_tick(&mut self, tick: Tick) -> Option<CompletionEvent> {
        if !self.scheduler.is_current(&tick) {
            trace!(timer_id = %tick.timer_id, generation = tick.generation, "stale tick dropped");
            return None;
        }

        let runtime = self.runtimes.get_mut(&tick.timer_id)?;
        let event = runtime.tick(OffsetDateTime::now_utc());
        if !runtime.is_running() {
            self.scheduler.cancel(&tick.timer_id);
        }
        self.reconcile(&tick.timer_id).await;

        if let Some(event) = &event {
            info!(timer_id = %event.timer_id, name = %event.timer_name, "timer complete");
            self.history.append(event.clone().into()).await;
            if let Err(err) = self.notifier.notify(event) {
                warn!(error = %err, "failed to show completion notification");
            }
        }
        event
    }

    /// Drives ticks until no timer is running.
    pub async fn run_until_idle(&mut self) -> Vec<CompletionEvent> {
        let mut events = Vec::new();
        while self.has_running() {
            let Some(tick) = self.next_tick().await else {
                break;
            };
            events.extend(self.apply_tick(tick).await);
        }
        events
    }

    pub async fn clear_history(&mut self) {
        self.history.clear().await;
    }

    pub async fn export_history(
        &self,
        format: ExportFormat,
        destination: &Path,
    ) -> Result<PathBuf, AppError> {
        export::export_history(self.history.entries(), format, destination).await
    }

    /// Stops every countdown, keeps remaining time, and writes both
    /// collections.
    pub async fn shutdown(&mut self) {
        self.scheduler.cancel_all();
        let running: Vec<String> = self
            .runtimes
            .iter()
            .filter(|(_, runtime)| runtime.is_running())
            .map(|(id, _)| id.clone())
            .collect();
        for id in running {
            if let Some(runtime) = self.runtimes.get_mut(&id) {
                runtime.pause();
            }
            self.reconcile(&id).await;
        }

        let timers_saved = self.timers.persist().await;
        let history_saved = self.history.persist().await;
        debug!(timers_saved, history_saved, "timer store flushed");
    }

    fn runtime_mut(&mut self, id: &str) -> Option<&mut TimerRuntime> {
        let timer = self.timers.get(id)?;
        Some(
            self.runtimes
                .entry(id.to_string())
                .or_insert_with(|| TimerRuntime::new(timer.clone())),
        )
    }

    /// Copies the runtime's live fields back into the collection.
    async fn reconcile(&mut self, id: &str) -> Option<Timer> {
        let patch = self.runtimes.get(id)?.live_patch();
        self.timers.update(patch).await
    }
}
