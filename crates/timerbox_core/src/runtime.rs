//! Countdown state machine for a single timer.
//!
//! A runtime works on a snapshot of its timer; the owner copies the live
//! fields back into the collection after every transition. Completion is an
//! instantaneous transition out of `Running` at zero that leaves the timer
//! paused and fires the latch exactly once per run.

use crate::model::{NewHistoryEntry, Timer, TimerPatch, TimerStatus};
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionLatch {
    Armed,
    Fired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
    /// `remaining` is zero; the timer has to be reset first.
    NothingRemaining,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionEvent {
    pub timer_id: String,
    pub timer_name: String,
    pub category: String,
    pub duration: u64,
    pub completed_at: String,
}

impl CompletionEvent {
    pub fn message(&self) -> String {
        format!("{} timer has finished!", self.timer_name)
    }
}

impl From<CompletionEvent> for NewHistoryEntry {
    fn from(event: CompletionEvent) -> Self {
        Self {
            timer_id: event.timer_id,
            timer_name: event.timer_name,
            category: event.category,
            duration: event.duration,
            completed_at: event.completed_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TimerRuntime {
    timer: Timer,
    latch: CompletionLatch,
}

impl TimerRuntime {
    pub fn new(timer: Timer) -> Self {
        let latch = if timer.remaining == 0 && timer.duration > 0 {
            CompletionLatch::Fired
        } else {
            CompletionLatch::Armed
        };
        Self { timer, latch }
    }

    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    pub fn status(&self) -> TimerStatus {
        self.timer.status
    }

    pub fn remaining(&self) -> u64 {
        self.timer.remaining
    }

    pub fn latch(&self) -> CompletionLatch {
        self.latch
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_running()
    }

    pub fn progress(&self) -> f64 {
        self.timer.progress()
    }

    pub fn start(&mut self) -> StartOutcome {
        if self.is_running() {
            return StartOutcome::AlreadyRunning;
        }
        if self.timer.remaining == 0 {
            return StartOutcome::NothingRemaining;
        }
        if self.timer.remaining == self.timer.duration {
            self.latch = CompletionLatch::Armed;
        }
        self.timer.status = TimerStatus::Running;
        StartOutcome::Started
    }

    /// Returns whether the timer was running.
    pub fn pause(&mut self) -> bool {
        let was_running = self.is_running();
        self.timer.status = TimerStatus::Paused;
        was_running
    }

    pub fn reset(&mut self) {
        self.timer.status = TimerStatus::Paused;
        self.timer.remaining = self.timer.duration;
        self.latch = CompletionLatch::Armed;
    }

    /// One elapsed second. Ignored unless running.
    pub fn tick(&mut self, now: OffsetDateTime) -> Option<CompletionEvent> {
        if !self.is_running() {
            return None;
        }

        self.timer.remaining = self.timer.remaining.saturating_sub(1);
        if self.timer.remaining > 0 {
            return None;
        }

        self.timer.status = TimerStatus::Paused;
        if self.latch == CompletionLatch::Fired {
            return None;
        }
        self.latch = CompletionLatch::Fired;

        Some(CompletionEvent {
            timer_id: self.timer.id.clone(),
            timer_name: self.timer.name.clone(),
            category: self.timer.category.clone(),
            duration: self.timer.duration,
            completed_at: now
                .format(&Rfc3339)
                .unwrap_or_else(|_| now.unix_timestamp().to_string()),
        })
    }

    /// Takes descriptive fields from an edited timer. A different duration
    /// resets the countdown to the new length.
    pub fn apply_edit(&mut self, edited: &Timer) {
        self.timer.name = edited.name.clone();
        self.timer.category = edited.category.clone();
        self.timer.halfway_alert = edited.halfway_alert;
        if edited.duration != self.timer.duration {
            self.timer.duration = edited.duration;
            self.reset();
        }
    }

    /// The fields this runtime owns, ready to merge into the collection.
    pub fn live_patch(&self) -> TimerPatch {
        TimerPatch::new(self.timer.id.clone())
            .remaining(self.timer.remaining)
            .status(self.timer.status)
    }
}
