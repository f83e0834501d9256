use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    Running,
    #[default]
    Paused,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "TimerRecord")]
pub struct Timer {
    pub id: String,
    pub name: String,
    /// Full countdown length in seconds.
    pub duration: u64,
    /// Seconds left, never above `duration`.
    pub remaining: u64,
    pub category: String,
    pub status: TimerStatus,
    /// Captured at creation and shown in listings. Nothing acts on it yet.
    pub halfway_alert: bool,
}

impl Timer {
    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }

    /// Fraction of the countdown already elapsed, `0.0` for zero-length timers.
    pub fn progress(&self) -> f64 {
        if self.duration == 0 {
            return 0.0;
        }
        (self.duration - self.remaining.min(self.duration)) as f64 / self.duration as f64
    }
}

/// On-disk shape. Older blobs may lack the live fields.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimerRecord {
    id: String,
    name: String,
    duration: u64,
    #[serde(default)]
    remaining: Option<u64>,
    category: String,
    #[serde(default)]
    status: TimerStatus,
    #[serde(default)]
    halfway_alert: bool,
}

impl From<TimerRecord> for Timer {
    fn from(record: TimerRecord) -> Self {
        let remaining = record
            .remaining
            .unwrap_or(record.duration)
            .min(record.duration);
        Self {
            id: record.id,
            name: record.name,
            duration: record.duration,
            remaining,
            category: record.category,
            status: record.status,
            halfway_alert: record.halfway_alert,
        }
    }
}

/// Everything the user supplies when creating a timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTimer {
    pub name: String,
    pub duration: u64,
    pub category: String,
    pub halfway_alert: bool,
}

impl NewTimer {
    pub fn into_timer(self, id: String) -> Timer {
        Timer {
            id,
            name: self.name,
            duration: self.duration,
            remaining: self.duration,
            category: self.category,
            status: TimerStatus::Paused,
            halfway_alert: self.halfway_alert,
        }
    }
}

/// Partial update keyed by id. `None` fields keep the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerPatch {
    pub id: String,
    pub name: Option<String>,
    pub duration: Option<u64>,
    pub remaining: Option<u64>,
    pub category: Option<String>,
    pub status: Option<TimerStatus>,
    pub halfway_alert: Option<bool>,
}

impl TimerPatch {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn status(mut self, status: TimerStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn remaining(mut self, remaining: u64) -> Self {
        self.remaining = Some(remaining);
        self
    }

    /// Merges this patch over `timer`, keeping `remaining <= duration`.
    pub fn apply_to(&self, timer: &mut Timer) {
        if let Some(name) = &self.name {
            timer.name = name.clone();
        }
        if let Some(duration) = self.duration {
            timer.duration = duration;
        }
        if let Some(remaining) = self.remaining {
            timer.remaining = remaining;
        }
        if let Some(category) = &self.category {
            timer.category = category.clone();
        }
        if let Some(status) = self.status {
            timer.status = status;
        }
        if let Some(halfway_alert) = self.halfway_alert {
            timer.halfway_alert = halfway_alert;
        }
        timer.remaining = timer.remaining.min(timer.duration);
    }
}
