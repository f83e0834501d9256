mod history;
mod timer;

pub use history::{HistoryEntry, NewHistoryEntry};
pub use timer::{NewTimer, Timer, TimerPatch, TimerStatus};

/// Fresh collision-resistant identifier for timers and history entries.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
