use serde::{Deserialize, Serialize};

/// One finished run, copied from the timer at the moment it hit zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub timer_id: String,
    pub timer_name: String,
    pub category: String,
    pub duration: u64,
    /// RFC 3339, UTC.
    pub completed_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHistoryEntry {
    pub timer_id: String,
    pub timer_name: String,
    pub category: String,
    pub duration: u64,
    pub completed_at: String,
}

impl NewHistoryEntry {
    pub fn into_entry(self, id: String) -> HistoryEntry {
        HistoryEntry {
            id,
            timer_id: self.timer_id,
            timer_name: self.timer_name,
            category: self.category,
            duration: self.duration,
            completed_at: self.completed_at,
        }
    }
}
