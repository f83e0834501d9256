//! Plain-text and JSON views of timers and history.

use tabled::settings::Style;
use tabled::{Table, Tabled};
use timerbox_core::config::Palette;
use timerbox_core::export::format_local;
use timerbox_core::model::{HistoryEntry, Timer, TimerStatus};
use timerbox_core::runtime::CompletionEvent;
use timerbox_core::timers::CategoryGroup;
use time::UtcOffset;

const SHORT_ID_LEN: usize = 8;

/// `mm:ss`, or `h:mm:ss` from one hour up.
pub fn format_clock(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes:02}:{secs:02}")
    }
}

pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(SHORT_ID_LEN) {
        Some((index, _)) => &id[..index],
        None => id,
    }
}

pub fn status_label(status: TimerStatus) -> &'static str {
    match status {
        TimerStatus::Running => "Running",
        TimerStatus::Paused => "Paused",
    }
}

#[derive(Tabled)]
struct TimerRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Remaining")]
    remaining: String,
    #[tabled(rename = "Duration")]
    duration: String,
    #[tabled(rename = "Progress")]
    progress: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Halfway")]
    halfway: String,
}

impl From<&Timer> for TimerRow {
    fn from(timer: &Timer) -> Self {
        Self {
            id: short_id(&timer.id).to_string(),
            name: timer.name.clone(),
            remaining: format_clock(timer.remaining),
            duration: format_clock(timer.duration),
            progress: format!("{:.0}%", timer.progress() * 100.0),
            status: status_label(timer.status).to_string(),
            halfway: if timer.halfway_alert { "yes" } else { "-" }.to_string(),
        }
    }
}

#[derive(Tabled)]
struct HistoryRow {
    #[tabled(rename = "Timer Name")]
    name: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Duration")]
    duration: String,
    #[tabled(rename = "Completed At")]
    completed_at: String,
}

pub fn timer_groups_plain(groups: &[CategoryGroup], palette: &Palette) -> String {
    if groups.is_empty() {
        return palette.mutedize("No timers yet. Add one with: timerbox add <name> <seconds>");
    }

    let mut sections = Vec::with_capacity(groups.len());
    for group in groups {
        let rows: Vec<TimerRow> = group.timers.iter().map(TimerRow::from).collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        sections.push(format!("{}\n{}", palette.accentize(&group.category), table));
    }
    sections.join("\n\n")
}

pub fn timer_groups_json(groups: &[CategoryGroup]) -> serde_json::Value {
    serde_json::json!(groups)
}

pub fn timer_line(verb: &str, timer: &Timer) -> String {
    format!(
        "{verb}: {} ({}) {} [{}]",
        timer.name,
        short_id(&timer.id),
        format_clock(timer.remaining),
        timer.category
    )
}

pub fn history_plain(entries: &[HistoryEntry], offset: UtcOffset, palette: &Palette) -> String {
    if entries.is_empty() {
        return palette.mutedize("No completed timers yet.");
    }
    let rows: Vec<HistoryRow> = entries
        .iter()
        .map(|entry| HistoryRow {
            name: entry.timer_name.clone(),
            category: entry.category.clone(),
            duration: format_clock(entry.duration),
            completed_at: format_local(&entry.completed_at, offset),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table.to_string()
}

pub fn completion_plain(event: &CompletionEvent, palette: &Palette) -> String {
    format!("{} {}", palette.accentize("Timer Complete:"), event.message())
}
