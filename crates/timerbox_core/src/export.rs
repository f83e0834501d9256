//! Writes the completion history to a file a spreadsheet can open.

use crate::error::AppError;
use crate::history::sort_by_recency;
use crate::model::HistoryEntry;
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};
use tracing::info;

pub const EXPORT_FILE_STEM: &str = "timer_history";
const CSV_HEADER: [&str; 4] = ["Timer Name", "Category", "Duration (seconds)", "Completed At"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    pub fn default_file_name(self) -> String {
        format!("{EXPORT_FILE_STEM}.{}", self.extension())
    }
}

/// Renders an RFC 3339 timestamp as local `YYYY-MM-DD HH:MM:SS`. Values
/// that do not parse are returned unchanged.
pub fn format_local(completed_at: &str, offset: UtcOffset) -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    OffsetDateTime::parse(completed_at, &Rfc3339)
        .ok()
        .and_then(|moment| moment.to_offset(offset).format(&format).ok())
        .unwrap_or_else(|| completed_at.to_string())
}

pub fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// One header row, then one row per entry in the order given.
pub fn render_csv(entries: &[HistoryEntry], offset: UtcOffset) -> String {
    let mut out = CSV_HEADER.join(",");
    out.push_str("\r\n");
    for entry in entries {
        let row = [
            csv_field(&entry.timer_name),
            csv_field(&entry.category),
            entry.duration.to_string(),
            csv_field(&format_local(&entry.completed_at, offset)),
        ];
        out.push_str(&row.join(","));
        out.push_str("\r\n");
    }
    out
}

pub fn render(
    entries: &[HistoryEntry],
    format: ExportFormat,
    offset: UtcOffset,
) -> Result<String, AppError> {
    match format {
        ExportFormat::Csv => Ok(render_csv(entries, offset)),
        ExportFormat::Json => serde_json::to_string_pretty(entries)
            .map_err(|err| AppError::export(format!("Failed to export history: {err}"))),
    }
}

/// Writes `entries`, newest first, to `destination` and returns the path.
pub async fn export_history(
    entries: &[HistoryEntry],
    format: ExportFormat,
    destination: &Path,
) -> Result<PathBuf, AppError> {
    let mut sorted = entries.to_vec();
    sort_by_recency(&mut sorted);
    let content = render(&sorted, format, local_offset())?;

    if let Some(parent) = destination.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|err| AppError::export(format!("Failed to export history: {err}")))?;
    }
    tokio::fs::write(destination, content)
        .await
        .map_err(|err| AppError::export(format!("Failed to export history: {err}")))?;

    info!(path = %destination.display(), count = entries.len(), "exported history");
    Ok(destination.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::{ExportFormat, csv_field, export_history, format_local, render_csv};
    use crate::model::{HistoryEntry, NewHistoryEntry};
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};
    use time::UtcOffset;

    fn temp_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("timerbox-{nanos}-{name}"))
    }

    fn entry(name: &str, category: &str, completed_at: &str) -> HistoryEntry {
        NewHistoryEntry {
            timer_id: "timer-1".to_string(),
            timer_name: name.to_string(),
            category: category.to_string(),
            duration: 30,
            completed_at: completed_at.to_string(),
        }
        .into_entry(format!("{name}-entry"))
    }

    #[test]
    fn local_format_applies_offset() {
        let offset = UtcOffset::from_hms(2, 0, 0).unwrap();
        assert_eq!(
            format_local("2025-12-20T08:15:30Z", offset),
            "2025-12-20 10:15:30"
        );
        assert_eq!(format_local("not a date", offset), "not a date");
    }

    #[test]
    fn csv_quotes_only_when_needed() {
        assert_eq!(csv_field("Pushups"), "Pushups");
        assert_eq!(csv_field("Run, fast"), "\"Run, fast\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn csv_has_header_and_one_row_per_entry() {
        let entries = vec![
            entry("Pushups", "Workout", "2025-12-20T08:00:00Z"),
            entry("Read, slowly", "Study", "2025-12-20T09:00:00Z"),
        ];
        let csv = render_csv(&entries, UtcOffset::UTC);
        let lines: Vec<_> = csv.split("\r\n").filter(|line| !line.is_empty()).collect();

        assert_eq!(
            lines,
            vec![
                "Timer Name,Category,Duration (seconds),Completed At",
                "Pushups,Workout,30,2025-12-20 08:00:00",
                "\"Read, slowly\",Study,30,2025-12-20 09:00:00",
            ]
        );
    }

    #[tokio::test]
    async fn export_writes_newest_first() {
        let dir = temp_dir("export");
        let path = dir.join(ExportFormat::Json.default_file_name());
        let entries = vec![
            entry("Older", "Study", "2025-12-20T08:00:00Z"),
            entry("Newer", "Study", "2025-12-21T08:00:00Z"),
        ];

        let written = export_history(&entries, ExportFormat::Json, &path)
            .await
            .unwrap();
        let content = fs::read_to_string(&written).unwrap();
        fs::remove_dir_all(&dir).ok();

        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(written, path);
        assert_eq!(value[0]["timerName"], "Newer");
        assert_eq!(value[1]["timerName"], "Older");
    }

    #[tokio::test]
    async fn export_failure_surfaces_message() {
        let blocker = temp_dir("blocker");
        fs::write(&blocker, "file, not a directory").unwrap();
        let path = blocker.join("timer_history.csv");

        let err = export_history(&[], ExportFormat::Csv, &path)
            .await
            .unwrap_err();
        fs::remove_file(&blocker).ok();

        assert_eq!(err.code(), "export_failed");
        assert!(err.message().starts_with("Failed to export history:"));
    }
}
