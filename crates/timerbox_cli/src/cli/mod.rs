use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use timerbox_core::BulkAction;
use timerbox_core::export::ExportFormat;

#[derive(Parser, Debug)]
#[command(name = "timerbox", author, version, about = "Countdown timers grouped by category", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new timer
    ///
    /// Example: timerbox add Pushups 30 --category Workout
    Add {
        name: Option<String>,
        /// Length in whole seconds
        duration: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Remember that a halfway alert was requested
        #[arg(long)]
        halfway_alert: bool,
    },
    /// Change a timer's name, duration, category, or halfway flag
    ///
    /// Example: timerbox edit 3f2a --duration 45
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        duration: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long, value_name = "BOOL")]
        halfway_alert: Option<bool>,
    },
    /// Delete a timer (its history stays)
    ///
    /// Example: timerbox delete 3f2a
    Delete { id: String },
    /// List timers grouped by category
    ///
    /// Example: timerbox list --category Study
    List {
        #[arg(long)]
        category: Option<String>,
    },
    /// Start a timer and count down in the foreground
    ///
    /// Example: timerbox start 3f2a
    Start { id: String },
    /// Pause a timer
    Pause { id: String },
    /// Put a timer back to its full duration
    Reset { id: String },
    /// Start, pause, or reset every timer in a category
    ///
    /// Example: timerbox bulk pause Study
    Bulk {
        #[arg(value_enum)]
        action: BulkCommand,
        category: String,
    },
    /// Show completed runs, newest first
    History,
    /// Remove every history entry
    ClearHistory,
    /// Write the history to a spreadsheet-friendly file
    ///
    /// Example: timerbox export --format csv --output ~/timers.csv
    Export {
        #[arg(long, value_enum, default_value_t = ExportKind::Csv)]
        format: ExportKind,
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BulkCommand {
    Start,
    Pause,
    Reset,
}

impl From<BulkCommand> for BulkAction {
    fn from(command: BulkCommand) -> Self {
        match command {
            BulkCommand::Start => BulkAction::Start,
            BulkCommand::Pause => BulkAction::Pause,
            BulkCommand::Reset => BulkAction::Reset,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportKind {
    Csv,
    Json,
}

impl From<ExportKind> for ExportFormat {
    fn from(kind: ExportKind) -> Self {
        match kind {
            ExportKind::Csv => ExportFormat::Csv,
            ExportKind::Json => ExportFormat::Json,
        }
    }
}
