use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "TIMERBOX_CONFIG_PATH";
pub const DEFAULT_CATEGORY: &str = "Workout";

#[derive(Debug, Clone)]
pub struct Palette {
    pub accent: &'static str,
    pub muted: &'static str,
    pub reset: &'static str,
}

impl Palette {
    pub fn accentize(&self, text: &str) -> String {
        if self.accent.is_empty() {
            text.to_string()
        } else {
            format!("{}{}{}", self.accent, text, self.reset)
        }
    }

    pub fn mutedize(&self, text: &str) -> String {
        if self.muted.is_empty() {
            text.to_string()
        } else {
            format!("{}{}{}", self.muted, text, self.reset)
        }
    }
}

pub fn palette_for_theme(theme: Option<&str>) -> Palette {
    match theme.and_then(canonical_theme_name).as_deref() {
        Some("dark") => Palette {
            accent: "\x1b[38;5;36m",
            muted: "\x1b[38;5;249m",
            reset: "\x1b[0m",
        },
        Some("teal") => Palette {
            accent: "\x1b[38;5;30m",
            muted: "\x1b[38;5;242m",
            reset: "\x1b[0m",
        },
        _ => Palette {
            accent: "",
            muted: "",
            reset: "",
        },
    }
}

/// Lowercases, collapses separators, and maps aliases onto the known
/// theme names. Blank input means the plain theme.
pub fn canonical_theme_name(raw: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    match trimmed {
        "" | "light" | "plain" | "default" => Some("light".to_string()),
        "dark" | "dark_mode" | "darkmode" | "night" => Some("dark".to_string()),
        "teal" | "healthfix" => Some("teal".to_string()),
        other => Some(other.to_string()),
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub theme: Option<String>,
    /// Category for timers created without one.
    #[serde(default)]
    pub default_category: Option<String>,
    #[serde(default)]
    pub export_dir: Option<PathBuf>,
    #[serde(default)]
    pub notifications: Option<bool>,
}

impl Config {
    pub fn default_category(&self) -> &str {
        self.default_category
            .as_deref()
            .map(str::trim)
            .filter(|category| !category.is_empty())
            .unwrap_or(DEFAULT_CATEGORY)
    }

    pub fn notifications_enabled(&self) -> bool {
        self.notifications.unwrap_or(true)
    }

    pub fn palette(&self) -> Palette {
        palette_for_theme(self.theme.as_deref())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub theme: Option<String>,
    pub default_category: Option<String>,
    pub export_dir: Option<PathBuf>,
    pub notifications: Option<bool>,
}

impl ConfigOverrides {
    /// Parses `KEY=VALUE` pairs as given on the command line.
    pub fn parse<S: AsRef<str>>(pairs: &[S]) -> Result<Self, AppError> {
        let mut overrides = Self::default();
        for pair in pairs {
            let pair = pair.as_ref();
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                AppError::invalid_input(format!("override must be KEY=VALUE: {pair}"))
            })?;
            let value = value.trim();
            match key.trim() {
                "theme" => overrides.theme = Some(value.to_string()),
                "default_category" => overrides.default_category = Some(value.to_string()),
                "export_dir" => overrides.export_dir = Some(PathBuf::from(value)),
                "notifications" => {
                    let enabled = value.parse::<bool>().map_err(|_| {
                        AppError::invalid_input("notifications must be true or false")
                    })?;
                    overrides.notifications = Some(enabled);
                }
                other => {
                    return Err(AppError::invalid_input(format!(
                        "unknown config key: {other}"
                    )));
                }
            }
        }
        Ok(overrides)
    }
}

pub fn config_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata)
            .join("timerbox")
            .join(CONFIG_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("timerbox")
            .join(CONFIG_FILE_NAME))
    }
}

pub fn load_config_with_fallback() -> ConfigLoad {
    match config_path() {
        Ok(path) => load_config_with_fallback_from_path(&path),
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_with_fallback_from_path(path: &Path) -> ConfigLoad {
    if !path.exists() {
        return ConfigLoad {
            config: Config::default(),
            error: None,
        };
    }

    match load_config_from_path(path) {
        Ok(config) => ConfigLoad {
            config,
            error: None,
        },
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_from_path(path: &Path) -> Result<Config, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    let mut config: Config = serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
    })?;
    config.theme = config.theme.and_then(|name| canonical_theme_name(&name));
    Ok(config)
}

pub fn merge_overrides(base: &Config, overrides: &ConfigOverrides) -> Config {
    let mut merged = base.clone();
    if let Some(theme) = overrides.theme.as_ref()
        && let Some(normalized) = canonical_theme_name(theme)
    {
        merged.theme = Some(normalized);
    }
    if let Some(category) = overrides.default_category.as_ref() {
        merged.default_category = Some(category.clone());
    }
    if let Some(dir) = overrides.export_dir.as_ref() {
        merged.export_dir = Some(dir.clone());
    }
    if let Some(enabled) = overrides.notifications {
        merged.notifications = Some(enabled);
    }
    merged
}
