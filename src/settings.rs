use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{FactdeskError, Result};

/// How CSV import resolves an agency name against the agencies of a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AgencyMatch {
    /// Case- and whitespace-insensitive equality.
    #[default]
    Exact,
    /// The stored name contains the CSV value (case-insensitive).
    Contains,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default = "default_draft_expiry_hours")]
    pub draft_expiry_hours: i64,
    #[serde(default = "default_rows_per_page")]
    pub rows_per_page: usize,
    #[serde(default = "default_page_window")]
    pub page_window: usize,
    #[serde(default)]
    pub agency_match: AgencyMatch,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_draft_expiry_hours() -> i64 {
    24
}

fn default_rows_per_page() -> usize {
    10
}

fn default_page_window() -> usize {
    5
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().to_string(),
            user_id: String::new(),
            email: String::new(),
            draft_expiry_hours: default_draft_expiry_hours(),
            rows_per_page: default_rows_per_page(),
            page_window: default_page_window(),
            agency_match: AgencyMatch::default(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    pub fn is_initialized(&self) -> bool {
        !self.user_id.is_empty()
    }

    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_path().join("factdesk.db")
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("factdesk")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("factdesk")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_default()
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| FactdeskError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

/// Settings of an initialized installation, or `NotInitialized`.
pub fn require_settings() -> Result<Settings> {
    let settings = load_settings();
    if !settings.is_initialized() {
        return Err(FactdeskError::NotInitialized);
    }
    Ok(settings)
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}
