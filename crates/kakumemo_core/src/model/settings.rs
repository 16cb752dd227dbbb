//! User settings persisted alongside the hierarchy.

use serde::{Deserialize, Serialize};

pub const DEFAULT_THEME: &str = "dark";
pub const DEFAULT_AUTO_SAVE_INTERVAL_MS: u64 = 3000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub theme: String,
    pub auto_save: bool,
    /// Editor autosave period in milliseconds.
    pub auto_save_interval: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: DEFAULT_THEME.to_string(),
            auto_save: true,
            auto_save_interval: DEFAULT_AUTO_SAVE_INTERVAL_MS,
        }
    }
}

/// Partial settings update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub theme: Option<String>,
    pub auto_save: Option<bool>,
    pub auto_save_interval: Option<u64>,
}

impl Settings {
    /// Applies every provided field of `update`.
    pub fn apply(&mut self, update: SettingsUpdate) {
        if let Some(theme) = update.theme {
            self.theme = theme;
        }
        if let Some(auto_save) = update.auto_save {
            self.auto_save = auto_save;
        }
        if let Some(interval) = update.auto_save_interval {
            self.auto_save_interval = interval;
        }
    }
}
