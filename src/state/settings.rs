// SPDX-License-Identifier: MPL-2.0

use crate::config::{APP_ID, YEAR_MAX, YEAR_MIN};
use crate::supabase::FeedMode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_feed_mode() -> String {
    "mine".to_string()
}

fn default_view_year() -> i32 {
    YEAR_MAX
}

/// Persistent application settings: where the user left the feed toggle and
/// the timeline slider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_feed_mode")]
    pub feed_mode: String,
    #[serde(default = "default_view_year")]
    pub view_year: i32,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            feed_mode: default_feed_mode(),
            view_year: default_view_year(),
        }
    }
}

impl AppSettings {
    /// Settings file path (~/.config/io.github.chronomap.ChronoMap/settings.json)
    fn settings_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push(APP_ID);
            p.push("settings.json");
            p
        })
    }

    /// Load settings from disk, or return defaults if not found.
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            return Self::default();
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    /// Save settings to disk.
    pub fn save(&self) -> Result<(), String> {
        let path = Self::settings_path().ok_or("Could not determine config directory")?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {e}"))?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {e}"))?;

        std::fs::write(&path, json).map_err(|e| format!("Failed to write settings: {e}"))?;

        Ok(())
    }

    /// Typed view of the stored feed mode; unknown values fall back to Mine.
    pub fn feed_mode(&self) -> FeedMode {
        FeedMode::from_str(&self.feed_mode).unwrap_or(FeedMode::Mine)
    }

    pub fn set_feed_mode(&mut self, mode: FeedMode) {
        self.feed_mode = mode.as_str().to_string();
    }

    /// Stored slider position clamped into the timeline bounds.
    pub fn view_year(&self) -> i32 {
        self.view_year.clamp(YEAR_MIN, YEAR_MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = AppSettings::default();
        assert_eq!(settings.feed_mode(), FeedMode::Mine);
        assert_eq!(settings.view_year(), YEAR_MAX);
    }

    #[test]
    fn test_json_round_trip() {
        let mut settings = AppSettings::default();
        settings.set_feed_mode(FeedMode::Explore);
        settings.view_year = 2015;

        let json = serde_json::to_string(&settings).unwrap();
        let back: AppSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.feed_mode(), FeedMode::Explore);
        assert_eq!(back.view_year(), 2015);
    }

    #[test]
    fn test_garbage_values_degrade_to_defaults() {
        let back: AppSettings =
            serde_json::from_str(r#"{"feed_mode":"sideways","view_year":1200}"#).unwrap();
        assert_eq!(back.feed_mode(), FeedMode::Mine);
        assert_eq!(back.view_year(), YEAR_MIN);
    }
}
