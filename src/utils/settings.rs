//! Settings and environment utilities.
//!
//! This module reads user-level settings from $HOME/.verlog/settings.json
//! and uses them as a fallback for `VERLOG_*` environment variables.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Settings loaded from $HOME/.verlog/settings.json.
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    /// Environment variable overrides.
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl Settings {
    /// Loads settings from the default location.
    pub fn load() -> Result<Self> {
        let settings_path = Self::get_settings_path()?;
        Self::load_from_path(&settings_path)
    }

    /// Loads settings from a specific path.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

        serde_json::from_str::<Self>(&content)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))
    }

    /// Returns the default settings path.
    pub fn get_settings_path() -> Result<PathBuf> {
        let home_dir = dirs::home_dir().context("Failed to determine home directory")?;

        Ok(home_dir.join(".verlog").join("settings.json"))
    }

    /// Returns an environment variable with fallback to settings.
    pub fn get_env_var(&self, key: &str) -> Option<String> {
        match env::var(key) {
            Ok(value) => Some(value),
            Err(_) => self.env.get(key).cloned(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn settings_load_from_path() {
        let temp_dir = TempDir::new().unwrap();
        let settings_path = temp_dir.path().join("settings.json");

        let settings_json = r#"{
            "env": {
                "VERLOG_CHANGELOG_FILE": "HISTORY.md",
                "VERLOG_VERSION_LIMIT": "5"
            }
        }"#;
        fs::write(&settings_path, settings_json).unwrap();

        let settings = Settings::load_from_path(&settings_path).unwrap();

        assert_eq!(
            settings.env.get("VERLOG_CHANGELOG_FILE").unwrap(),
            "HISTORY.md"
        );
        assert_eq!(settings.env.get("VERLOG_VERSION_LIMIT").unwrap(), "5");
    }

    #[test]
    fn settings_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let settings = Settings::load_from_path(temp_dir.path().join("absent.json")).unwrap();
        assert!(settings.env.is_empty());
    }

    #[test]
    fn settings_get_env_var_prefers_environment() {
        let mut settings = Settings::default();
        settings.env.insert(
            "VERLOG_TEST_SETTINGS_FALLBACK".to_string(),
            "from_settings".to_string(),
        );
        settings.env.insert(
            "VERLOG_TEST_SETTINGS_OVERRIDE".to_string(),
            "from_settings".to_string(),
        );

        env::set_var("VERLOG_TEST_SETTINGS_OVERRIDE", "from_env");

        assert_eq!(
            settings.get_env_var("VERLOG_TEST_SETTINGS_OVERRIDE").unwrap(),
            "from_env"
        );
        assert_eq!(
            settings.get_env_var("VERLOG_TEST_SETTINGS_FALLBACK").unwrap(),
            "from_settings"
        );
        assert!(settings.get_env_var("VERLOG_TEST_SETTINGS_ABSENT").is_none());

        env::remove_var("VERLOG_TEST_SETTINGS_OVERRIDE");
    }
}
