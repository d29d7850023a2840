//! Harvest settings shared by every command.
//!
//! The settings file lives at `~/.config/reel-harvest/settings.toml`.
//! Values resolve as: CLI flag (applied by the caller) > `REEL_HARVEST_*`
//! environment variable > settings file > built-in default.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid settings file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Could not serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Canonical path to the settings file: `~/.config/reel-harvest/settings.toml`.
pub fn settings_path() -> PathBuf {
    let config = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    config.join("reel-harvest").join("settings.toml")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestSettings {
    /// Site strategy name (`namakade` or `farsiplex`).
    pub site: String,
    pub workers: usize,
    /// Completed tasks between checkpoint flushes.
    pub flush_every: usize,
    /// Largest episode shortfall still treated as a partial scrape.
    pub verify_threshold: u32,
    /// Minimum gap between requests in serial mode.
    pub min_request_interval_ms: u64,
    /// When set, requests run concurrently up to this many in flight and the
    /// minimum interval is not applied.
    pub max_in_flight: Option<usize>,
    pub request_timeout_secs: u64,
    pub task_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            site: "namakade".to_string(),
            workers: 3,
            flush_every: 10,
            verify_threshold: 20,
            min_request_interval_ms: 2000,
            max_in_flight: None,
            request_timeout_secs: 30,
            task_timeout_secs: 600,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    pub checkpoint: PathBuf,
    pub log_dir: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            checkpoint: PathBuf::from("complete_scraper_checkpoint.json"),
            log_dir: PathBuf::from("logs"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub harvest: HarvestSettings,
    pub paths: PathSettings,
}

impl Settings {
    /// Load from the canonical path, then apply environment overrides.
    pub fn load() -> Result<Self, SettingsError> {
        let mut settings = Self::load_from(&settings_path())?;
        settings.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    /// Load a settings file. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        toml::from_str(&contents).map_err(|e| SettingsError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Apply `REEL_HARVEST_*` overrides looked up through `lookup`.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), SettingsError> {
        fn parse<T: std::str::FromStr>(
            key: &'static str,
            value: String,
        ) -> Result<T, SettingsError> {
            value
                .trim()
                .parse()
                .map_err(|_| SettingsError::InvalidValue { key, value })
        }

        if let Some(v) = lookup("REEL_HARVEST_SITE") {
            self.harvest.site = v;
        }
        if let Some(v) = lookup("REEL_HARVEST_WORKERS") {
            self.harvest.workers = parse("REEL_HARVEST_WORKERS", v)?;
        }
        if let Some(v) = lookup("REEL_HARVEST_DELAY_MS") {
            self.harvest.min_request_interval_ms = parse("REEL_HARVEST_DELAY_MS", v)?;
        }
        if let Some(v) = lookup("REEL_HARVEST_MAX_IN_FLIGHT") {
            self.harvest.max_in_flight = Some(parse("REEL_HARVEST_MAX_IN_FLIGHT", v)?);
        }
        if let Some(v) = lookup("REEL_HARVEST_VERIFY_THRESHOLD") {
            self.harvest.verify_threshold = parse("REEL_HARVEST_VERIFY_THRESHOLD", v)?;
        }
        if let Some(v) = lookup("REEL_HARVEST_CHECKPOINT") {
            self.paths.checkpoint = PathBuf::from(v);
        }
        if let Some(v) = lookup("REEL_HARVEST_LOG_DIR") {
            self.paths.log_dir = PathBuf::from(v);
        }
        Ok(())
    }

    /// Write the settings file atomically (temp file, then rename).
    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let serialized = toml::to_string_pretty(self)?;
        let tmp = path.with_extension("toml.tmp");
        std::fs::write(&tmp, &serialized)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

/// Load the full settings file as a pretty-printed TOML string for display.
pub fn load_settings_string() -> Option<String> {
    let contents = std::fs::read_to_string(settings_path()).ok()?;
    let doc: toml::Value = contents.parse().ok()?;
    toml::to_string_pretty(&doc).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.harvest.flush_every, 10);
        assert_eq!(settings.harvest.verify_threshold, 20);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[harvest]\nworkers = 5\n").unwrap();
        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.harvest.workers, 5);
        assert_eq!(settings.harvest.min_request_interval_ms, 2000);
        assert_eq!(settings.paths, PathSettings::default());
    }

    #[test]
    fn bad_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[harvest\nworkers = ").unwrap();
        assert!(matches!(
            Settings::load_from(&path),
            Err(SettingsError::Parse { .. })
        ));
    }

    #[test]
    fn environment_overrides_file() {
        let env: HashMap<&str, &str> = [
            ("REEL_HARVEST_WORKERS", "7"),
            ("REEL_HARVEST_CHECKPOINT", "/tmp/cp.json"),
            ("REEL_HARVEST_MAX_IN_FLIGHT", "4"),
        ]
        .into_iter()
        .collect();
        let mut settings = Settings::default();
        settings
            .apply_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(settings.harvest.workers, 7);
        assert_eq!(settings.harvest.max_in_flight, Some(4));
        assert_eq!(settings.paths.checkpoint, PathBuf::from("/tmp/cp.json"));
    }

    #[test]
    fn invalid_override_is_reported() {
        let mut settings = Settings::default();
        let err = settings
            .apply_overrides(|k| (k == "REEL_HARVEST_WORKERS").then(|| "many".to_string()))
            .unwrap_err();
        assert!(matches!(
            err,
            SettingsError::InvalidValue { key: "REEL_HARVEST_WORKERS", .. }
        ));
    }

    #[test]
    fn save_round_trips_without_leaving_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.toml");
        let mut settings = Settings::default();
        settings.harvest.site = "farsiplex".to_string();
        settings.save_to(&path).unwrap();
        assert!(!path.with_extension("toml.tmp").exists());
        assert_eq!(Settings::load_from(&path).unwrap(), settings);
    }
}
