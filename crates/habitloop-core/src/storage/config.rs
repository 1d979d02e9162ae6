//! TOML-based analytics configuration.
//!
//! Stores the tunables of the analytics core:
//! - Streak lookback windows and how many best streaks to keep
//! - The trailing window used by the completion rate
//!
//! Configuration is stored at `~/.config/habitloop/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::data_dir;
use crate::error::{ConfigError, CoreError, Result};
use crate::stats::{HabitStatsAnalyzer, DEFAULT_COMPLETION_WINDOW_DAYS};
use crate::streak::{
    StreakSettings, DEFAULT_BEST_LIMIT, DEFAULT_BEST_LOOKBACK_DAYS, DEFAULT_CURRENT_LOOKBACK_DAYS,
};

/// Streak-specific configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreaksConfig {
    #[serde(default = "default_current_lookback")]
    pub current_lookback_days: u32,
    /// 0 scans the full history.
    #[serde(default = "default_best_lookback")]
    pub best_lookback_days: u32,
    #[serde(default = "default_best_limit")]
    pub best_limit: usize,
}

/// Statistics configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsConfig {
    #[serde(default = "default_completion_window")]
    pub completion_window_days: u32,
}

/// Analytics configuration.
///
/// Serialized to/from TOML at `~/.config/habitloop/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    #[serde(default)]
    pub streaks: StreaksConfig,
    #[serde(default)]
    pub stats: StatsConfig,
}

// Default functions
fn default_current_lookback() -> u32 {
    DEFAULT_CURRENT_LOOKBACK_DAYS
}
fn default_best_lookback() -> u32 {
    DEFAULT_BEST_LOOKBACK_DAYS
}
fn default_best_limit() -> usize {
    DEFAULT_BEST_LIMIT
}
fn default_completion_window() -> u32 {
    DEFAULT_COMPLETION_WINDOW_DAYS
}

impl Default for StreaksConfig {
    fn default() -> Self {
        Self {
            current_lookback_days: default_current_lookback(),
            best_lookback_days: default_best_lookback(),
            best_limit: default_best_limit(),
        }
    }
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            completion_window_days: default_completion_window(),
        }
    }
}

impl AnalyticsConfig {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(root: &mut serde_json::Value, key: &str, value: &str) -> Result<()> {
        let unknown = || CoreError::from(ConfigError::UnknownKey(key.to_string()));
        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;
            let invalid = |message: String| {
                CoreError::from(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message,
                })
            };

            let new_value = match existing {
                serde_json::Value::Number(_) => value
                    .parse::<u64>()
                    .map(|n| serde_json::Value::Number(n.into()))
                    .map_err(|_| invalid(format!("cannot parse '{value}' as a whole number")))?,
                serde_json::Value::Bool(_) => value
                    .parse::<bool>()
                    .map(serde_json::Value::Bool)
                    .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
                serde_json::Value::Object(_) => {
                    return Err(invalid("cannot replace a whole section".into()));
                }
                _ => serde_json::Value::String(value.into()),
            };

            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    /// Default location of the config file.
    pub fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if the file is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            let cfg = Self::default();
            cfg.save_to(&path)?;
            Ok(cfg)
        }
    }

    /// Load from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let cfg: AnalyticsConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        debug!(path = %path.display(), "loaded analytics config");
        Ok(cfg)
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    /// Persist to an explicit path.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key, in memory only.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json)?;
        Ok(())
    }

    /// Streak lookback windows.
    pub fn streak_settings(&self) -> StreakSettings {
        StreakSettings {
            current_lookback_days: self.streaks.current_lookback_days,
            best_lookback_days: match self.streaks.best_lookback_days {
                0 => None,
                days => Some(days),
            },
            best_limit: self.streaks.best_limit,
        }
    }

    /// Statistics analyzer configured from this file.
    pub fn stats_analyzer(&self) -> HabitStatsAnalyzer {
        HabitStatsAnalyzer::with_settings(self.stats.completion_window_days, self.streak_settings())
    }

    /// Load from the default location for read-only use.
    ///
    /// Never writes: an absent file gives defaults, and an unreadable one
    /// gives defaults with a warning.
    pub fn load_or_default() -> Self {
        match Self::path() {
            Ok(path) => Self::load_or_default_from(&path),
            Err(e) => {
                warn!(error = %e, "config directory unavailable, using defaults");
                Self::default()
            }
        }
    }

    /// [`AnalyticsConfig::load_or_default`] for an explicit path.
    pub fn load_or_default_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        Self::load_from(path).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "ignoring broken config, using defaults");
            Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_roundtrip() {
        let cfg = AnalyticsConfig::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: AnalyticsConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
        assert_eq!(parsed.streaks.best_lookback_days, 730);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: AnalyticsConfig = toml::from_str("[streaks]\nbest_limit = 3\n").unwrap();
        assert_eq!(parsed.streaks.best_limit, 3);
        assert_eq!(parsed.streaks.current_lookback_days, 365);
        assert_eq!(parsed.stats.completion_window_days, 30);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = AnalyticsConfig::default();
        assert_eq!(cfg.get("streaks.current_lookback_days").as_deref(), Some("365"));
        assert_eq!(cfg.get("stats.completion_window_days").as_deref(), Some("30"));
        assert!(cfg.get("streaks.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn set_updates_nested_number() {
        let mut cfg = AnalyticsConfig::default();
        cfg.set("streaks.best_lookback_days", "0").unwrap();
        assert_eq!(cfg.streaks.best_lookback_days, 0);
        assert_eq!(cfg.streak_settings().best_lookback_days, None);
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = AnalyticsConfig::default();
        let err = cfg.set("streaks.nonexistent", "1").unwrap_err();
        assert!(matches!(err, CoreError::Config(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn set_rejects_invalid_number() {
        let mut cfg = AnalyticsConfig::default();
        let err = cfg.set("stats.completion_window_days", "thirty").unwrap_err();
        assert!(matches!(err, CoreError::Config(ConfigError::InvalidValue { .. })));
        assert_eq!(cfg, AnalyticsConfig::default());
    }

    #[test]
    fn set_rejects_section_replacement() {
        let mut cfg = AnalyticsConfig::default();
        assert!(cfg.set("streaks", "1").is_err());
    }

    #[test]
    fn save_and_load_from_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut cfg = AnalyticsConfig::default();
        cfg.set("streaks.best_limit", "5").unwrap();
        cfg.save_to(&path).unwrap();

        let loaded = AnalyticsConfig::load_from(&path).unwrap();
        assert_eq!(loaded.streaks.best_limit, 5);
        assert_eq!(loaded.stats_analyzer().streak_settings.best_limit, 5);
    }

    #[test]
    fn load_or_default_tolerates_broken_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[streaks]\nbest_limit = \"many\"\n").unwrap();
        assert_eq!(AnalyticsConfig::load_or_default_from(&path), AnalyticsConfig::default());
    }

    #[test]
    fn load_or_default_does_not_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        assert_eq!(AnalyticsConfig::load_or_default_from(&path), AnalyticsConfig::default());
        assert!(!path.exists());
    }

    #[test]
    fn load_from_reports_parse_failure() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "streaks = [").unwrap();
        let err = AnalyticsConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, CoreError::Config(ConfigError::ParseFailed(_))));
    }
}
