mod config;

pub use config::{AnalyticsConfig, StatsConfig, StreaksConfig};

use std::path::PathBuf;

use crate::error::Result;

/// Returns `~/.config/habitloop[-dev]/` based on HABITLOOP_ENV.
///
/// Set HABITLOOP_ENV=dev to use the development directory, or
/// HABITLOOP_CONFIG_DIR to point somewhere else entirely.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("HABITLOOP_CONFIG_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("HABITLOOP_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("habitloop-dev")
            } else {
                base_dir.join("habitloop")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
