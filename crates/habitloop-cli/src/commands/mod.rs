pub mod config;
pub mod score;
pub mod stats;
pub mod streak;

use std::path::Path;

use chrono::{Local, NaiveDate};
use habitloop_core::HabitHistory;
use serde::Serialize;
use tracing::debug;

/// Read a habit history document (`{"habit": ..., "entries": [...]}`).
pub fn load_history(path: &Path) -> Result<HabitHistory, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    let history: HabitHistory = serde_json::from_str(&content)
        .map_err(|e| format!("invalid habit history in {}: {e}", path.display()))?;
    history.habit.validate()?;
    debug!(
        path = %path.display(),
        habit = %history.habit.habit_id,
        entries = history.entries.len(),
        "loaded habit history"
    );
    Ok(history)
}

/// `--today` override or the local calendar date.
pub fn today_or(today: Option<NaiveDate>) -> NaiveDate {
    today.unwrap_or_else(|| Local::now().date_naive())
}

pub fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
