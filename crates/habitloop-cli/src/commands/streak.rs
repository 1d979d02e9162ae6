use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Subcommand;
use habitloop_core::{rank_streaks, AnalyticsConfig, StreakEngine};
use serde_json::json;

use super::{load_history, print_json, today_or};

#[derive(Subcommand)]
pub enum StreakAction {
    /// All streaks, oldest first
    List {
        /// Habit history JSON file
        #[arg(short, long)]
        input: PathBuf,
        /// Ignore check-ins before this date
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Ignore check-ins after this date
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Longest streaks in the best-streak window, newest first
    Best {
        #[arg(short, long)]
        input: PathBuf,
        /// How many streaks to keep (defaults to streaks.best_limit)
        #[arg(short, long)]
        limit: Option<usize>,
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// Current and best streak lengths plus ranked streaks
    Summary {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(long)]
        today: Option<NaiveDate>,
    },
}

pub fn run(action: StreakAction) -> Result<(), Box<dyn std::error::Error>> {
    let settings = AnalyticsConfig::load_or_default().streak_settings();

    match action {
        StreakAction::List { input, from, to } => {
            let history = load_history(&input)?;
            let engine = StreakEngine::with_settings(&history.habit, settings)?;
            let streaks = engine.streaks(&history.entries, from, to)?;
            let rows: Vec<_> = streaks
                .iter()
                .map(|s| json!({ "start_date": s.start, "end_date": s.end, "length": s.length() }))
                .collect();
            print_json(&rows)?;
        }
        StreakAction::Best {
            input,
            limit,
            today,
        } => {
            let history = load_history(&input)?;
            let today = today_or(today);
            let engine = StreakEngine::with_settings(&history.habit, settings)?;
            let streaks = engine.best_window_streaks(&history.entries, today)?;
            let best = rank_streaks(&streaks, limit.unwrap_or(settings.best_limit));
            let rows: Vec<_> = best
                .iter()
                .map(|s| json!({ "start_date": s.start, "end_date": s.end, "length": s.length() }))
                .collect();
            print_json(&rows)?;
        }
        StreakAction::Summary { input, today } => {
            let history = load_history(&input)?;
            let engine = StreakEngine::with_settings(&history.habit, settings)?;
            let summary = engine.summarize(&history.entries, today_or(today))?;
            print_json(&summary)?;
        }
    }
    Ok(())
}
