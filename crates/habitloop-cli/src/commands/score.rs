use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Subcommand;
use habitloop_core::{calculate_current_score, calculate_score_history};
use serde_json::json;

use super::{load_history, print_json, today_or};

#[derive(Subcommand)]
pub enum ScoreAction {
    /// Score as of today
    Current {
        /// Habit history JSON file
        #[arg(short, long)]
        input: PathBuf,
        /// Evaluate as of this date (YYYY-MM-DD) instead of today
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// Daily scores for a date range
    History {
        #[arg(short, long)]
        input: PathBuf,
        /// First day (YYYY-MM-DD)
        #[arg(long)]
        from: NaiveDate,
        /// Last day (YYYY-MM-DD)
        #[arg(long)]
        to: NaiveDate,
        /// Report scores as percentages
        #[arg(long)]
        percent: bool,
    },
}

pub fn run(action: ScoreAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ScoreAction::Current { input, today } => {
            let history = load_history(&input)?;
            let today = today_or(today);
            let score = calculate_current_score(&history.habit, &history.entries, today)?;
            print_json(&json!({
                "habit_id": history.habit.habit_id,
                "date": today,
                "score": score,
                "percentage": score * 100.0,
            }))?;
        }
        ScoreAction::History {
            input,
            from,
            to,
            percent,
        } => {
            let history = load_history(&input)?;
            let points = calculate_score_history(&history.habit, &history.entries, from, to)?;
            if percent {
                let rows: Vec<_> = points
                    .iter()
                    .map(|p| json!({ "date": p.date, "timestamp": p.timestamp, "score": p.percentage() }))
                    .collect();
                print_json(&rows)?;
            } else {
                print_json(&points)?;
            }
        }
    }
    Ok(())
}
