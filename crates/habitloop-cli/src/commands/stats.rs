use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Subcommand;
use habitloop_core::AnalyticsConfig;

use super::{load_history, print_json, today_or};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Statistics for one habit
    Habit {
        /// Habit history JSON file
        #[arg(short, long)]
        input: PathBuf,
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// Statistics plus weekly/monthly charts, heatmap and trend
    Detailed {
        /// Habit history JSON file
        #[arg(short, long)]
        input: PathBuf,
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// Overview across several habits
    Overview {
        /// Habit history JSON files
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,
        #[arg(long)]
        today: Option<NaiveDate>,
    },
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let analyzer = AnalyticsConfig::load_or_default().stats_analyzer();

    match action {
        StatsAction::Habit { input, today } => {
            let history = load_history(&input)?;
            let stats = analyzer.analyze(&history.habit, &history.entries, today_or(today))?;
            print_json(&stats)?;
        }
        StatsAction::Detailed { input, today } => {
            let history = load_history(&input)?;
            let detailed = analyzer.detailed(&history.habit, &history.entries, today_or(today))?;
            print_json(&detailed)?;
        }
        StatsAction::Overview { input, today } => {
            let histories = input
                .iter()
                .map(|path| load_history(path))
                .collect::<Result<Vec<_>, _>>()?;
            let overview = analyzer.overview(&histories, today_or(today))?;
            print_json(&overview)?;
        }
    }
    Ok(())
}
