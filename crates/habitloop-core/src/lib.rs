//! # Habitloop Core Library
//!
//! Analytics core for habit tracking. Given a habit's configuration and its
//! check-in history it derives two signals:
//!
//! - a **strength score** between 0.0 and 1.0, exponentially smoothed with a
//!   frequency-dependent decay
//! - **streaks**, maximal runs of consecutive qualifying days
//!
//! The core is pure computation. Fetching check-ins and persisting results
//! belong to the caller; nothing here touches a store or the network.
//!
//! ## Architecture
//!
//! - **Timeline Builder**: turns sparse check-ins into a dense, ascending
//!   day-by-day [`Timeline`]
//! - **Score Engine**: sliding-window recurrence over the timeline
//! - **Streak Engine**: run-length grouping with recency/length ranking
//! - **Statistics**: per-habit and overview numbers built on both engines
//! - **Storage**: TOML configuration for the engines' windows
//!
//! ## Key Components
//!
//! - [`build_timeline`]: Timeline Builder entry point
//! - [`ScoreEngine`]: Score recurrence for one habit
//! - [`StreakEngine`]: Streak detection for one habit
//! - [`HabitStatsAnalyzer`]: Statistics aggregation
//! - [`AnalyticsConfig`]: Configuration management

pub mod checkin;
pub mod error;
pub mod habit;
pub mod score;
pub mod stats;
pub mod storage;
pub mod streak;
pub mod timeline;

pub use checkin::{CheckinEntry, EntryStatus};
pub use error::{ConfigError, CoreError, Result, ValidationError};
pub use habit::{
    Frequency, HabitConfig, HabitHistory, HabitKind, HabitTarget, TargetType, WeekdaySchedule,
};
pub use score::{calculate_current_score, calculate_score_history, compute, ScoreEngine, ScorePoint};
pub use stats::{
    CalendarHeatmapDay, DetailedHabitStatistics, HabitStatistics, HabitStatsAnalyzer,
    MonthlyChartData, OverviewStatistics, TrendData, WeeklyChartData,
};
pub use storage::AnalyticsConfig;
pub use streak::{rank_streaks, Qualification, Streak, StreakEngine, StreakSettings, StreakSummary};
pub use timeline::{build_timeline, DayRecord, Timeline};
