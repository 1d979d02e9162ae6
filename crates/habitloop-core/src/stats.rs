//! Habit statistics
//!
//! Aggregates a habit's check-ins together with its score and streaks into
//! the numbers shown on a habit's detail page, and rolls several habits up
//! into an overview. The detailed view adds weekly and monthly charts, a
//! calendar heatmap and a trend comparison of the last two 30-day periods.

use std::collections::BTreeMap;

use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::checkin::CheckinEntry;
use crate::error::Result;
use crate::habit::{HabitConfig, HabitHistory};
use crate::score::calculate_current_score;
use crate::streak::{StreakEngine, StreakSettings};

/// Default trailing window for the completion rate.
pub const DEFAULT_COMPLETION_WINDOW_DAYS: u32 = 30;
/// Weeks in the weekly chart, including the current one.
pub const WEEKLY_CHART_WEEKS: u32 = 12;
/// Calendar months in the monthly chart, including the current one.
pub const MONTHLY_CHART_MONTHS: u32 = 12;
/// Days before today covered by the heatmap.
pub const HEATMAP_DAYS: u32 = 365;
/// Length of each period compared by the trend.
pub const TREND_PERIOD_DAYS: u32 = 30;

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Statistics for a single habit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitStatistics {
    pub habit_id: uuid::Uuid,
    pub habit_name: String,
    /// Check-ins with a done status
    pub total_repetitions: u32,
    /// Percentage of expected completions achieved in the window (0 to 100)
    pub completion_rate: f64,
    pub current_streak: u32,
    pub best_streak: u32,
    /// Habit strength (0.0 to 1.0)
    pub current_score: f64,
    /// Mean of positive values in thousandths; numerical habits only
    pub average_value: Option<f64>,
    pub last_completion: Option<NaiveDate>,
    pub total_days_tracked: u32,
}

/// Statistics across all habits
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverviewStatistics {
    pub total_habits: u32,
    pub total_repetitions: u32,
    pub repetitions_today: u32,
    pub habits_completed_today: u32,
    pub longest_streak: u32,
    pub average_completion_rate: f64,
}

/// Completions in one Monday-based week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyChartData {
    pub week_start: NaiveDate,
    /// e.g. "Jan 08"
    pub week_label: String,
    pub completed: u32,
    pub target: u32,
    /// 0 to 100
    pub completion_rate: f64,
}

/// Completions in one calendar month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyChartData {
    pub month_start: NaiveDate,
    /// e.g. "Feb 2024"
    pub month_label: String,
    pub completed: u32,
    pub target: u32,
    /// 0 to 100
    pub completion_rate: f64,
}

/// One heatmap cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarHeatmapDay {
    pub date: NaiveDate,
    pub count: u32,
    /// Intensity from 0 (nothing) to 4 (busiest day)
    pub level: u8,
}

/// Last period compared with the one before it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendData {
    pub period_days: u32,
    /// 0 to 100, higher when completions are spread evenly over days
    pub consistency_score: f64,
    /// Recent completion rate minus the previous period's, in points
    pub improvement_rate: f64,
    /// Recent completion rate (0 to 100)
    pub average_completion_rate: f64,
    pub best_day_of_week: Option<Weekday>,
    pub worst_day_of_week: Option<Weekday>,
}

impl TrendData {
    fn empty() -> Self {
        Self {
            period_days: TREND_PERIOD_DAYS,
            consistency_score: 0.0,
            improvement_rate: 0.0,
            average_completion_rate: 0.0,
            best_day_of_week: None,
            worst_day_of_week: None,
        }
    }
}

/// Per-habit statistics plus chart and trend data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedHabitStatistics {
    #[serde(flatten)]
    pub summary: HabitStatistics,
    pub weekly_data: Vec<WeeklyChartData>,
    pub monthly_data: Vec<MonthlyChartData>,
    pub calendar_heatmap: Vec<CalendarHeatmapDay>,
    pub trend: TrendData,
}

/// Analyzer for per-habit and overview statistics
#[derive(Debug, Clone)]
pub struct HabitStatsAnalyzer {
    /// Trailing days counted by the completion rate
    pub completion_window_days: u32,
    pub streak_settings: StreakSettings,
}

impl Default for HabitStatsAnalyzer {
    fn default() -> Self {
        Self {
            completion_window_days: DEFAULT_COMPLETION_WINDOW_DAYS,
            streak_settings: StreakSettings::default(),
        }
    }
}

impl HabitStatsAnalyzer {
    /// Create a new analyzer with default windows
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new analyzer with custom windows
    pub fn with_settings(completion_window_days: u32, streak_settings: StreakSettings) -> Self {
        Self {
            completion_window_days,
            streak_settings,
        }
    }

    /// Statistics for one habit as of `today`
    ///
    /// # Errors
    ///
    /// Returns an error if the habit configuration does not validate.
    pub fn analyze(
        &self,
        habit: &HabitConfig,
        entries: &[CheckinEntry],
        today: NaiveDate,
    ) -> Result<HabitStatistics> {
        let streaks = StreakEngine::with_settings(habit, self.streak_settings)?;
        let completed: Vec<&CheckinEntry> =
            entries.iter().filter(|e| e.status.is_done()).collect();

        let average_value = if habit.kind.is_numerical() && !entries.is_empty() {
            let positive: Vec<i64> = entries.iter().map(|e| e.value).filter(|v| *v > 0).collect();
            if positive.is_empty() {
                Some(0.0)
            } else {
                Some(positive.iter().sum::<i64>() as f64 / positive.len() as f64)
            }
        } else {
            None
        };

        let total_days_tracked = entries
            .iter()
            .map(|e| e.date)
            .min()
            .map_or(0, |first| ((today - first).num_days() + 1).max(0) as u32);

        let stats = HabitStatistics {
            habit_id: habit.habit_id,
            habit_name: habit.name.clone(),
            total_repetitions: completed.len() as u32,
            completion_rate: self.completion_rate(habit, &completed, today),
            current_streak: streaks.current_streak(entries, today)?,
            best_streak: streaks.best_streak(entries, today)?,
            current_score: calculate_current_score(habit, entries, today)?,
            average_value,
            last_completion: completed.iter().map(|e| e.date).max(),
            total_days_tracked,
        };

        debug!(
            habit = %habit.habit_id,
            repetitions = stats.total_repetitions,
            completion_rate = stats.completion_rate,
            "analyzed habit"
        );
        Ok(stats)
    }

    /// [`HabitStatsAnalyzer::analyze`] plus charts, heatmap and trend
    pub fn detailed(
        &self,
        habit: &HabitConfig,
        entries: &[CheckinEntry],
        today: NaiveDate,
    ) -> Result<DetailedHabitStatistics> {
        let summary = self.analyze(habit, entries, today)?;
        Ok(DetailedHabitStatistics {
            summary,
            weekly_data: self.weekly_chart(habit, entries, today),
            monthly_data: self.monthly_chart(habit, entries, today),
            calendar_heatmap: self.calendar_heatmap(entries, today),
            trend: self.trend(habit, entries, today),
        })
    }

    /// Completions per week for the last 12 weeks, oldest first.
    ///
    /// The target is the habit's frequency scaled to seven days, rounded down.
    pub fn weekly_chart(
        &self,
        habit: &HabitConfig,
        entries: &[CheckinEntry],
        today: NaiveDate,
    ) -> Vec<WeeklyChartData> {
        let target = 7 * habit.frequency.numerator / habit.frequency.denominator;
        let Some(this_week) = today.checked_sub_days(Days::new(u64::from(
            today.weekday().num_days_from_monday(),
        ))) else {
            return Vec::new();
        };

        (0..WEEKLY_CHART_WEEKS)
            .rev()
            .filter_map(|i| {
                let start = this_week.checked_sub_days(Days::new(7 * u64::from(i)))?;
                let end = start.checked_add_days(Days::new(6))?;
                let completed = count_done(entries, start, end);
                Some(WeeklyChartData {
                    week_start: start,
                    week_label: start.format("%b %d").to_string(),
                    completed,
                    target,
                    completion_rate: capped_rate(completed, target),
                })
            })
            .collect()
    }

    /// Completions per calendar month for the last 12 months, oldest first.
    ///
    /// The target is the habit's frequency scaled to the month's length,
    /// rounded down.
    pub fn monthly_chart(
        &self,
        habit: &HabitConfig,
        entries: &[CheckinEntry],
        today: NaiveDate,
    ) -> Vec<MonthlyChartData> {
        let Some(this_month) = today.with_day(1) else {
            return Vec::new();
        };

        (0..MONTHLY_CHART_MONTHS)
            .rev()
            .filter_map(|i| {
                let start = this_month.checked_sub_months(Months::new(i))?;
                let next = start.checked_add_months(Months::new(1))?;
                let end = next.pred_opt()?;
                let days = (next - start).num_days() as u32;
                let target = days * habit.frequency.numerator / habit.frequency.denominator;
                let completed = count_done(entries, start, end);
                Some(MonthlyChartData {
                    month_start: start,
                    month_label: start.format("%b %Y").to_string(),
                    completed,
                    target,
                    completion_rate: capped_rate(completed, target),
                })
            })
            .collect()
    }

    /// One cell per day from 365 days ago through `today`.
    ///
    /// Levels scale against the busiest day in range: any completion on a
    /// day is at least level 1, and the busiest day is level 4.
    pub fn calendar_heatmap(&self, entries: &[CheckinEntry], today: NaiveDate) -> Vec<CalendarHeatmapDay> {
        let since = today
            .checked_sub_days(Days::new(u64::from(HEATMAP_DAYS)))
            .unwrap_or(NaiveDate::MIN);

        let mut counts: BTreeMap<NaiveDate, u32> = BTreeMap::new();
        for entry in entries
            .iter()
            .filter(|e| e.status.is_done() && e.date >= since && e.date <= today)
        {
            *counts.entry(entry.date).or_default() += 1;
        }
        let busiest = counts.values().copied().max().unwrap_or(1);

        since
            .iter_days()
            .take_while(|date| *date <= today)
            .map(|date| {
                let count = counts.get(&date).copied().unwrap_or(0);
                CalendarHeatmapDay {
                    date,
                    count,
                    level: heat_level(count, busiest),
                }
            })
            .collect()
    }

    /// Compare the last 30 days with the 30 days before.
    pub fn trend(&self, habit: &HabitConfig, entries: &[CheckinEntry], today: NaiveDate) -> TrendData {
        if entries.is_empty() {
            return TrendData::empty();
        }

        let period = Days::new(u64::from(TREND_PERIOD_DAYS));
        let recent_since = today.checked_sub_days(period).unwrap_or(NaiveDate::MIN);
        let previous_since = recent_since.checked_sub_days(period).unwrap_or(NaiveDate::MIN);

        let recent: Vec<&CheckinEntry> = entries
            .iter()
            .filter(|e| e.date >= recent_since && e.date <= today)
            .collect();
        let recent_done = recent.iter().filter(|e| e.status.is_done()).count();
        let previous_done = entries
            .iter()
            .filter(|e| e.status.is_done() && e.date >= previous_since && e.date < recent_since)
            .count();

        let expected = f64::from(TREND_PERIOD_DAYS) * habit.frequency.per_day();
        let rate = |done: usize| {
            if expected > 0.0 {
                (done as f64 / expected * 100.0).min(100.0)
            } else {
                0.0
            }
        };
        let recent_rate = rate(recent_done);

        let (best_day_of_week, worst_day_of_week) = best_and_worst_weekday(&recent);
        TrendData {
            period_days: TREND_PERIOD_DAYS,
            consistency_score: consistency_score(&recent),
            improvement_rate: recent_rate - rate(previous_done),
            average_completion_rate: recent_rate,
            best_day_of_week,
            worst_day_of_week,
        }
    }

    /// Roll several habits into one overview as of `today`
    pub fn overview(&self, histories: &[HabitHistory], today: NaiveDate) -> Result<OverviewStatistics> {
        let mut overview = OverviewStatistics::default();
        let mut rate_sum = 0.0;

        for history in histories {
            let stats = self.analyze(&history.habit, &history.entries, today)?;
            let done_today = history
                .entries
                .iter()
                .filter(|e| e.date == today && e.status.is_done())
                .count() as u32;

            overview.total_habits += 1;
            overview.total_repetitions += stats.total_repetitions;
            overview.repetitions_today += done_today;
            if done_today > 0 {
                overview.habits_completed_today += 1;
            }
            overview.longest_streak = overview.longest_streak.max(stats.best_streak);
            rate_sum += stats.completion_rate;
        }

        if overview.total_habits > 0 {
            overview.average_completion_rate = rate_sum / overview.total_habits as f64;
        }
        Ok(overview)
    }

    /// Completions in the trailing window over the completions expected there
    fn completion_rate(&self, habit: &HabitConfig, completed: &[&CheckinEntry], today: NaiveDate) -> f64 {
        let window = self.completion_window_days;
        let since = today
            .checked_sub_days(Days::new(u64::from(window)))
            .unwrap_or(NaiveDate::MIN);
        let recent = completed
            .iter()
            .filter(|e| e.date >= since && e.date <= today)
            .count();

        let expected = window as f64 * habit.frequency.per_day();
        if expected > 0.0 {
            (recent as f64 / expected * 100.0).min(100.0)
        } else {
            0.0
        }
    }
}

fn count_done(entries: &[CheckinEntry], from: NaiveDate, to: NaiveDate) -> u32 {
    entries
        .iter()
        .filter(|e| e.status.is_done() && e.date >= from && e.date <= to)
        .count() as u32
}

fn capped_rate(completed: u32, target: u32) -> f64 {
    if target == 0 {
        return 0.0;
    }
    (f64::from(completed) / f64::from(target) * 100.0).min(100.0)
}

fn heat_level(count: u32, busiest: u32) -> u8 {
    match count {
        0 => 0,
        _ if busiest <= 1 => 4,
        _ => (count * 4 / busiest + 1).min(4) as u8,
    }
}

/// 100 minus the coefficient of variation of completions per day, as a
/// percentage.
fn consistency_score(recent: &[&CheckinEntry]) -> f64 {
    let mut per_day: BTreeMap<NaiveDate, u32> = BTreeMap::new();
    for entry in recent.iter().filter(|e| e.status.is_done()) {
        *per_day.entry(entry.date).or_default() += 1;
    }
    if per_day.is_empty() {
        return 0.0;
    }

    let n = per_day.len() as f64;
    let mean = per_day.values().map(|c| f64::from(*c)).sum::<f64>() / n;
    let variance = per_day
        .values()
        .map(|c| (f64::from(*c) - mean).powi(2))
        .sum::<f64>()
        / n;
    (100.0 * (1.0 - variance.sqrt() / mean)).clamp(0.0, 100.0)
}

/// Weekdays with the highest and lowest share of done check-ins.
///
/// Weekdays without check-ins rate 0; ties go to the earlier weekday.
fn best_and_worst_weekday(recent: &[&CheckinEntry]) -> (Option<Weekday>, Option<Weekday>) {
    let mut done = [0u32; 7];
    let mut total = [0u32; 7];
    for entry in recent {
        let idx = entry.date.weekday().num_days_from_monday() as usize;
        total[idx] += 1;
        if entry.status.is_done() {
            done[idx] += 1;
        }
    }
    if total.iter().all(|t| *t == 0) {
        return (None, None);
    }

    let rates: Vec<f64> = done
        .iter()
        .zip(total)
        .map(|(d, t)| if t > 0 { f64::from(*d) / f64::from(t) } else { 0.0 })
        .collect();
    let (mut best, mut worst) = (0, 0);
    for (i, rate) in rates.iter().enumerate() {
        if *rate > rates[best] {
            best = i;
        }
        if *rate < rates[worst] {
            worst = i;
        }
    }
    (Some(WEEK[best]), Some(WEEK[worst]))
}
