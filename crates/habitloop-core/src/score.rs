//! Habit strength score engine.
//!
//! The score is an exponentially smoothed measure of adherence in `[0, 1]`.
//! Each day moves the previous score toward that day's completion:
//!
//! ```text
//! multiplier = 0.5 ^ (sqrt(frequency) / 13)
//! score      = previous * multiplier + completion * (1 - multiplier)
//! ```
//!
//! `frequency` is the expected occurrences per day, so daily habits react
//! faster than weekly ones.
//!
//! ## Completion
//!
//! A day's completion is computed from a trailing window of `denominator`
//! days ending on that day:
//!
//! | Habit | Completion |
//! |-------|------------|
//! | Boolean | `min(1, manual check-ins in window / numerator)` |
//! | Numerical, at least | `min(1, window sum / target)` |
//! | Numerical, at most | `clamp(1 - (window sum - target) / target, 0, 1)` |
//!
//! Non-daily boolean habits use a doubled window (`2n / 2d`) so fractional
//! schedules do not alternate between full and empty windows. A skipped day
//! keeps the previous score but its value still enters the window.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::checkin::{CheckinEntry, EntryStatus};
use crate::error::{CoreError, Result};
use crate::habit::{Frequency, HabitConfig, HabitKind, HabitTarget, TargetType};
use crate::timeline::{build_timeline, DayRecord, Timeline};

/// Half-life divisor of the recurrence.
const HALF_LIFE_DIVISOR: f64 = 13.0;

/// Per-day decay for a habit expected `frequency` times per day.
pub fn multiplier(frequency: f64) -> f64 {
    0.5_f64.powf(frequency.sqrt() / HALF_LIFE_DIVISOR)
}

/// One step of the score recurrence.
pub fn compute(frequency: f64, previous_score: f64, completion: f64) -> f64 {
    let multiplier = multiplier(frequency);
    previous_score * multiplier + completion * (1.0 - multiplier)
}

/// Score on one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScorePoint {
    pub date: NaiveDate,
    /// Unix epoch milliseconds of the date's midnight (UTC)
    pub timestamp: i64,
    /// Habit strength (0.0 to 1.0)
    pub score: f64,
}

impl ScorePoint {
    pub fn new(date: NaiveDate, score: f64) -> Self {
        Self {
            date,
            timestamp: midnight_millis(date),
            score: score.clamp(0.0, 1.0),
        }
    }

    /// Score as a percentage (0 to 100).
    pub fn percentage(&self) -> f64 {
        self.score * 100.0
    }
}

fn midnight_millis(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp_millis()
}

/// Runs the score recurrence over a [`Timeline`] for one habit.
#[derive(Debug, Clone)]
pub struct ScoreEngine {
    frequency: Frequency,
    kind: HabitKind,
}

impl ScoreEngine {
    /// Create an engine for `habit`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFrequency` or a validation error if the habit
    /// configuration is out of bounds; nothing is computed in that case.
    pub fn new(habit: &HabitConfig) -> Result<Self> {
        habit.validate()?;
        Ok(Self {
            frequency: habit.frequency,
            kind: habit.kind,
        })
    }

    /// Window numerator and width in days.
    fn window(&self) -> (u32, u32) {
        let Frequency {
            numerator,
            denominator,
        } = self.frequency;
        if matches!(self.kind, HabitKind::Boolean) && !self.frequency.is_daily() {
            (numerator * 2, denominator * 2)
        } else {
            (numerator, denominator)
        }
    }

    fn initial_score(&self) -> f64 {
        match self.kind {
            HabitKind::Numerical {
                target:
                    HabitTarget {
                        target_type: TargetType::AtMost,
                        ..
                    },
            } => 1.0,
            _ => 0.0,
        }
    }

    /// What a day adds to the trailing window sum.
    fn contribution(&self, day: &DayRecord) -> i64 {
        match self.kind {
            HabitKind::Boolean => i64::from(day.status == EntryStatus::DoneManual),
            HabitKind::Numerical { .. } => day.value.max(0),
        }
    }

    fn completion(&self, window_sum: i64, numerator: u32) -> f64 {
        match self.kind {
            HabitKind::Boolean => (window_sum as f64 / numerator as f64).min(1.0),
            HabitKind::Numerical { target } => {
                let sum = window_sum as f64;
                let goal = target.value as f64;
                match target.target_type {
                    TargetType::AtLeast if target.value > 0 => (sum / goal).min(1.0),
                    TargetType::AtLeast => 1.0,
                    TargetType::AtMost if target.value > 0 => {
                        (1.0 - (sum - goal) / goal).clamp(0.0, 1.0)
                    }
                    TargetType::AtMost if window_sum == 0 => 1.0,
                    TargetType::AtMost => 0.0,
                }
            }
        }
    }

    /// One score point per day of `timeline`, in the same order.
    ///
    /// Days are walked oldest to newest; each day's window ends on that day
    /// and its score is the recurrence applied to the previous day's score.
    pub fn scores(&self, timeline: &Timeline) -> Vec<ScorePoint> {
        let (numerator, width) = self.window();
        let width = width as usize;
        let frequency = self.frequency.per_day();
        let days = timeline.days();

        let mut points = Vec::with_capacity(days.len());
        let mut window_sum: i64 = 0;
        let mut score = self.initial_score();

        for (i, day) in days.iter().enumerate() {
            window_sum += self.contribution(day);
            if i >= width {
                window_sum -= self.contribution(&days[i - width]);
            }

            if day.status != EntryStatus::Skipped {
                let completion = self.completion(window_sum, numerator);
                score = compute(frequency, score, completion);
            }
            points.push(ScorePoint::new(day.date, score));
        }

        debug!(
            days = points.len(),
            window = width,
            frequency,
            last = points.last().map(|p| p.score),
            "computed scores"
        );
        points
    }
}

/// Score for `today`, running the engine over every check-in up to today.
///
/// Returns `0.0` when there are no check-ins on or before `today`.
///
/// # Errors
///
/// Returns `InvalidFrequency` or a validation error for a bad habit
/// configuration.
pub fn calculate_current_score(
    habit: &HabitConfig,
    entries: &[CheckinEntry],
    today: NaiveDate,
) -> Result<f64> {
    let engine = ScoreEngine::new(habit)?;
    let past: Vec<CheckinEntry> = entries
        .iter()
        .filter(|entry| entry.date <= today)
        .cloned()
        .collect();
    let timeline = build_timeline(&past, None, Some(today))?;
    Ok(engine
        .scores(&timeline)
        .last()
        .map_or(0.0, |point| point.score))
}

/// Scores for each day in `[start, end]`.
///
/// Check-ins before `start` still shape the scores through the recurrence;
/// check-ins after `end` are ignored. The recurrence is not reseeded at
/// `start`, so the first reported score matches what
/// [`calculate_current_score`] gives for that day rather than a fresh start
/// from the initial score. Returns an empty history when there are no
/// check-ins on or before `end`.
///
/// # Errors
///
/// Returns `EmptyRange` if `end` precedes `start`, and `InvalidFrequency`
/// or a validation error for a bad habit configuration.
pub fn calculate_score_history(
    habit: &HabitConfig,
    entries: &[CheckinEntry],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<ScorePoint>> {
    if end < start {
        return Err(CoreError::EmptyRange { from: start, to: end });
    }
    let engine = ScoreEngine::new(habit)?;
    let past: Vec<CheckinEntry> = entries
        .iter()
        .filter(|entry| entry.date <= end)
        .cloned()
        .collect();
    // Earlier check-ins warm the recurrence up before `start`.
    let from = past.iter().map(|entry| entry.date).min().map(|first| first.min(start));
    let timeline = build_timeline(&past, from, Some(end))?;
    Ok(engine
        .scores(&timeline)
        .into_iter()
        .filter(|point| point.date >= start)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::habit::HabitTarget;
    use chrono::Days;
    use proptest::prelude::*;

    const EPSILON: f64 = 1e-6;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn day(start: NaiveDate, offset: u64) -> NaiveDate {
        start.checked_add_days(Days::new(offset)).unwrap()
    }

    fn boolean_entries(habit: &HabitConfig, start: NaiveDate, statuses: &[EntryStatus]) -> Vec<CheckinEntry> {
        statuses
            .iter()
            .enumerate()
            .map(|(i, status)| CheckinEntry::boolean(habit.habit_id, day(start, i as u64), *status))
            .collect()
    }

    fn run(habit: &HabitConfig, entries: &[CheckinEntry]) -> Vec<ScorePoint> {
        let timeline = build_timeline(entries, None, None).unwrap();
        ScoreEngine::new(habit).unwrap().scores(&timeline)
    }

    #[test]
    fn test_daily_exact_values() {
        let cases = [
            (0.0, 1.0, 0.051922),
            (0.5, 1.0, 0.525961),
            (0.75, 1.0, 0.762981),
            (0.0, 0.0, 0.0),
            (0.5, 0.0, 0.474039),
            (0.75, 0.0, 0.711058),
        ];
        for (previous, completion, expected) in cases {
            let got = compute(1.0, previous, completion);
            assert!((got - expected).abs() < EPSILON, "compute(1, {previous}, {completion}) = {got}");
        }
    }

    #[test]
    fn test_non_daily_exact_values() {
        let freq = 1.0 / 3.0;
        let cases = [
            (0.0, 1.0, 0.030314),
            (0.5, 1.0, 0.515157),
            (0.75, 1.0, 0.757578),
            (0.5, 0.0, 0.484842),
            (0.75, 0.0, 0.727263),
        ];
        for (previous, completion, expected) in cases {
            let got = compute(freq, previous, completion);
            assert!((got - expected).abs() < EPSILON, "compute(1/3, {previous}, {completion}) = {got}");
        }
    }

    #[test]
    fn test_daily_multiplier() {
        assert!((multiplier(1.0) - 0.948078).abs() < EPSILON);
    }

    #[test]
    fn test_convergence() {
        let mut score = 0.0;
        for _ in 0..100 {
            score = compute(1.0, score, 1.0);
        }
        assert!(score > 0.99);

        let mut score = 1.0;
        for _ in 0..100 {
            score = compute(1.0, score, 0.0);
        }
        assert!(score < 0.01);
    }

    #[test]
    fn test_weekly_habits_swing_less() {
        let daily = compute(1.0, 0.5, 1.0) - 0.5;
        let weekly = compute(1.0 / 7.0, 0.5, 1.0) - 0.5;
        assert!(daily > weekly);
    }

    #[test]
    fn test_engine_one_point_per_day() {
        let habit = HabitConfig::boolean("Read", Frequency::DAILY);
        let entries = vec![
            CheckinEntry::boolean(habit.habit_id, date(2024, 1, 1), EntryStatus::DoneManual),
            CheckinEntry::boolean(habit.habit_id, date(2024, 1, 10), EntryStatus::DoneManual),
        ];
        let points = run(&habit, &entries);
        assert_eq!(points.len(), 10);
        assert_eq!(points[0].date, date(2024, 1, 1));
        assert_eq!(points[9].date, date(2024, 1, 10));
    }

    #[test]
    fn test_engine_daily_boolean_matches_recurrence() {
        let habit = HabitConfig::boolean("Read", Frequency::DAILY);
        let statuses = [EntryStatus::DoneManual, EntryStatus::DoneManual, EntryStatus::NotDone];
        let points = run(&habit, &boolean_entries(&habit, date(2024, 1, 1), &statuses));

        let first = compute(1.0, 0.0, 1.0);
        let second = compute(1.0, first, 1.0);
        let third = compute(1.0, second, 0.0);
        assert!((points[0].score - first).abs() < 1e-12);
        assert!((points[1].score - second).abs() < 1e-12);
        assert!((points[2].score - third).abs() < 1e-12);
    }

    #[test]
    fn test_auto_checkins_do_not_count_toward_boolean_window() {
        let habit = HabitConfig::boolean("Read", Frequency::DAILY);
        let statuses = [EntryStatus::DoneAuto, EntryStatus::DoneAuto];
        let points = run(&habit, &boolean_entries(&habit, date(2024, 1, 1), &statuses));
        assert!(points.iter().all(|p| p.score == 0.0));
    }

    #[test]
    fn test_skipped_day_carries_score_forward() {
        let habit = HabitConfig::boolean("Read", Frequency::DAILY);
        let statuses = [EntryStatus::DoneManual, EntryStatus::Skipped, EntryStatus::DoneManual];
        let points = run(&habit, &boolean_entries(&habit, date(2024, 1, 1), &statuses));

        assert_eq!(points.len(), 3);
        assert_eq!(points[1].score, points[0].score);
        assert!((points[2].score - compute(1.0, points[1].score, 1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_skipped_numerical_value_stays_in_window() {
        let habit = HabitConfig::numerical(
            "Run",
            Frequency::weekly(1).unwrap(),
            HabitTarget::at_least(2000),
        );
        let start = date(2024, 1, 1);
        let entries = vec![
            CheckinEntry::numerical(habit.habit_id, start, 1000).with_status(EntryStatus::Skipped),
            CheckinEntry::numerical(habit.habit_id, day(start, 1), 1000),
        ];
        let points = run(&habit, &entries);

        // The skipped day holds the seed score but its 1000 still counts.
        assert_eq!(points[0].score, 0.0);
        assert!((points[1].score - compute(1.0 / 7.0, 0.0, 1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_weekly_boolean_uses_doubled_window() {
        let habit = HabitConfig::boolean("Gym", Frequency::weekly(1).unwrap());
        let start = date(2024, 1, 1);
        let mut entries = vec![CheckinEntry::boolean(habit.habit_id, start, EntryStatus::DoneManual)];
        entries.push(CheckinEntry::boolean(habit.habit_id, day(start, 20), EntryStatus::NotDone));
        let points = run(&habit, &entries);

        // One check-in fills half of a 2-per-14-days window for 14 days.
        let freq = 1.0 / 7.0;
        let mut expected = 0.0;
        for point in points.iter().take(14) {
            expected = compute(freq, expected, 0.5);
            assert!((point.score - expected).abs() < 1e-12);
        }
        assert!(points[14].score < points[13].score);
    }

    #[test]
    fn test_numerical_at_least_partial_completion() {
        let habit = HabitConfig::numerical("Water", Frequency::DAILY, HabitTarget::at_least(2000));
        let entries = vec![CheckinEntry::numerical(habit.habit_id, date(2024, 1, 1), 1000)];
        let points = run(&habit, &entries);
        assert!((points[0].score - compute(1.0, 0.0, 0.5)).abs() < 1e-12);
    }

    #[test]
    fn test_numerical_window_sums_over_denominator() {
        // 10 km every 7 days: four 2.5 km runs fill the window.
        let habit = HabitConfig::numerical(
            "Run",
            Frequency::weekly(1).unwrap(),
            HabitTarget::at_least(10_000),
        );
        let start = date(2024, 1, 1);
        let entries: Vec<_> = (0..4)
            .map(|i| CheckinEntry::numerical(habit.habit_id, day(start, i), 2500))
            .collect();
        let points = run(&habit, &entries);

        let freq = 1.0 / 7.0;
        let mut expected = 0.0;
        for (i, point) in points.iter().enumerate() {
            expected = compute(freq, expected, 0.25 * (i + 1) as f64);
            assert!((point.score - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_numerical_at_most_starts_full() {
        let habit = HabitConfig::numerical("Coffee", Frequency::DAILY, HabitTarget::at_most(2000));
        let entries = vec![CheckinEntry::numerical(habit.habit_id, date(2024, 1, 1), 1000)];
        let points = run(&habit, &entries);
        assert!((points[0].score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_numerical_at_most_overshoot_drops_completion() {
        let habit = HabitConfig::numerical("Coffee", Frequency::DAILY, HabitTarget::at_most(2000));
        let entries = vec![CheckinEntry::numerical(habit.habit_id, date(2024, 1, 1), 3000)];
        let points = run(&habit, &entries);
        assert!((points[0].score - compute(1.0, 1.0, 0.5)).abs() < 1e-12);

        let entries = vec![CheckinEntry::numerical(habit.habit_id, date(2024, 1, 1), 5000)];
        let points = run(&habit, &entries);
        assert!((points[0].score - compute(1.0, 1.0, 0.0)).abs() < 1e-12);
    }

    #[test]
    fn test_numerical_at_most_zero_target() {
        let habit = HabitConfig::numerical("Smoking", Frequency::DAILY, HabitTarget::at_most(0));
        let start = date(2024, 1, 1);
        let entries = vec![
            CheckinEntry::numerical(habit.habit_id, start, 0),
            CheckinEntry::numerical(habit.habit_id, day(start, 1), 1000),
        ];
        let points = run(&habit, &entries);
        assert_eq!(points[0].score, 1.0);
        assert!((points[1].score - compute(1.0, 1.0, 0.0)).abs() < 1e-12);
    }

    #[test]
    fn test_negative_values_do_not_reduce_window() {
        let habit = HabitConfig::numerical("Water", Frequency::DAILY, HabitTarget::at_least(1000));
        let entries = vec![CheckinEntry {
            habit_id: habit.habit_id,
            date: date(2024, 1, 1),
            value: -1,
            status: EntryStatus::Unknown,
        }];
        let points = run(&habit, &entries);
        assert_eq!(points[0].score, 0.0);
    }

    #[test]
    fn test_invalid_frequency_rejected_before_computing() {
        let mut habit = HabitConfig::boolean("Read", Frequency::DAILY);
        habit.frequency = Frequency {
            numerator: 0,
            denominator: 1,
        };
        assert!(matches!(
            ScoreEngine::new(&habit),
            Err(crate::error::CoreError::InvalidFrequency { .. })
        ));
    }

    #[test]
    fn test_timestamp_is_utc_midnight() {
        let point = ScorePoint::new(date(2024, 1, 1), 0.25);
        assert_eq!(point.timestamp, 1_704_067_200_000);
        assert_eq!(point.percentage(), 25.0);
    }

    #[test]
    fn test_current_score_ignores_future_checkins() {
        let habit = HabitConfig::boolean("Read", Frequency::DAILY);
        let today = date(2024, 1, 3);
        let entries = vec![
            CheckinEntry::boolean(habit.habit_id, date(2024, 1, 1), EntryStatus::DoneManual),
            CheckinEntry::boolean(habit.habit_id, date(2024, 1, 5), EntryStatus::DoneManual),
        ];
        let score = calculate_current_score(&habit, &entries, today).unwrap();

        let expected = compute(1.0, compute(1.0, compute(1.0, 0.0, 1.0), 0.0), 0.0);
        assert!((score - expected).abs() < 1e-12);
    }

    #[test]
    fn test_current_score_without_history_is_zero() {
        let habit = HabitConfig::boolean("Read", Frequency::DAILY);
        assert_eq!(calculate_current_score(&habit, &[], date(2024, 1, 3)).unwrap(), 0.0);
    }

    #[test]
    fn test_history_covers_requested_range_with_warm_up() {
        let habit = HabitConfig::boolean("Read", Frequency::DAILY);
        let start = date(2024, 1, 1);
        let statuses = vec![EntryStatus::DoneManual; 10];
        let entries = boolean_entries(&habit, start, &statuses);

        let history = calculate_score_history(&habit, &entries, day(start, 5), day(start, 12)).unwrap();
        assert_eq!(history.len(), 8);
        assert_eq!(history[0].date, day(start, 5));
        assert_eq!(history[7].date, day(start, 12));

        let full = run(&habit, &entries);
        assert_eq!(history[0].score, full[5].score);
    }

    #[test]
    fn test_history_rejects_reversed_range() {
        let habit = HabitConfig::boolean("Read", Frequency::DAILY);
        let entries = boolean_entries(&habit, date(2024, 1, 1), &[EntryStatus::DoneManual]);
        assert!(calculate_score_history(&habit, &entries, date(2024, 1, 5), date(2024, 1, 1)).is_err());
    }

    #[test]
    fn test_recomputation_is_deterministic() {
        let habit = HabitConfig::boolean("Read", Frequency::weekly(3).unwrap());
        let statuses = [
            EntryStatus::DoneManual,
            EntryStatus::NotDone,
            EntryStatus::Skipped,
            EntryStatus::DoneManual,
            EntryStatus::DoneAuto,
        ];
        let entries = boolean_entries(&habit, date(2024, 1, 1), &statuses);
        assert_eq!(run(&habit, &entries), run(&habit, &entries));
    }

    proptest! {
        #[test]
        fn prop_compute_is_bounded(
            frequency in 0.001f64..=5.0,
            previous in 0.0f64..=1.0,
            completion in 0.0f64..=1.0,
        ) {
            let score = compute(frequency, previous, completion);
            prop_assert!((0.0..=1.0).contains(&score));
        }

        #[test]
        fn prop_completion_never_lowers_score(
            frequency in 0.001f64..=5.0,
            previous in 0.0f64..=1.0,
        ) {
            prop_assert!(compute(frequency, previous, 1.0) >= compute(frequency, previous, 0.0));
        }

        #[test]
        fn prop_engine_scores_stay_in_unit_interval(
            codes in proptest::collection::vec(-1i64..=3, 1..60),
            numerator in 1u32..=7,
            denominator in 1u32..=14,
        ) {
            let habit = HabitConfig::boolean("Prop", Frequency::new(numerator, denominator).unwrap());
            let statuses: Vec<_> = codes
                .iter()
                .map(|code| EntryStatus::from_code(*code).unwrap())
                .collect();
            let points = run(&habit, &boolean_entries(&habit, date(2024, 1, 1), &statuses));
            prop_assert_eq!(points.len(), statuses.len());
            prop_assert!(points.iter().all(|p| (0.0..=1.0).contains(&p.score)));
        }
    }
}
