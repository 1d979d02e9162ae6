//! Streak detection and ranking.
//!
//! A streak is a maximal run of consecutive qualifying days. Any day that
//! does not qualify, including a day with no check-in at all, ends the run.

use std::cmp::Ordering;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::checkin::{CheckinEntry, EntryStatus};
use crate::error::{CoreError, Result};
use crate::habit::{HabitConfig, HabitKind, HabitTarget, TargetType};
use crate::timeline::{build_timeline, DayRecord, Timeline};

/// Days looked back when computing the current streak.
pub const DEFAULT_CURRENT_LOOKBACK_DAYS: u32 = 365;
/// Days looked back when computing the best streak.
pub const DEFAULT_BEST_LOOKBACK_DAYS: u32 = 730;
/// Streaks kept by [`rank_streaks`] in a summary.
pub const DEFAULT_BEST_LIMIT: usize = 10;

/// A run of consecutive qualifying days, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Streak {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Streak {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Length in days, `0` when `end` precedes `start`.
    pub fn length(&self) -> u32 {
        let days = (self.end - self.start).num_days();
        u32::try_from(days.saturating_add(1)).unwrap_or(0)
    }

    /// Longer first, then more recent.
    pub fn compare_longer(&self, other: &Streak) -> Ordering {
        self.length()
            .cmp(&other.length())
            .then_with(|| self.compare_newer(other))
    }

    /// By end date.
    pub fn compare_newer(&self, other: &Streak) -> Ordering {
        self.end.cmp(&other.end)
    }
}

/// Decides whether a day extends a streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qualification {
    /// Yes/no habit: the day was completed or skipped
    Completed,
    /// Numerical habit: the day's value meets the target
    Target(HabitTarget),
}

impl Qualification {
    pub fn for_habit(kind: &HabitKind) -> Self {
        match kind {
            HabitKind::Boolean => Qualification::Completed,
            HabitKind::Numerical { target } => Qualification::Target(*target),
        }
    }

    /// Gap-filled days never qualify.
    pub fn qualifies(&self, day: &DayRecord) -> bool {
        if !day.recorded {
            return false;
        }
        match self {
            Qualification::Completed => {
                day.status.is_done() || day.status == EntryStatus::Skipped
            }
            Qualification::Target(target) => match target.target_type {
                TargetType::AtLeast => target.is_met_by(day.value),
                TargetType::AtMost => {
                    day.status != EntryStatus::Unknown && target.is_met_by(day.value)
                }
            },
        }
    }
}

/// Group the qualifying days of `timeline` into streaks, oldest first.
pub fn find_streaks(timeline: &Timeline, qualification: Qualification) -> Vec<Streak> {
    let qualifying = timeline
        .iter()
        .filter(|day| qualification.qualifies(day))
        .map(|day| day.date);
    group_consecutive(qualifying)
}

/// Merge ascending dates into runs of consecutive calendar days.
pub fn group_consecutive<I>(dates: I) -> Vec<Streak>
where
    I: IntoIterator<Item = NaiveDate>,
{
    let mut streaks = Vec::new();
    let mut open: Option<Streak> = None;

    for date in dates {
        match open.as_mut() {
            Some(streak) if streak.end.checked_add_days(Days::new(1)) == Some(date) => {
                streak.end = date;
            }
            _ => {
                if let Some(closed) = open.replace(Streak::new(date, date)) {
                    trace!(start = %closed.start, end = %closed.end, "streak closed");
                    streaks.push(closed);
                }
            }
        }
    }
    streaks.extend(open);
    streaks
}

/// Keep the `limit` best streaks, newest first.
///
/// "Best" is longest, ties going to the more recent streak.
pub fn rank_streaks(streaks: &[Streak], limit: usize) -> Vec<Streak> {
    let mut best = streaks.to_vec();
    best.sort_by(|a, b| b.compare_longer(a));
    best.truncate(limit);
    best.sort_by(|a, b| b.compare_newer(a));
    best
}

/// Lookback windows for current and best streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakSettings {
    pub current_lookback_days: u32,
    /// `None` scans the full history
    pub best_lookback_days: Option<u32>,
    pub best_limit: usize,
}

impl Default for StreakSettings {
    fn default() -> Self {
        Self {
            current_lookback_days: DEFAULT_CURRENT_LOOKBACK_DAYS,
            best_lookback_days: Some(DEFAULT_BEST_LOOKBACK_DAYS),
            best_limit: DEFAULT_BEST_LIMIT,
        }
    }
}

/// Current, best and ranked streaks for one habit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakSummary {
    pub current_streak: u32,
    pub best_streak: u32,
    pub total_streaks: usize,
    /// Best streaks, newest first
    pub streaks: Vec<Streak>,
}

/// Streak computations for one habit.
#[derive(Debug, Clone)]
pub struct StreakEngine {
    qualification: Qualification,
    settings: StreakSettings,
}

impl StreakEngine {
    /// Engine with default lookback windows.
    ///
    /// # Errors
    ///
    /// Returns an error if the habit configuration does not validate.
    pub fn new(habit: &HabitConfig) -> Result<Self> {
        Self::with_settings(habit, StreakSettings::default())
    }

    pub fn with_settings(habit: &HabitConfig, settings: StreakSettings) -> Result<Self> {
        habit.validate()?;
        Ok(Self {
            qualification: Qualification::for_habit(&habit.kind),
            settings,
        })
    }

    pub fn settings(&self) -> &StreakSettings {
        &self.settings
    }

    /// All streaks with check-ins in `[from, to]`, oldest first.
    ///
    /// Check-ins outside the window are ignored. A missing bound leaves that
    /// side open. Only the span of the remaining check-ins is walked, so a
    /// wide window costs nothing beyond the data inside it.
    ///
    /// # Errors
    ///
    /// Returns `EmptyRange` when `to` precedes `from`.
    pub fn streaks(
        &self,
        entries: &[CheckinEntry],
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<Streak>> {
        if let (Some(from), Some(to)) = (from, to) {
            if to < from {
                return Err(CoreError::EmptyRange { from, to });
            }
        }
        let in_window: Vec<CheckinEntry> = entries
            .iter()
            .filter(|entry| from.map_or(true, |from| entry.date >= from))
            .filter(|entry| to.map_or(true, |to| entry.date <= to))
            .cloned()
            .collect();
        let timeline = build_timeline(&in_window, None, None)?;
        let streaks = find_streaks(&timeline, self.qualification);
        debug!(?from, ?to, streaks = streaks.len(), "computed streaks");
        Ok(streaks)
    }

    /// Length of the streak still running as of `today`.
    ///
    /// A streak is current when it ended today or yesterday; otherwise `0`.
    pub fn current_streak(&self, entries: &[CheckinEntry], today: NaiveDate) -> Result<u32> {
        let from = lookback_start(today, Some(self.settings.current_lookback_days));
        let streaks = self.streaks(entries, from, Some(today))?;
        Ok(current_length(&streaks, today))
    }

    /// Streaks inside the best-streak lookback window ending `today`.
    pub fn best_window_streaks(
        &self,
        entries: &[CheckinEntry],
        today: NaiveDate,
    ) -> Result<Vec<Streak>> {
        let from = lookback_start(today, self.settings.best_lookback_days);
        self.streaks(entries, from, Some(today))
    }

    /// Longest streak inside the best-streak lookback window ending `today`.
    ///
    /// With a bounded window this is not necessarily the all-time best.
    pub fn best_streak(&self, entries: &[CheckinEntry], today: NaiveDate) -> Result<u32> {
        Ok(longest(&self.best_window_streaks(entries, today)?))
    }

    /// Current, best and ranked streaks in one pass per window.
    pub fn summarize(&self, entries: &[CheckinEntry], today: NaiveDate) -> Result<StreakSummary> {
        let streaks = self.best_window_streaks(entries, today)?;
        Ok(StreakSummary {
            current_streak: self.current_streak(entries, today)?,
            best_streak: longest(&streaks),
            total_streaks: streaks.len(),
            streaks: rank_streaks(&streaks, self.settings.best_limit),
        })
    }
}

fn lookback_start(today: NaiveDate, days: Option<u32>) -> Option<NaiveDate> {
    days.map(|days| {
        today
            .checked_sub_days(Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MIN)
    })
}

fn current_length(streaks: &[Streak], today: NaiveDate) -> u32 {
    match streaks.last() {
        Some(last) if (today - last.end).num_days() <= 1 => last.length(),
        _ => 0,
    }
}

fn longest(streaks: &[Streak]) -> u32 {
    streaks.iter().map(Streak::length).max().unwrap_or(0)
}
