//! Habit configuration consumed by the analytics engines.

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::checkin::CheckinEntry;
use crate::error::{CoreError, Result, ValidationError};

/// Largest numerator or denominator accepted for a frequency.
pub const MAX_FREQUENCY_PART: u32 = 365;

/// "numerator occurrences expected per denominator days".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frequency {
    pub numerator: u32,
    pub denominator: u32,
}

impl Frequency {
    /// Once per day.
    pub const DAILY: Frequency = Frequency {
        numerator: 1,
        denominator: 1,
    };

    /// Create a frequency, rejecting parts outside `1..=365`.
    pub fn new(numerator: u32, denominator: u32) -> Result<Self> {
        let frequency = Self {
            numerator,
            denominator,
        };
        frequency.validate()?;
        Ok(frequency)
    }

    /// `times` occurrences per seven days.
    pub fn weekly(times: u32) -> Result<Self> {
        Self::new(times, 7)
    }

    /// Check both parts are in range.
    pub fn validate(&self) -> Result<()> {
        let in_range = |part: u32| (1..=MAX_FREQUENCY_PART).contains(&part);
        if in_range(self.numerator) && in_range(self.denominator) {
            Ok(())
        } else {
            Err(CoreError::InvalidFrequency {
                numerator: self.numerator,
                denominator: self.denominator,
            })
        }
    }

    /// Expected occurrences per day.
    pub fn per_day(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    /// At least once a day.
    pub fn is_daily(&self) -> bool {
        self.numerator >= self.denominator
    }
}

impl Default for Frequency {
    fn default() -> Self {
        Self::DAILY
    }
}

/// Direction of a numerical target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    /// Success means meeting or exceeding the target
    #[default]
    AtLeast,
    /// Success means staying at or under the target
    AtMost,
}

/// Target for a numerical habit. `value` is in thousandths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitTarget {
    pub value: i64,
    #[serde(default)]
    pub target_type: TargetType,
}

impl HabitTarget {
    pub fn at_least(value: i64) -> Self {
        Self {
            value,
            target_type: TargetType::AtLeast,
        }
    }

    pub fn at_most(value: i64) -> Self {
        Self {
            value,
            target_type: TargetType::AtMost,
        }
    }

    /// Whether a single day's value meets the target.
    pub fn is_met_by(&self, value: i64) -> bool {
        match self.target_type {
            TargetType::AtLeast => value >= self.value,
            TargetType::AtMost => value <= self.value,
        }
    }
}

/// Boolean (yes/no) or numerical habit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HabitKind {
    #[default]
    Boolean,
    Numerical { target: HabitTarget },
}

impl HabitKind {
    pub fn numerical(target: HabitTarget) -> Self {
        HabitKind::Numerical { target }
    }

    pub fn target(&self) -> Option<&HabitTarget> {
        match self {
            HabitKind::Boolean => None,
            HabitKind::Numerical { target } => Some(target),
        }
    }

    pub fn is_numerical(&self) -> bool {
        matches!(self, HabitKind::Numerical { .. })
    }
}

/// Seven-bit weekday mask, bit 0 = Monday through bit 6 = Sunday.
///
/// Consumed by reminder scheduling, not by score or streak math.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct WeekdaySchedule(u8);

impl WeekdaySchedule {
    pub const EVERY_DAY: WeekdaySchedule = WeekdaySchedule(0b111_1111);

    pub fn new(mask: u8) -> Result<Self, ValidationError> {
        if mask > Self::EVERY_DAY.0 {
            return Err(ValidationError::InvalidWeekdayMask(mask));
        }
        Ok(Self(mask))
    }

    pub fn mask(&self) -> u8 {
        self.0
    }

    pub fn is_enabled(&self, weekday: Weekday) -> bool {
        self.0 & (1 << weekday.num_days_from_monday()) != 0
    }

    /// Enabled weekdays, Monday first.
    pub fn enabled_days(&self) -> Vec<Weekday> {
        let mut days = Vec::new();
        let mut day = Weekday::Mon;
        for _ in 0..7 {
            if self.is_enabled(day) {
                days.push(day);
            }
            day = day.succ();
        }
        days
    }
}

impl Default for WeekdaySchedule {
    fn default() -> Self {
        Self::EVERY_DAY
    }
}

impl TryFrom<u8> for WeekdaySchedule {
    type Error = ValidationError;

    fn try_from(mask: u8) -> Result<Self, Self::Error> {
        Self::new(mask)
    }
}

impl From<WeekdaySchedule> for u8 {
    fn from(schedule: WeekdaySchedule) -> Self {
        schedule.0
    }
}

/// Everything the engines need to know about a habit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitConfig {
    pub habit_id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub kind: HabitKind,
    #[serde(default)]
    pub frequency: Frequency,
    #[serde(default)]
    pub schedule: WeekdaySchedule,
}

impl HabitConfig {
    /// Daily yes/no habit with a fresh id.
    pub fn boolean(name: impl Into<String>, frequency: Frequency) -> Self {
        Self {
            habit_id: Uuid::new_v4(),
            name: name.into(),
            kind: HabitKind::Boolean,
            frequency,
            schedule: WeekdaySchedule::default(),
        }
    }

    /// Numerical habit with a fresh id.
    pub fn numerical(name: impl Into<String>, frequency: Frequency, target: HabitTarget) -> Self {
        Self {
            habit_id: Uuid::new_v4(),
            name: name.into(),
            kind: HabitKind::numerical(target),
            frequency,
            schedule: WeekdaySchedule::default(),
        }
    }

    pub fn with_schedule(mut self, schedule: WeekdaySchedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Validate frequency bounds and target sign.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFrequency` for an out-of-range frequency and a
    /// validation error for a negative target.
    pub fn validate(&self) -> Result<()> {
        self.frequency.validate()?;
        if let Some(target) = self.kind.target() {
            if target.value < 0 {
                return Err(ValidationError::InvalidValue {
                    field: "target.value".into(),
                    message: format!("must be non-negative, got {}", target.value),
                }
                .into());
            }
        }
        Ok(())
    }
}

/// A habit together with its check-in history, as handed over by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitHistory {
    pub habit: HabitConfig,
    #[serde(default)]
    pub entries: Vec<CheckinEntry>,
}

impl HabitHistory {
    pub fn new(habit: HabitConfig, entries: Vec<CheckinEntry>) -> Self {
        Self { habit, entries }
    }
}
