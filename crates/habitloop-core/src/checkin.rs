//! Check-in records.
//!
//! A check-in is the raw fact that a habit was acted on (or explicitly
//! skipped) on a calendar day. Records are owned by whatever store the caller
//! uses; the core only reads them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Status of a habit on one day.
///
/// Legacy stores encode these as small integers; see [`EntryStatus::code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    /// Expected but not performed
    #[default]
    NotDone,
    /// Not expected on this day given the habit's schedule
    DoneAuto,
    /// Performed and checked in by the user
    DoneManual,
    /// Explicitly skipped; does not count for or against the habit
    Skipped,
    /// No data for the day
    Unknown,
}

impl EntryStatus {
    /// Integer code used by legacy stores.
    pub fn code(self) -> i64 {
        match self {
            EntryStatus::NotDone => 0,
            EntryStatus::DoneAuto => 1,
            EntryStatus::DoneManual => 2,
            EntryStatus::Skipped => 3,
            EntryStatus::Unknown => -1,
        }
    }

    /// Parse a legacy integer code.
    pub fn from_code(code: i64) -> Result<Self, ValidationError> {
        match code {
            0 => Ok(EntryStatus::NotDone),
            1 => Ok(EntryStatus::DoneAuto),
            2 => Ok(EntryStatus::DoneManual),
            3 => Ok(EntryStatus::Skipped),
            -1 => Ok(EntryStatus::Unknown),
            other => Err(ValidationError::UnknownStatusCode(other)),
        }
    }

    /// Whether the status records a positive completion.
    pub fn is_done(self) -> bool {
        match self {
            EntryStatus::DoneAuto | EntryStatus::DoneManual => true,
            EntryStatus::NotDone | EntryStatus::Skipped | EntryStatus::Unknown => false,
        }
    }

    /// Next status when the user taps a check-in cell.
    ///
    /// Cycle: auto → manual → skipped → not done → unknown → manual. Skipped
    /// and unknown are left out of the cycle when their feature is disabled.
    pub fn next_toggle(self, skip_enabled: bool, question_marks_enabled: bool) -> Self {
        match self {
            EntryStatus::DoneAuto => EntryStatus::DoneManual,
            EntryStatus::DoneManual if skip_enabled => EntryStatus::Skipped,
            EntryStatus::DoneManual => EntryStatus::NotDone,
            EntryStatus::Skipped => EntryStatus::NotDone,
            EntryStatus::NotDone if question_marks_enabled => EntryStatus::Unknown,
            EntryStatus::NotDone => EntryStatus::DoneManual,
            EntryStatus::Unknown => EntryStatus::DoneManual,
        }
    }
}

/// One check-in for one habit on one day.
///
/// `value` is in thousandths for numerical habits (1500 = 1.5 units) and the
/// status code for boolean habits. Unique per `(habit_id, date)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckinEntry {
    pub habit_id: Uuid,
    pub date: NaiveDate,
    #[serde(default)]
    pub value: i64,
    #[serde(default)]
    pub status: EntryStatus,
}

impl CheckinEntry {
    /// Check-in for a yes/no habit.
    pub fn boolean(habit_id: Uuid, date: NaiveDate, status: EntryStatus) -> Self {
        Self {
            habit_id,
            date,
            value: status.code(),
            status,
        }
    }

    /// Check-in for a numerical habit; `value` in thousandths.
    pub fn numerical(habit_id: Uuid, date: NaiveDate, value: i64) -> Self {
        let status = if value > 0 {
            EntryStatus::DoneManual
        } else {
            EntryStatus::NotDone
        };
        Self {
            habit_id,
            date,
            value,
            status,
        }
    }

    /// Same check-in with a different status, value untouched.
    pub fn with_status(mut self, status: EntryStatus) -> Self {
        self.status = status;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_status_codes_round_trip() {
        for status in [
            EntryStatus::NotDone,
            EntryStatus::DoneAuto,
            EntryStatus::DoneManual,
            EntryStatus::Skipped,
            EntryStatus::Unknown,
        ] {
            assert_eq!(EntryStatus::from_code(status.code()), Ok(status));
        }
    }

    #[test]
    fn test_unknown_code_rejected() {
        assert_eq!(
            EntryStatus::from_code(42),
            Err(ValidationError::UnknownStatusCode(42))
        );
    }

    #[test]
    fn test_toggle_cycle_with_all_features() {
        let mut status = EntryStatus::DoneAuto;
        let mut seen = vec![status];
        for _ in 0..5 {
            status = status.next_toggle(true, true);
            seen.push(status);
        }
        assert_eq!(
            seen,
            vec![
                EntryStatus::DoneAuto,
                EntryStatus::DoneManual,
                EntryStatus::Skipped,
                EntryStatus::NotDone,
                EntryStatus::Unknown,
                EntryStatus::DoneManual,
            ]
        );
    }

    #[test]
    fn test_toggle_without_skip_or_question_marks() {
        assert_eq!(
            EntryStatus::DoneManual.next_toggle(false, true),
            EntryStatus::NotDone
        );
        assert_eq!(
            EntryStatus::NotDone.next_toggle(true, false),
            EntryStatus::DoneManual
        );
    }

    #[test]
    fn test_numerical_constructor_sets_status() {
        let id = Uuid::new_v4();
        assert_eq!(
            CheckinEntry::numerical(id, date(2024, 1, 1), 1500).status,
            EntryStatus::DoneManual
        );
        assert_eq!(
            CheckinEntry::numerical(id, date(2024, 1, 1), 0).status,
            EntryStatus::NotDone
        );
    }

    #[test]
    fn test_entry_deserializes_with_defaults() {
        let json = r#"{"habit_id":"6f9619ff-8b86-d011-b42d-00cf4fc964ff","date":"2024-03-01","status":"done_manual"}"#;
        let entry: CheckinEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.date, date(2024, 3, 1));
        assert_eq!(entry.value, 0);
        assert_eq!(entry.status, EntryStatus::DoneManual);
    }
}
