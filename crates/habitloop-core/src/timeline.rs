//! Dense day-by-day timeline built from sparse check-ins.
//!
//! The score and streak engines both walk a gap-free, strictly ascending
//! sequence of days. Days without a check-in are filled with a not-done
//! record so the engines never have to reason about missing dates.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::checkin::{CheckinEntry, EntryStatus};
use crate::error::{CoreError, Result};

/// One calendar day of a habit's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRecord {
    pub date: NaiveDate,
    pub status: EntryStatus,
    pub value: i64,
    /// `false` when the day was gap-filled rather than checked in
    pub recorded: bool,
}

impl DayRecord {
    /// Sentinel for a day with no check-in.
    pub fn missing(date: NaiveDate) -> Self {
        Self {
            date,
            status: EntryStatus::NotDone,
            value: 0,
            recorded: false,
        }
    }

    fn from_entry(entry: &CheckinEntry) -> Self {
        Self {
            date: entry.date,
            status: entry.status,
            value: entry.value,
            recorded: true,
        }
    }
}

/// Ascending, gap-free run of [`DayRecord`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
    days: Vec<DayRecord>,
}

impl Timeline {
    pub fn days(&self) -> &[DayRecord] {
        &self.days
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// First day, `None` for an empty timeline.
    pub fn from_date(&self) -> Option<NaiveDate> {
        self.days.first().map(|d| d.date)
    }

    /// Last day, `None` for an empty timeline.
    pub fn to_date(&self) -> Option<NaiveDate> {
        self.days.last().map(|d| d.date)
    }

    /// Record for `date`, if it falls inside the timeline.
    pub fn get(&self, date: NaiveDate) -> Option<&DayRecord> {
        let first = self.from_date()?;
        let offset = usize::try_from((date - first).num_days()).ok()?;
        self.days.get(offset)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DayRecord> {
        self.days.iter()
    }
}

impl<'a> IntoIterator for &'a Timeline {
    type Item = &'a DayRecord;
    type IntoIter = std::slice::Iter<'a, DayRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.days.iter()
    }
}

/// Build a dense timeline from check-ins.
///
/// The effective range is the union of `[from, to]` and the span of dates
/// present in `entries`; a missing bound falls back to the entries' own
/// span. No entries means an empty timeline. When two entries share a date
/// the later one in `entries` wins.
///
/// # Errors
///
/// Returns [`CoreError::EmptyRange`] when both bounds are given and `to`
/// precedes `from`.
pub fn build_timeline(
    entries: &[CheckinEntry],
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<Timeline> {
    if let (Some(from), Some(to)) = (from, to) {
        if to < from {
            return Err(CoreError::EmptyRange { from, to });
        }
    }

    let by_date: BTreeMap<NaiveDate, &CheckinEntry> =
        entries.iter().map(|entry| (entry.date, entry)).collect();

    let (Some((&first, _)), Some((&last, _))) =
        (by_date.first_key_value(), by_date.last_key_value())
    else {
        return Ok(Timeline::default());
    };

    if from.is_some_and(|from| first < from) || to.is_some_and(|to| last > to) {
        warn!(
            %first,
            %last,
            ?from,
            ?to,
            "check-ins fall outside the requested window; widening range"
        );
    }

    let start = from.map_or(first, |from| from.min(first));
    let end = to.map_or(last, |to| to.max(last));

    let span = (end - start).num_days() as usize + 1;
    let mut days = Vec::with_capacity(span);
    let mut date = start;
    while date <= end {
        let record = by_date
            .get(&date)
            .map_or_else(|| DayRecord::missing(date), |entry| DayRecord::from_entry(entry));
        days.push(record);
        let Some(next) = date.checked_add_days(Days::new(1)) else {
            break;
        };
        date = next;
    }

    debug!(
        %start,
        %end,
        days = days.len(),
        checkins = by_date.len(),
        "built timeline"
    );

    Ok(Timeline { days })
}
