//! Split an occurrence's `[start, end)` interval into per-day display segments.
//!
//! The end instant is exclusive: an occurrence that is all-day, or that ends
//! exactly at midnight after its start, does not touch its end date.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Days, NaiveDate, NaiveTime};
use chrono_tz::Tz;
use serde::{Serialize, Serializer};

use crate::normalize::CanonicalInstant;
use crate::registry::Occurrence;

/// The time text shown for one occurrence on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeLabel {
    AllDay,
    Range { start: NaiveTime, end: NaiveTime },
    Starts(NaiveTime),
    Ends(NaiveTime),
}

impl fmt::Display for TimeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeLabel::AllDay => f.write_str("all-day"),
            TimeLabel::Range { start, end } => {
                write!(f, "{} – {}", start.format("%H:%M"), end.format("%H:%M"))
            }
            TimeLabel::Starts(start) => write!(f, "Start: {}", start.format("%H:%M")),
            TimeLabel::Ends(end) => write!(f, "End: {}", end.format("%H:%M")),
        }
    }
}

impl Serialize for TimeLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One occurrence's contribution to one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySegment {
    pub label: TimeLabel,
    pub all_day: bool,
    /// Start of the whole occurrence, whichever day this segment is on.
    pub starts_at: DateTime<Tz>,
    pub summary: String,
    pub location: String,
}

/// The last calendar day an occurrence covers.
pub fn last_included_day(start: &CanonicalInstant, end: &CanonicalInstant) -> NaiveDate {
    let end_date = end.date();
    if (start.all_day || end.is_midnight()) && end.at > start.at {
        end_date.pred_opt().unwrap_or(end_date)
    } else {
        end_date
    }
}

/// Every calendar day from the start day through [`last_included_day`].
///
/// Empty when the end lies before the start.
pub fn touched_days(start: &CanonicalInstant, end: &CanonicalInstant) -> BTreeSet<NaiveDate> {
    let last = last_included_day(start, end);
    start
        .date()
        .iter_days()
        .take_while(|day| *day <= last)
        .collect()
}

/// Segments for the days both touched by `occurrence` and in `visible_days`.
pub fn split(
    occurrence: &Occurrence,
    visible_days: &BTreeSet<NaiveDate>,
) -> Vec<(NaiveDate, DaySegment)> {
    let last_day = last_included_day(&occurrence.start, &occurrence.end);
    occurrence
        .days
        .iter()
        .filter(|day| visible_days.contains(day))
        .map(|&day| {
            let label = label_for(day, &occurrence.start, &occurrence.end, last_day);
            let segment = DaySegment {
                label,
                all_day: label == TimeLabel::AllDay,
                starts_at: occurrence.start.at,
                summary: occurrence.summary.clone(),
                location: occurrence.location.clone(),
            };
            (day, segment)
        })
        .collect()
}

fn label_for(
    day: NaiveDate,
    start: &CanonicalInstant,
    end: &CanonicalInstant,
    last_day: NaiveDate,
) -> TimeLabel {
    if start.all_day {
        return TimeLabel::AllDay;
    }
    if start.date() == end.date() {
        return TimeLabel::Range {
            start: start.time(),
            end: end.time(),
        };
    }
    if day == start.date() {
        let ends_next_midnight =
            end.is_midnight() && start.date().checked_add_days(Days::new(1)) == Some(end.date());
        if !ends_next_midnight {
            return TimeLabel::Starts(start.time());
        }
        return if start.is_midnight() {
            TimeLabel::AllDay
        } else {
            TimeLabel::Range {
                start: start.time(),
                end: NaiveTime::MIN,
            }
        };
    }
    if day == last_day && end.time() > NaiveTime::MIN {
        return TimeLabel::Ends(end.time());
    }
    TimeLabel::AllDay
}
