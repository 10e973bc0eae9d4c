//! The visible work week and the per-day assembly of segments.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime};
use chrono_tz::Tz;

use crate::error::{EngineError, Result};
use crate::normalize::localize;
use crate::span::DaySegment;

/// Number of visible days, Monday through Friday.
pub const VISIBLE_DAYS: u64 = 5;

/// Monday 00:00 through Friday 23:59:59 local time of one ISO week.
#[derive(Debug, Clone, PartialEq)]
pub struct WeekWindow {
    tz: Tz,
    monday: NaiveDate,
    start: DateTime<Tz>,
    end: DateTime<Tz>,
}

impl WeekWindow {
    /// The window of the ISO week containing `date`.
    ///
    /// # Errors
    /// Returns `EngineError::Window` if the week is outside chrono's date range.
    pub fn containing(date: NaiveDate, tz: Tz) -> Result<Self> {
        let out_of_range = || EngineError::Window(date.to_string());
        let monday = date
            .checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_monday())))
            .ok_or_else(out_of_range)?;
        let friday = monday
            .checked_add_days(Days::new(VISIBLE_DAYS - 1))
            .ok_or_else(out_of_range)?;
        let last_second = NaiveTime::from_hms_opt(23, 59, 59).ok_or_else(out_of_range)?;

        Ok(WeekWindow {
            tz,
            monday,
            start: localize(monday.and_time(NaiveTime::MIN), &tz),
            end: localize(friday.and_time(last_second), &tz),
        })
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn start(&self) -> DateTime<Tz> {
        self.start
    }

    pub fn end(&self) -> DateTime<Tz> {
        self.end
    }

    pub fn monday(&self) -> NaiveDate {
        self.monday
    }

    pub fn friday(&self) -> NaiveDate {
        self.end.date_naive()
    }

    pub fn visible_days(&self) -> BTreeSet<NaiveDate> {
        self.monday.iter_days().take(VISIBLE_DAYS as usize).collect()
    }

    pub fn iso_week(&self) -> u32 {
        self.monday.iso_week().week()
    }
}

/// Bucket segments into the visible days and order each bucket.
///
/// Every visible day is present in the result. Within a day, all-day segments
/// come first, then by occurrence start, then by summary ignoring case; full
/// ties keep insertion order.
pub fn assemble(
    segments: impl IntoIterator<Item = (NaiveDate, DaySegment)>,
    visible_days: &BTreeSet<NaiveDate>,
) -> BTreeMap<NaiveDate, Vec<DaySegment>> {
    let mut days: BTreeMap<NaiveDate, Vec<DaySegment>> =
        visible_days.iter().map(|day| (*day, Vec::new())).collect();

    for (day, segment) in segments {
        if let Some(bucket) = days.get_mut(&day) {
            bucket.push(segment);
        }
    }

    for bucket in days.values_mut() {
        bucket.sort_by_cached_key(|segment| {
            (
                !segment.all_day,
                segment.starts_at,
                segment.summary.to_lowercase(),
            )
        });
    }
    days
}
