//! Time normalization -- canonicalizes date and date-time values into the run's local zone.
//!
//! Calendar feeds mix date-only values (all-day events), floating date-times,
//! UTC date-times and date-times carrying a `TZID`. Everything downstream works
//! on [`CanonicalInstant`], which is always expressed in one local timezone and
//! therefore comparable by simple ordering.

use chrono::{
    DateTime, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeDelta, TimeZone, Utc,
};
use chrono_tz::Tz;
use serde::Serialize;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use tracing::warn;

use crate::error::{EngineError, Result};

/// A temporal property value as it appears in the feed, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawTime {
    /// `VALUE=DATE` -- a calendar day with no time of day.
    Date(NaiveDate),
    /// A date-time without zone information; taken as local wall time.
    Floating(NaiveDateTime),
    /// A date-time with the `Z` suffix.
    Utc(DateTime<Utc>),
    /// A date-time qualified by a `TZID` parameter.
    Zoned { datetime: NaiveDateTime, tzid: String },
}

impl RawTime {
    pub fn is_date(&self) -> bool {
        matches!(self, RawTime::Date(_))
    }
}

/// A point in time in the run's local zone, plus the all-day flag.
///
/// All-day instants sit at local midnight, except on days whose midnight
/// falls in a DST gap (e.g. `America/Santiago` in September); there they
/// carry the first wall time after the gap. Day logic keys off `all_day`
/// and [`CanonicalInstant::date`], never off [`CanonicalInstant::is_midnight`].
///
/// Equality, hashing and ordering only consider the point in time: an all-day
/// exclusion on a day matches a timed instance at local midnight of that day.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CanonicalInstant {
    pub at: DateTime<Tz>,
    pub all_day: bool,
}

impl CanonicalInstant {
    pub fn timed(at: DateTime<Tz>) -> Self {
        CanonicalInstant { at, all_day: false }
    }

    /// Local midnight of `date`, flagged all-day.
    pub fn all_day_on(date: NaiveDate, tz: &Tz) -> Self {
        CanonicalInstant {
            at: localize(date.and_time(NaiveTime::MIN), tz),
            all_day: true,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.at.date_naive()
    }

    pub fn time(&self) -> NaiveTime {
        self.at.time()
    }

    pub fn is_midnight(&self) -> bool {
        self.time() == NaiveTime::MIN
    }

    /// Shift by `delta` of wall-clock time, keeping the all-day flag.
    ///
    /// A one-day all-day event stays midnight-to-midnight across a DST change.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidValue` if the result is outside chrono's range.
    pub fn shifted(&self, delta: TimeDelta) -> Result<Self> {
        let wall = self
            .at
            .naive_local()
            .checked_add_signed(delta)
            .ok_or_else(|| EngineError::invalid_value("DURATION", &delta.to_string()))?;
        Ok(CanonicalInstant {
            at: localize(wall, &self.at.timezone()),
            all_day: self.all_day,
        })
    }

    /// Wall-clock distance from `self` to `later`.
    pub fn wall_duration_to(&self, later: &CanonicalInstant) -> TimeDelta {
        later.at.naive_local() - self.at.naive_local()
    }
}

impl PartialEq for CanonicalInstant {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at
    }
}

impl Eq for CanonicalInstant {}

impl Hash for CanonicalInstant {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.at.hash(state);
    }
}

impl PartialOrd for CanonicalInstant {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CanonicalInstant {
    fn cmp(&self, other: &Self) -> Ordering {
        self.at.cmp(&other.at)
    }
}

/// Normalize a raw feed value into local time.
///
/// - Date-only → local midnight, all-day.
/// - Floating → interpreted as local wall time.
/// - UTC or zoned → converted to local time. An unknown `TZID` falls back to
///   local wall time.
pub fn normalize(raw: &RawTime, tz: &Tz) -> CanonicalInstant {
    match raw {
        RawTime::Date(date) => CanonicalInstant::all_day_on(*date, tz),
        RawTime::Floating(naive) => CanonicalInstant::timed(localize(*naive, tz)),
        RawTime::Utc(dt) => CanonicalInstant::timed(dt.with_timezone(tz)),
        RawTime::Zoned { datetime, tzid } => match tzid.trim().parse::<Tz>() {
            Ok(source) => CanonicalInstant::timed(localize(*datetime, &source).with_timezone(tz)),
            Err(_) => {
                warn!(tzid = %tzid, "unknown TZID, treating value as local time");
                CanonicalInstant::timed(localize(*datetime, tz))
            }
        },
    }
}

/// Attach `tz` to a wall-clock time.
///
/// Ambiguous times (DST fall-back) take the earlier offset. Times inside a
/// spring-forward gap are read with the offset in force before the gap, which
/// moves them forward by the gap length.
pub fn localize(naive: NaiveDateTime, tz: &Tz) -> DateTime<Tz> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => {
            let day_before = naive.checked_sub_signed(TimeDelta::days(1)).unwrap_or(naive);
            let before = tz.offset_from_utc_datetime(&day_before).fix();
            let utc = naive
                .checked_sub_signed(TimeDelta::seconds(i64::from(before.local_minus_utc())))
                .unwrap_or(naive);
            tz.from_utc_datetime(&utc)
        }
    }
}
