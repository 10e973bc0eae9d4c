//! RFC 5545 recurrence patterns (Section 3.8.5) queried through a work-week window.
//!
//! Each vector starts well before the window so that the expander has to walk
//! the rule forward and only keep the instances of the visible week.

use chrono::{Datelike, NaiveDate, TimeDelta};
use chrono_tz::Tz;
use weekboard_engine::expander::expand;
use weekboard_engine::{normalize, CanonicalInstant, RawTime, WeekWindow};

const TZ: Tz = chrono_tz::Europe::Vienna;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn dates(instants: &[CanonicalInstant]) -> Vec<(i32, u32, u32)> {
    instants
        .iter()
        .map(|i| (i.at.year(), i.at.month(), i.at.day()))
        .collect()
}

fn expand_in_week_of(rule: &str, dtstart: (i32, u32, u32), week_of: (i32, u32, u32)) -> Vec<CanonicalInstant> {
    let start = normalize(
        &RawTime::Floating(
            NaiveDate::from_ymd_opt(dtstart.0, dtstart.1, dtstart.2)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
        ),
        &TZ,
    );
    let window = WeekWindow::containing(
        NaiveDate::from_ymd_opt(week_of.0, week_of.1, week_of.2).unwrap(),
        TZ,
    )
    .unwrap();
    expand(rule, &start, TimeDelta::hours(1), &[], window.start(), window.end())
        .expect("vector should expand")
}

// ===========================================================================
// 1. Every other week on Tuesday and Thursday
// ===========================================================================

#[test]
fn biweekly_tue_thu_skips_off_weeks() {
    // Active weeks: Jan 5, Jan 19, Feb 2, Feb 16, Mar 2, Mar 16, ...
    let off = expand_in_week_of("FREQ=WEEKLY;INTERVAL=2;BYDAY=TU,TH", (2026, 1, 6), (2026, 3, 11));
    assert!(off.is_empty(), "week of Mar 9 is an off week");

    let on = expand_in_week_of("FREQ=WEEKLY;INTERVAL=2;BYDAY=TU,TH", (2026, 1, 6), (2026, 3, 18));
    assert_eq!(dates(&on), vec![(2026, 3, 17), (2026, 3, 19)]);
}

// ===========================================================================
// 2. Weekly on several days
// ===========================================================================

#[test]
fn weekly_mon_wed_fri() {
    let result = expand_in_week_of("FREQ=WEEKLY;BYDAY=MO,WE,FR", (2026, 1, 5), (2026, 3, 11));
    assert_eq!(
        dates(&result),
        vec![(2026, 3, 9), (2026, 3, 11), (2026, 3, 13)]
    );
}

// ===========================================================================
// 3. Monthly on the second Wednesday
// ===========================================================================

#[test]
fn monthly_second_wednesday() {
    let result = expand_in_week_of("FREQ=MONTHLY;BYDAY=2WE", (2026, 1, 14), (2026, 3, 11));
    assert_eq!(dates(&result), vec![(2026, 3, 11)]);
}

// ===========================================================================
// 4. Last weekday of the month (BYSETPOS=-1)
// ===========================================================================

#[test]
fn monthly_last_weekday() {
    let result = expand_in_week_of(
        "FREQ=MONTHLY;BYDAY=MO,TU,WE,TH,FR;BYSETPOS=-1",
        (2026, 1, 30),
        (2026, 4, 1),
    );
    assert_eq!(dates(&result), vec![(2026, 3, 31)]);
}

// ===========================================================================
// 5. Yearly anniversary, years before the window
// ===========================================================================

#[test]
fn yearly_by_month_day() {
    let result = expand_in_week_of("FREQ=YEARLY;BYMONTH=3;BYMONTHDAY=12", (2020, 3, 12), (2026, 3, 11));
    assert_eq!(dates(&result), vec![(2026, 3, 12)]);
}

// ===========================================================================
// 6. Every third day (INTERVAL with DAILY)
// ===========================================================================

#[test]
fn every_third_day() {
    // Mar 1, 4, 7, 10, 13, ...
    let result = expand_in_week_of("FREQ=DAILY;INTERVAL=3", (2026, 3, 1), (2026, 3, 11));
    assert_eq!(dates(&result), vec![(2026, 3, 10), (2026, 3, 13)]);
}
