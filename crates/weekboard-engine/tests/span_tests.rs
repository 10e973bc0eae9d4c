//! Tests for splitting occurrences into per-day segments.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveTime};
use chrono_tz::Tz;
use weekboard_engine::span::{split, touched_days};
use weekboard_engine::{normalize, CanonicalInstant, Occurrence, RawTime, TimeLabel, WeekWindow};

const TZ: Tz = chrono_tz::Europe::Vienna;

fn at(d: u32, h: u32, min: u32) -> CanonicalInstant {
    normalize(
        &RawTime::Floating(
            NaiveDate::from_ymd_opt(2026, 3, d)
                .unwrap()
                .and_hms_opt(h, min, 0)
                .unwrap(),
        ),
        &TZ,
    )
}

fn on(d: u32) -> CanonicalInstant {
    normalize(&RawTime::Date(NaiveDate::from_ymd_opt(2026, 3, d).unwrap()), &TZ)
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
}

fn time(h: u32, min: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, min, 0).unwrap()
}

/// Mon 9 – Fri 13 March 2026.
fn visible() -> BTreeSet<NaiveDate> {
    WeekWindow::containing(day(11), TZ).unwrap().visible_days()
}

fn labels(occurrence: &Occurrence) -> Vec<(u32, String)> {
    use chrono::Datelike;
    split(occurrence, &visible())
        .into_iter()
        .map(|(d, segment)| (d.day(), segment.label.to_string()))
        .collect()
}

// ---------------------------------------------------------------------------
// Single-day occurrences
// ---------------------------------------------------------------------------

#[test]
fn same_day_range() {
    let occurrence = Occurrence::new("standup", at(10, 10, 0), at(10, 11, 0), "Standup", "");
    let segments = split(&occurrence, &visible());

    assert_eq!(segments.len(), 1);
    let (d, segment) = &segments[0];
    assert_eq!(*d, day(10));
    assert_eq!(
        segment.label,
        TimeLabel::Range {
            start: time(10, 0),
            end: time(11, 0)
        }
    );
    assert_eq!(segment.label.to_string(), "10:00 – 11:00");
    assert!(!segment.all_day);
    assert_eq!(segment.starts_at, at(10, 10, 0).at);
}

#[test]
fn zero_length_event_gets_one_segment() {
    let occurrence = Occurrence::new("x", at(11, 15, 0), at(11, 15, 0), "Reminder", "");
    assert_eq!(labels(&occurrence), vec![(11, "15:00 – 15:00".to_string())]);
}

#[test]
fn single_all_day() {
    let occurrence = Occurrence::new("x", on(12), on(13), "Holiday", "");
    let segments = split(&occurrence, &visible());
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].0, day(12));
    assert!(segments[0].1.all_day);
}

// ---------------------------------------------------------------------------
// Midnight boundary
// ---------------------------------------------------------------------------

#[test]
fn nine_to_next_midnight_stays_on_first_day() {
    let occurrence = Occurrence::new("x", at(10, 9, 0), at(11, 0, 0), "Late shift", "");
    assert_eq!(labels(&occurrence), vec![(10, "09:00 – 00:00".to_string())]);
}

#[test]
fn midnight_to_midnight_is_all_day() {
    let occurrence = Occurrence::new("x", at(10, 0, 0), at(11, 0, 0), "Offsite", "");
    let segments = split(&occurrence, &visible());
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].1.label, TimeLabel::AllDay);
    assert!(segments[0].1.all_day, "all-day label implies the all-day flag");
}

// ---------------------------------------------------------------------------
// Multi-day occurrences
// ---------------------------------------------------------------------------

#[test]
fn multi_day_timed_labels() {
    let occurrence = Occurrence::new("x", at(9, 14, 0), at(11, 12, 30), "Conference", "");
    assert_eq!(
        labels(&occurrence),
        vec![
            (9, "Start: 14:00".to_string()),
            (10, "all-day".to_string()),
            (11, "End: 12:30".to_string()),
        ]
    );
}

#[test]
fn multi_day_ending_at_midnight_has_no_end_label() {
    let occurrence = Occurrence::new("x", at(9, 14, 0), at(12, 0, 0), "Trip", "");
    assert_eq!(
        labels(&occurrence),
        vec![
            (9, "Start: 14:00".to_string()),
            (10, "all-day".to_string()),
            (11, "all-day".to_string()),
        ]
    );
}

#[test]
fn all_day_thursday_to_friday_excludes_saturday() {
    let occurrence = Occurrence::new("x", on(12), on(14), "Retreat", "");
    assert_eq!(
        labels(&occurrence),
        vec![(12, "all-day".to_string()), (13, "all-day".to_string())]
    );
    assert_eq!(occurrence.days, BTreeSet::from([day(12), day(13)]));
}

#[test]
fn occurrence_from_previous_week_is_clipped() {
    // Saturday 7th 20:00 until Monday 9th 08:00.
    let occurrence = Occurrence::new("x", at(7, 20, 0), at(9, 8, 0), "Maintenance", "");
    assert_eq!(labels(&occurrence), vec![(9, "End: 08:00".to_string())]);
    assert_eq!(occurrence.days.len(), 3);
}

#[test]
fn every_segment_sorts_by_occurrence_start() {
    let occurrence = Occurrence::new("x", at(9, 14, 0), at(13, 10, 0), "Audit", "");
    let segments = split(&occurrence, &visible());
    assert_eq!(segments.len(), 5);
    assert!(segments
        .iter()
        .all(|(_, segment)| segment.starts_at == at(9, 14, 0).at));
}

#[test]
fn end_before_start_touches_nothing() {
    let days = touched_days(&at(11, 10, 0), &at(10, 10, 0));
    assert!(days.is_empty());
}

#[test]
fn all_day_on_day_without_midnight_keeps_its_date() {
    // In Santiago, 2026-09-06 begins at 01:00.
    let santiago: Tz = chrono_tz::America::Santiago;
    let on = |d: u32| {
        normalize(
            &RawTime::Date(NaiveDate::from_ymd_opt(2026, 9, d).unwrap()),
            &santiago,
        )
    };
    let sep = |d: u32| NaiveDate::from_ymd_opt(2026, 9, d).unwrap();

    assert_eq!(touched_days(&on(6), &on(7)), BTreeSet::from([sep(6)]));
    assert_eq!(touched_days(&on(5), &on(6)), BTreeSet::from([sep(5)]));
}
