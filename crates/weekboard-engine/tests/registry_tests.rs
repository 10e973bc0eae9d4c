//! Tests for the occurrence registry's register / cancel state machine.

use chrono::{NaiveDate, TimeDelta};
use chrono_tz::Tz;
use weekboard_engine::registry::{CancelOutcome, RegisterOutcome};
use weekboard_engine::{normalize, CanonicalInstant, Occurrence, OccurrenceRegistry, RawTime};

const TZ: Tz = chrono_tz::Europe::Vienna;

fn start(d: u32, h: u32) -> CanonicalInstant {
    normalize(
        &RawTime::Floating(
            NaiveDate::from_ymd_opt(2026, 3, d)
                .unwrap()
                .and_hms_opt(h, 0, 0)
                .unwrap(),
        ),
        &TZ,
    )
}

fn occurrence(identity: &str, summary: &str, d: u32, h: u32) -> Occurrence {
    let begin = start(d, h);
    Occurrence::new(identity, begin, begin.shifted(TimeDelta::hours(1)).unwrap(), summary, "")
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

#[test]
fn registering_twice_keeps_first() {
    let mut registry = OccurrenceRegistry::new();

    assert_eq!(registry.register(occurrence("a", "first", 10, 9)), RegisterOutcome::Registered);
    assert_eq!(registry.register(occurrence("a", "second", 10, 9)), RegisterOutcome::Duplicate);

    let all: Vec<_> = registry.occurrences().collect();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].summary, "first");
}

#[test]
fn same_identity_different_start_are_distinct() {
    let mut registry = OccurrenceRegistry::new();
    registry.register(occurrence("a", "x", 10, 9));
    registry.register(occurrence("a", "x", 11, 9));
    assert_eq!(registry.len(), 2);
}

#[test]
fn registration_order_is_preserved() {
    let mut registry = OccurrenceRegistry::new();
    registry.register(occurrence("c", "third", 12, 9));
    registry.register(occurrence("a", "first", 10, 9));
    registry.register(occurrence("b", "second", 11, 9));

    let summaries: Vec<_> = registry
        .into_occurrences()
        .into_iter()
        .map(|o| o.summary)
        .collect();
    assert_eq!(summaries, vec!["third", "first", "second"]);
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

#[test]
fn cancel_after_register_retracts() {
    let mut registry = OccurrenceRegistry::new();
    let occ = occurrence("a", "x", 10, 9);
    let key = occ.key.clone();

    registry.register(occ);
    assert_eq!(registry.cancel(key.clone()), CancelOutcome::Retracted);

    assert!(registry.is_empty());
    assert!(registry.is_cancelled(&key));
    assert!(!registry.contains(&key));
}

#[test]
fn cancel_before_register_suppresses() {
    let mut registry = OccurrenceRegistry::new();
    let occ = occurrence("a", "x", 10, 9);

    assert_eq!(registry.cancel(occ.key.clone()), CancelOutcome::Preempted);
    assert_eq!(registry.register(occ), RegisterOutcome::Suppressed);
    assert!(registry.is_empty());
}

#[test]
fn cancel_only_touches_its_key() {
    let mut registry = OccurrenceRegistry::new();
    let target = occurrence("a", "x", 11, 9);
    registry.register(occurrence("a", "x", 10, 9));
    registry.register(target.clone());
    registry.register(occurrence("a", "x", 12, 9));

    registry.cancel(target.key.clone());

    assert_eq!(registry.len(), 2);
    assert!(registry.occurrences().all(|o| o.key != target.key));
}

#[test]
fn cancelling_twice_is_harmless() {
    let mut registry = OccurrenceRegistry::new();
    let occ = occurrence("a", "x", 10, 9);
    registry.register(occ.clone());
    registry.cancel(occ.key.clone());
    assert_eq!(registry.cancel(occ.key.clone()), CancelOutcome::AlreadyCancelled);
    assert!(registry.is_empty());
}
