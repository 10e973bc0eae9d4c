//! Occurrence registry -- deduplicates materialized occurrences and applies
//! cancellations independently of the order they arrive in.
//!
//! Each [`OccurrenceKey`] moves through `unseen → registered → cancelled` or
//! `unseen → cancelled`. Cancellation is terminal for the run: a `register`
//! after a `cancel` for the same key is suppressed, so `[register, cancel]`
//! and `[cancel, register]` both end with the occurrence absent.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::debug;

use crate::normalize::CanonicalInstant;
use crate::span;

/// Identity of one logical occurrence: series identity plus start instant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct OccurrenceKey {
    pub identity: String,
    pub start: DateTime<Tz>,
}

impl OccurrenceKey {
    pub fn new(identity: impl Into<String>, start: DateTime<Tz>) -> Self {
        OccurrenceKey {
            identity: identity.into(),
            start,
        }
    }
}

/// One concrete event instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Occurrence {
    pub key: OccurrenceKey,
    pub start: CanonicalInstant,
    pub end: CanonicalInstant,
    pub summary: String,
    pub location: String,
    /// Every calendar day the occurrence touches, end-exclusive.
    pub days: BTreeSet<NaiveDate>,
}

impl Occurrence {
    pub fn new(
        identity: impl Into<String>,
        start: CanonicalInstant,
        end: CanonicalInstant,
        summary: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Occurrence {
            key: OccurrenceKey::new(identity, start.at),
            start,
            end,
            summary: summary.into(),
            location: location.into(),
            days: span::touched_days(&start, &end),
        }
    }

    pub fn is_all_day(&self) -> bool {
        self.start.all_day
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// The occurrence was materialized.
    Registered,
    /// The key was already registered; the first occurrence stays.
    Duplicate,
    /// The key was cancelled earlier in the run.
    Suppressed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// A materialized occurrence was removed.
    Retracted,
    /// Nothing was registered yet; a later registration will be suppressed.
    Preempted,
    AlreadyCancelled,
}

#[derive(Debug, Clone, Copy)]
enum KeyState {
    Registered(usize),
    Cancelled,
}

#[derive(Debug, Clone, Default)]
pub struct OccurrenceRegistry {
    states: HashMap<OccurrenceKey, KeyState>,
    slots: Vec<Option<Occurrence>>,
}

impl OccurrenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, occurrence: Occurrence) -> RegisterOutcome {
        match self.states.get(&occurrence.key) {
            Some(KeyState::Registered(_)) => RegisterOutcome::Duplicate,
            Some(KeyState::Cancelled) => {
                debug!(identity = %occurrence.key.identity, start = %occurrence.key.start, "registration suppressed by cancellation");
                RegisterOutcome::Suppressed
            }
            None => {
                self.states
                    .insert(occurrence.key.clone(), KeyState::Registered(self.slots.len()));
                self.slots.push(Some(occurrence));
                RegisterOutcome::Registered
            }
        }
    }

    pub fn cancel(&mut self, key: OccurrenceKey) -> CancelOutcome {
        let previous = self.states.insert(key, KeyState::Cancelled);
        match previous {
            Some(KeyState::Registered(slot)) => {
                self.slots[slot] = None;
                CancelOutcome::Retracted
            }
            Some(KeyState::Cancelled) => CancelOutcome::AlreadyCancelled,
            None => CancelOutcome::Preempted,
        }
    }

    pub fn contains(&self, key: &OccurrenceKey) -> bool {
        matches!(self.states.get(key), Some(KeyState::Registered(_)))
    }

    pub fn is_cancelled(&self, key: &OccurrenceKey) -> bool {
        matches!(self.states.get(key), Some(KeyState::Cancelled))
    }

    /// Surviving occurrences in registration order.
    pub fn occurrences(&self) -> impl Iterator<Item = &Occurrence> {
        self.slots.iter().flatten()
    }

    pub fn into_occurrences(self) -> Vec<Occurrence> {
        self.slots.into_iter().flatten().collect()
    }

    pub fn len(&self) -> usize {
        self.occurrences().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
