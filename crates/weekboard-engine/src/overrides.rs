//! Index of override components (`RECURRENCE-ID`), keyed by series UID and
//! the original instant they replace.
//!
//! A cancelled override claims its original instant for good: any replacement
//! for the same instant is dropped, wherever it sits in the feed.

use std::collections::{BTreeMap, BTreeSet};

use chrono::DateTime;
use chrono_tz::Tz;
use tracing::debug;

use crate::component::EventComponent;
use crate::normalize::{normalize, CanonicalInstant};

type OriginalKey = (String, DateTime<Tz>);

#[derive(Debug, Clone, Default)]
pub struct OverrideIndex {
    entries: BTreeMap<OriginalKey, EventComponent>,
    cancelled: BTreeSet<OriginalKey>,
}

impl OverrideIndex {
    /// Index every component carrying a `recurrence_id`.
    ///
    /// When two replacements claim the same original instant, the later one
    /// wins. A cancellation of the original instant beats any replacement.
    pub fn build(components: &[EventComponent], tz: &Tz) -> Self {
        let mut index = OverrideIndex::default();
        for component in components {
            let Some(recurrence_id) = &component.recurrence_id else {
                continue;
            };
            let original = normalize(recurrence_id, tz);
            let key = (component.uid.trim().to_string(), original.at);
            if component.is_cancelled() {
                index.cancelled.insert(key);
            } else if index.entries.insert(key, component.clone()).is_some() {
                debug!(uid = %component.uid, original = %original.at, "override replaced an earlier one");
            }
        }
        index
    }

    /// The live replacement for an original instant, if any.
    pub fn lookup(&self, uid: &str, original: &CanonicalInstant) -> Option<&EventComponent> {
        let key = (uid.trim().to_string(), original.at);
        if self.cancelled.contains(&key) {
            return None;
        }
        self.entries.get(&key)
    }

    /// Whether the original instant is replaced or cancelled.
    pub fn contains(&self, uid: &str, original: &CanonicalInstant) -> bool {
        let key = (uid.trim().to_string(), original.at);
        self.entries.contains_key(&key) || self.cancelled.contains(&key)
    }

    pub fn is_cancelled(&self, uid: &str, original: &CanonicalInstant) -> bool {
        self.cancelled.contains(&(uid.trim().to_string(), original.at))
    }

    /// Live replacements in (uid, original instant) order.
    pub fn components(&self) -> impl Iterator<Item = &EventComponent> {
        self.entries
            .iter()
            .filter(|(key, _)| !self.cancelled.contains(*key))
            .map(|(_, component)| component)
    }

    /// Number of original instants claimed by an override.
    pub fn len(&self) -> usize {
        let live = self
            .entries
            .keys()
            .filter(|key| !self.cancelled.contains(*key))
            .count();
        live + self.cancelled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.cancelled.is_empty()
    }
}
