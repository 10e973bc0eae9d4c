//! The event component model consumed by the resolver.

use chrono::TimeDelta;
use chrono_tz::Tz;
use serde::Serialize;

use crate::error::{EngineError, Result};
use crate::normalize::{normalize, CanonicalInstant, RawTime};

/// Summary used when a component carries none.
pub const UNTITLED: &str = "Untitled";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Status {
    #[default]
    Normal,
    Cancelled,
}

/// How a component's end is declared: `DTEND` or `DURATION`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventEnd {
    At(RawTime),
    Duration(TimeDelta),
}

/// One `VEVENT`: a series master, a single event, an override or a cancellation.
///
/// `exdates` and `rdates` are always sequences, whatever arity the feed used.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EventComponent {
    pub uid: String,
    pub summary: String,
    pub location: String,
    pub start: Option<RawTime>,
    pub end: Option<EventEnd>,
    pub rrule: Option<String>,
    pub exdates: Vec<RawTime>,
    pub rdates: Vec<RawTime>,
    pub status: Status,
    /// Set on overrides: the original occurrence this component replaces.
    pub recurrence_id: Option<RawTime>,
}

impl EventComponent {
    /// Dedup identity: the UID, or `"summary|location"` when the UID is empty.
    pub fn identity(&self) -> String {
        let uid = self.uid.trim();
        if uid.is_empty() {
            format!("{}|{}", self.summary, self.location)
        } else {
            uid.to_string()
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == Status::Cancelled
    }

    pub fn is_override(&self) -> bool {
        self.recurrence_id.is_some()
    }

    /// Normalized start and end of this component.
    ///
    /// An explicit end wins over a duration; with neither, the end equals the start.
    ///
    /// # Errors
    /// Returns `EngineError::MissingField` if the component has no `DTSTART`,
    /// or `EngineError::InvalidValue` if the duration runs off chrono's range.
    pub fn resolve_times(&self, tz: &Tz) -> Result<(CanonicalInstant, CanonicalInstant)> {
        let raw_start = self
            .start
            .as_ref()
            .ok_or(EngineError::MissingField("DTSTART"))?;
        let start = normalize(raw_start, tz);
        let end = match &self.end {
            Some(EventEnd::At(raw_end)) => normalize(raw_end, tz),
            Some(EventEnd::Duration(delta)) => start.shifted(*delta)?,
            None => start,
        };
        Ok((start, end))
    }
}

/// A component that was dropped from the run, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub uid: String,
    pub summary: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(uid: &str, summary: &str, error: &EngineError) -> Self {
        Diagnostic {
            uid: uid.to_string(),
            summary: summary.to_string(),
            message: error.to_string(),
        }
    }
}
