//! # weekboard-engine
//!
//! Resolves a calendar feed's recurring, overridden and cancelled events into
//! the concrete occurrences of one Monday–Friday work week, grouped per day.
//!
//! Recurrence rules are expanded with the `rrule` crate; all times are
//! normalized into a single local `chrono-tz` zone before they are compared.
//!
//! ## Modules
//!
//! - [`normalize`] — raw date/date-time values → local [`CanonicalInstant`]s
//! - [`expander`] — RRULE / RDATE → instants inside the window, minus EXDATEs
//! - [`overrides`] — index of `RECURRENCE-ID` overrides
//! - [`registry`] — order-independent dedup and cancellation of occurrences
//! - [`span`] — per-day segments and time labels for multi-day occurrences
//! - [`week`] — the visible work week and per-day ordering
//! - [`resolver`] — the pipeline tying the above together
//! - [`feed`] — iCalendar bytes → [`EventComponent`]s
//! - [`error`] — Error types

pub mod component;
pub mod error;
pub mod expander;
pub mod feed;
pub mod normalize;
pub mod overrides;
pub mod registry;
pub mod resolver;
pub mod span;
pub mod week;

pub use component::{Diagnostic, EventComponent, EventEnd, Status};
pub use error::EngineError;
pub use feed::{parse_feed, FeedParse};
pub use normalize::{normalize, CanonicalInstant, RawTime};
pub use overrides::OverrideIndex;
pub use registry::{Occurrence, OccurrenceKey, OccurrenceRegistry};
pub use resolver::{resolve, resolve_occurrences, WeekView};
pub use span::{DaySegment, TimeLabel};
pub use week::WeekWindow;
