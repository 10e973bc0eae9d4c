//! Occurrence resolution -- from feed components to the per-day week view.
//!
//! One pass over a feed snapshot:
//! 1. index overrides by (uid, original instant);
//! 2. materialize the live overrides at their own instants, ahead of any
//!    series instance that lands on the same key;
//! 3. walk the components: cancellations go to the registry, series are
//!    expanded and single events registered, overridden instants skipped;
//! 4. split the surviving occurrences into day segments and assemble the week.
//!
//! A component that fails is dropped with a [`Diagnostic`]; the run continues.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::{debug, warn};

use crate::component::{Diagnostic, EventComponent};
use crate::error::{EngineError, Result};
use crate::expander;
use crate::normalize::{normalize, CanonicalInstant};
use crate::overrides::OverrideIndex;
use crate::registry::{Occurrence, OccurrenceKey, OccurrenceRegistry, RegisterOutcome};
use crate::span::{self, DaySegment};
use crate::week::{self, WeekWindow};

/// The resolved week: every visible day with its ordered segments.
#[derive(Debug, Clone, Serialize)]
pub struct WeekView {
    pub iso_week: u32,
    pub window_start: DateTime<Tz>,
    pub window_end: DateTime<Tz>,
    pub days: BTreeMap<NaiveDate, Vec<DaySegment>>,
    pub diagnostics: Vec<Diagnostic>,
}

impl WeekView {
    /// Segments for `day`; empty for days outside the window.
    pub fn day(&self, day: NaiveDate) -> &[DaySegment] {
        self.days.get(&day).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn segment_count(&self) -> usize {
        self.days.values().map(Vec::len).sum()
    }
}

/// Resolve `components` against `window`.
pub fn resolve(components: &[EventComponent], window: &WeekWindow) -> WeekView {
    let occurrences = resolve_occurrences(components, window);
    let visible = window.visible_days();
    let segments = occurrences
        .occurrences
        .iter()
        .flat_map(|occurrence| span::split(occurrence, &visible));

    WeekView {
        iso_week: window.iso_week(),
        window_start: window.start(),
        window_end: window.end(),
        days: week::assemble(segments, &visible),
        diagnostics: occurrences.diagnostics,
    }
}

/// Occurrences surviving resolution, before day splitting.
#[derive(Debug, Clone, Default)]
pub struct ResolvedOccurrences {
    pub occurrences: Vec<Occurrence>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Run steps 1–3 of the resolution and return the registry's survivors in
/// registration order.
pub fn resolve_occurrences(components: &[EventComponent], window: &WeekWindow) -> ResolvedOccurrences {
    let tz = window.timezone();
    let overrides = OverrideIndex::build(components, &tz);
    let mut run = Resolution {
        window,
        tz,
        overrides: &overrides,
        registry: OccurrenceRegistry::new(),
        diagnostics: Vec::new(),
    };

    for component in overrides.components() {
        if let Err(err) = run.materialize_override(component) {
            run.skip(component, &err);
        }
    }

    for component in components {
        if let Err(err) = run.process(component) {
            run.skip(component, &err);
        }
    }

    debug!(
        occurrences = run.registry.len(),
        dropped = run.diagnostics.len(),
        "resolution finished"
    );
    ResolvedOccurrences {
        occurrences: run.registry.into_occurrences(),
        diagnostics: run.diagnostics,
    }
}

struct Resolution<'a> {
    window: &'a WeekWindow,
    tz: Tz,
    overrides: &'a OverrideIndex,
    registry: OccurrenceRegistry,
    diagnostics: Vec<Diagnostic>,
}

impl Resolution<'_> {
    fn process(&mut self, component: &EventComponent) -> Result<()> {
        if component.is_cancelled() {
            return self.cancel(component);
        }
        if component.is_override() {
            // Already materialized from the override index.
            return Ok(());
        }

        let (start, end) = component.resolve_times(&self.tz)?;
        let duration = start.wall_duration_to(&end);

        let mut instants = Vec::new();
        if let Some(rule) = &component.rrule {
            let expansion = expander::expand_series(
                rule,
                &start,
                duration,
                &component.exdates,
                self.window.start(),
                self.window.end(),
            )?;
            if expansion.truncated {
                self.note(component, &EngineError::ExpansionLimit(expander::MAX_INSTANCES));
            }
            instants = expansion.instants;
        }
        instants.extend(expander::expand_dates(
            &component.rdates,
            duration,
            &component.exdates,
            self.window.start(),
            self.window.end(),
        )?);

        // Every end is computed before anything is registered, so a component
        // that fails leaves no partial instances behind.
        let spans = instants
            .into_iter()
            .map(|instant| instant.shifted(duration).map(|instant_end| (instant, instant_end)))
            .collect::<Result<Vec<_>>>()?;

        if component.rrule.is_none() {
            self.register(component, start, end);
        }
        for (instant, instant_end) in spans {
            self.register_instance(component, instant, instant_end);
        }
        Ok(())
    }

    /// Register one generated instance unless an override claims it.
    fn register_instance(
        &mut self,
        component: &EventComponent,
        start: CanonicalInstant,
        end: CanonicalInstant,
    ) {
        if self.overrides.contains(&component.uid, &start) {
            debug!(uid = %component.uid, start = %start.at, "instance replaced by override");
            return;
        }
        self.register(component, start, end);
    }

    fn register(&mut self, component: &EventComponent, start: CanonicalInstant, end: CanonicalInstant) {
        let occurrence = Occurrence::new(
            component.identity(),
            start,
            end,
            component.summary.as_str(),
            component.location.as_str(),
        );
        if self.registry.register(occurrence) == RegisterOutcome::Duplicate {
            debug!(identity = %component.identity(), start = %start.at, "duplicate occurrence ignored");
        }
    }

    /// An override replaces its original instance, placed at its own start.
    fn materialize_override(&mut self, component: &EventComponent) -> Result<()> {
        let (start, end) = component.resolve_times(&self.tz)?;
        self.register(component, start, end);
        Ok(())
    }

    /// A cancellation removes the occurrence at its `RECURRENCE-ID`, or at its
    /// start when it has none. A cancelled series master also removes every
    /// instance its rule and additional dates produce in the window.
    fn cancel(&mut self, component: &EventComponent) -> Result<()> {
        let anchor = component
            .recurrence_id
            .as_ref()
            .or(component.start.as_ref())
            .ok_or(EngineError::MissingField("DTSTART"))?;
        let identity = component.identity();
        let instant = normalize(anchor, &self.tz);
        self.registry.cancel(OccurrenceKey::new(identity.clone(), instant.at));

        if component.recurrence_id.is_some()
            || (component.rrule.is_none() && component.rdates.is_empty())
        {
            return Ok(());
        }
        let (start, end) = component.resolve_times(&self.tz)?;
        let duration = start.wall_duration_to(&end);
        let mut instants = match &component.rrule {
            Some(rule) => expander::expand(
                rule,
                &start,
                duration,
                &component.exdates,
                self.window.start(),
                self.window.end(),
            )?,
            None => Vec::new(),
        };
        instants.extend(expander::expand_dates(
            &component.rdates,
            duration,
            &component.exdates,
            self.window.start(),
            self.window.end(),
        )?);
        for instant in instants {
            self.registry.cancel(OccurrenceKey::new(identity.clone(), instant.at));
        }
        Ok(())
    }

    /// Record a problem with a component that is still rendered.
    fn note(&mut self, component: &EventComponent, err: &EngineError) {
        self.diagnostics
            .push(Diagnostic::new(&component.uid, &component.summary, err));
    }

    fn skip(&mut self, component: &EventComponent, err: &EngineError) {
        warn!(
            uid = %component.uid,
            summary = %component.summary,
            error = %err,
            "skipping event component"
        );
        self.diagnostics
            .push(Diagnostic::new(&component.uid, &component.summary, err));
    }
}
