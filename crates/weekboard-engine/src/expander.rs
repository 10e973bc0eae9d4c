//! RRULE expansion -- turns a recurrence rule into the concrete instants inside a window.
//!
//! Wraps the `rrule` crate. The rule is seeded with `DTSTART;TZID=<local zone>`
//! at the series start's local wall time, so instances keep their wall-clock
//! time across DST changes.

use std::collections::HashSet;

use chrono::{DateTime, TimeDelta};
use chrono_tz::Tz;
use rrule::RRuleSet;
use tracing::warn;

use crate::error::{EngineError, Result};
use crate::feed::parse_time_value;
use crate::normalize::{normalize, CanonicalInstant, RawTime};

/// Upper bound on instances produced by a single window query.
pub const MAX_INSTANCES: u16 = 1000;

/// Instances of one rule inside the window.
#[derive(Debug, Clone, Default)]
pub struct Expansion {
    pub instants: Vec<CanonicalInstant>,
    /// The query hit [`MAX_INSTANCES`]; instants past the cut are missing.
    pub truncated: bool,
}

/// Expand `rule` into every instance intersecting `[window_start, window_end]`.
///
/// The lower bound is pulled back by `duration`, so an instance that starts
/// before the window but is still running when it opens is included. Both
/// bounds are inclusive. `exclusions` are normalized and removed by exact
/// instant match. The result is ascending and not deduplicated.
///
/// # Arguments
/// - `rule` -- RFC 5545 RRULE value (e.g., "FREQ=WEEKLY;BYDAY=TU,TH"), with or without the `RRULE:` prefix
/// - `series_start` -- normalized `DTSTART` of the series
/// - `duration` -- wall-clock length of each instance
/// - `exclusions` -- raw `EXDATE` values
/// - `window_start`, `window_end` -- the visible window in the local zone
///
/// # Errors
/// Returns `EngineError::InvalidRule` if the rule is empty or unparseable, and
/// `EngineError::InvalidValue` if `duration` pulls the window out of range.
pub fn expand(
    rule: &str,
    series_start: &CanonicalInstant,
    duration: TimeDelta,
    exclusions: &[RawTime],
    window_start: DateTime<Tz>,
    window_end: DateTime<Tz>,
) -> Result<Vec<CanonicalInstant>> {
    expand_series(rule, series_start, duration, exclusions, window_start, window_end)
        .map(|expansion| expansion.instants)
}

/// [`expand`], also reporting whether the instance limit cut the result short.
///
/// # Errors
/// As for [`expand`].
pub fn expand_series(
    rule: &str,
    series_start: &CanonicalInstant,
    duration: TimeDelta,
    exclusions: &[RawTime],
    window_start: DateTime<Tz>,
    window_end: DateTime<Tz>,
) -> Result<Expansion> {
    let tz = window_start.timezone();
    let body = rule.trim();
    let body = body.strip_prefix("RRULE:").unwrap_or(body);
    if body.is_empty() {
        return Err(EngineError::InvalidRule("empty RRULE string".to_string()));
    }

    // UNTIL is applied here rather than by the rrule crate, which insists that
    // UNTIL and DTSTART agree on their timezone form.
    let (rule_body, until) = split_until(body);
    let until = until
        .map(|value| {
            parse_time_value("UNTIL", value, None, None)
                .map(|raw| normalize(&raw, &tz))
                .map_err(|e| EngineError::InvalidRule(e.to_string()))
        })
        .transpose()?;

    let rrule_text = format!(
        "DTSTART;TZID={}:{}\nRRULE:{}",
        tz.name(),
        series_start.at.naive_local().format("%Y%m%dT%H%M%S"),
        rule_body
    );
    let rrule_set: RRuleSet = rrule_text
        .parse()
        .map_err(|e| EngineError::InvalidRule(format!("{}", e)))?;

    let query_start = pulled_back(window_start, duration)?.with_timezone(&rrule::Tz::Tz(tz));
    let query_end = window_end.with_timezone(&rrule::Tz::Tz(tz));
    let result = rrule_set
        .after(query_start)
        .before(query_end)
        .all(MAX_INSTANCES);
    let truncated = result.limited || result.dates.len() >= usize::from(MAX_INSTANCES);
    if truncated {
        warn!(rule = %rule_body, limit = MAX_INSTANCES, "expansion hit instance limit");
    }

    let excluded = exclusion_set(exclusions, &tz);
    let instants = result
        .dates
        .into_iter()
        .map(|dt| CanonicalInstant {
            at: dt.with_timezone(&tz),
            all_day: series_start.all_day,
        })
        .filter(|instant| until.map_or(true, |limit| instant.at <= limit.at))
        .filter(|instant| !excluded.contains(&instant.at))
        .collect();
    Ok(Expansion { instants, truncated })
}

/// Expand explicit additional dates (`RDATE`) through the same window and
/// exclusion logic as [`expand`]. Each date stands on its own.
///
/// # Errors
/// Returns `EngineError::InvalidValue` if `duration` pulls the window out of range.
pub fn expand_dates(
    dates: &[RawTime],
    duration: TimeDelta,
    exclusions: &[RawTime],
    window_start: DateTime<Tz>,
    window_end: DateTime<Tz>,
) -> Result<Vec<CanonicalInstant>> {
    let tz = window_start.timezone();
    let lower = pulled_back(window_start, duration)?;
    let excluded = exclusion_set(exclusions, &tz);

    let mut instants: Vec<CanonicalInstant> = dates
        .iter()
        .map(|raw| normalize(raw, &tz))
        .filter(|instant| instant.at >= lower && instant.at <= window_end)
        .filter(|instant| !excluded.contains(&instant.at))
        .collect();
    instants.sort();
    Ok(instants)
}

/// Window start moved back by a non-negative `duration`.
fn pulled_back(window_start: DateTime<Tz>, duration: TimeDelta) -> Result<DateTime<Tz>> {
    window_start
        .checked_sub_signed(duration.max(TimeDelta::zero()))
        .ok_or_else(|| EngineError::invalid_value("DURATION", &duration.to_string()))
}

fn exclusion_set(exclusions: &[RawTime], tz: &Tz) -> HashSet<DateTime<Tz>> {
    exclusions.iter().map(|raw| normalize(raw, tz).at).collect()
}

/// Split the `UNTIL=` part off an RRULE body.
fn split_until(body: &str) -> (String, Option<&str>) {
    let mut until = None;
    let parts: Vec<&str> = body
        .split(';')
        .filter(|part| {
            let Some((key, value)) = part.split_once('=') else {
                return !part.trim().is_empty();
            };
            if key.trim().eq_ignore_ascii_case("UNTIL") {
                until = Some(value.trim());
                false
            } else {
                true
            }
        })
        .collect();
    (parts.join(";"), until)
}
