//! iCalendar feed adapter -- turns raw `.ics` bytes into [`EventComponent`] records.
//!
//! Uses the `ical` crate for line unfolding and property/parameter splitting;
//! the temporal values themselves are parsed here. A `VEVENT` whose temporal
//! properties cannot be parsed is dropped with a [`Diagnostic`], and the rest
//! of the feed is still returned.

use std::io::BufReader;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use ical::parser::ical::component::IcalEvent;
use ical::property::Property;
use tracing::{debug, warn};

use crate::component::{Diagnostic, EventComponent, EventEnd, Status, UNTITLED};
use crate::error::{EngineError, Result};
use crate::normalize::RawTime;

/// The events of a feed plus the components that had to be dropped.
#[derive(Debug, Clone, Default)]
pub struct FeedParse {
    pub components: Vec<EventComponent>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parse every `VEVENT` of every `VCALENDAR` in `bytes`.
///
/// # Errors
/// Returns `EngineError::Feed` if the iCalendar structure itself is malformed.
pub fn parse_feed(bytes: &[u8]) -> Result<FeedParse> {
    let parser = ical::IcalParser::new(BufReader::new(bytes));
    let mut feed = FeedParse::default();

    for calendar in parser {
        let calendar = calendar.map_err(|e| EngineError::Feed(e.to_string()))?;
        for event in &calendar.events {
            match component_from_event(event) {
                Ok(component) => feed.components.push(component),
                Err(err) => {
                    let uid = text_property(event, "UID").unwrap_or_default();
                    let summary = text_property(event, "SUMMARY").unwrap_or_default();
                    warn!(uid = %uid, summary = %summary, error = %err, "dropping unreadable VEVENT");
                    feed.diagnostics.push(Diagnostic::new(&uid, &summary, &err));
                }
            }
        }
    }

    debug!(
        components = feed.components.len(),
        dropped = feed.diagnostics.len(),
        "parsed feed"
    );
    Ok(feed)
}

fn component_from_event(event: &IcalEvent) -> Result<EventComponent> {
    let mut component = EventComponent::default();
    let mut dtend = None;
    let mut duration = None;

    for property in &event.properties {
        let Some(value) = property.value.as_deref() else {
            continue;
        };
        match property.name.to_ascii_uppercase().as_str() {
            "UID" => component.uid = value.trim().to_string(),
            "SUMMARY" => component.summary = unescape_text(value).trim().to_string(),
            "LOCATION" => component.location = unescape_text(value).trim().to_string(),
            "STATUS" => {
                if value.trim().eq_ignore_ascii_case("CANCELLED") {
                    component.status = Status::Cancelled;
                }
            }
            "DTSTART" => component.start = Some(single_time(property, value)?),
            "DTEND" => dtend = Some(single_time(property, value)?),
            "DURATION" => duration = Some(parse_duration(value)?),
            "RRULE" => component.rrule = Some(value.trim().to_string()),
            "EXDATE" => component.exdates.extend(time_list(property, value)?),
            "RDATE" => component.rdates.extend(time_list(property, value)?),
            "RECURRENCE-ID" => component.recurrence_id = Some(single_time(property, value)?),
            _ => {}
        }
    }

    if component.summary.is_empty() {
        component.summary = UNTITLED.to_string();
    }
    component.end = match (dtend, duration) {
        (Some(end), _) => Some(EventEnd::At(end)),
        (None, Some(delta)) => Some(EventEnd::Duration(delta)),
        (None, None) => None,
    };

    Ok(component)
}

fn text_property(event: &IcalEvent, name: &str) -> Option<String> {
    event
        .properties
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
        .and_then(|p| p.value.as_deref())
        .map(|v| unescape_text(v).trim().to_string())
}

fn param<'a>(property: &'a Property, name: &str) -> Option<&'a str> {
    property
        .params
        .as_ref()?
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .and_then(|(_, values)| values.first())
        .map(|v| v.trim().trim_matches('"'))
}

fn single_time(property: &Property, value: &str) -> Result<RawTime> {
    parse_time_value(
        &property.name,
        value,
        param(property, "TZID"),
        param(property, "VALUE"),
    )
}

/// `EXDATE` / `RDATE` may carry a comma-separated list; `VALUE=PERIOD`
/// entries contribute their start.
fn time_list(property: &Property, value: &str) -> Result<Vec<RawTime>> {
    let tzid = param(property, "TZID");
    let value_type = param(property, "VALUE");
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            let start = item.split('/').next().unwrap_or(item);
            parse_time_value(&property.name, start, tzid, value_type)
        })
        .collect()
}

/// Parse an iCalendar `DATE` or `DATE-TIME` value.
///
/// # Errors
/// Returns `EngineError::InvalidValue` for text matching neither form.
pub fn parse_time_value(
    property: &str,
    value: &str,
    tzid: Option<&str>,
    value_type: Option<&str>,
) -> Result<RawTime> {
    let value = value.trim();
    let invalid = || EngineError::invalid_value(property, value);

    let is_date = value_type.is_some_and(|t| t.eq_ignore_ascii_case("DATE"))
        || (value.len() == 8 && !value.contains('T'));
    if is_date {
        return NaiveDate::parse_from_str(value, "%Y%m%d")
            .map(RawTime::Date)
            .map_err(|_| invalid());
    }

    if let Some(utc) = value.strip_suffix(['Z', 'z']) {
        return NaiveDateTime::parse_from_str(utc, "%Y%m%dT%H%M%S")
            .map(|naive| RawTime::Utc(naive.and_utc()))
            .map_err(|_| invalid());
    }

    let naive = NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S").map_err(|_| invalid())?;
    Ok(match tzid.filter(|t| !t.is_empty()) {
        Some(tzid) => RawTime::Zoned {
            datetime: naive,
            tzid: tzid.to_string(),
        },
        None => RawTime::Floating(naive),
    })
}

/// Parse an RFC 5545 `DURATION` value such as `PT1H30M`, `P1D` or `-P1W`.
///
/// # Errors
/// Returns `EngineError::InvalidValue` for malformed text.
pub fn parse_duration(value: &str) -> Result<TimeDelta> {
    let trimmed = value.trim();
    let invalid = || EngineError::invalid_value("DURATION", trimmed);

    let (sign, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let rest = rest.strip_prefix(['P', 'p']).ok_or_else(invalid)?;

    let mut total: i64 = 0;
    let mut digits = String::new();
    let mut in_time = false;
    let mut seen_unit = false;

    for ch in rest.chars() {
        match ch.to_ascii_uppercase() {
            '0'..='9' => digits.push(ch),
            'T' if !in_time && digits.is_empty() => in_time = true,
            unit @ ('W' | 'D' | 'H' | 'M' | 'S') => {
                let amount: i64 = digits.parse().map_err(|_| invalid())?;
                digits.clear();
                let seconds = match (unit, in_time) {
                    ('W', false) => 604_800,
                    ('D', false) => 86_400,
                    ('H', true) => 3_600,
                    ('M', true) => 60,
                    ('S', true) => 1,
                    _ => return Err(invalid()),
                };
                total = amount
                    .checked_mul(seconds)
                    .and_then(|part| total.checked_add(part))
                    .ok_or_else(invalid)?;
                seen_unit = true;
            }
            _ => return Err(invalid()),
        }
    }

    if !seen_unit || !digits.is_empty() {
        return Err(invalid());
    }
    TimeDelta::try_seconds(sign * total).ok_or_else(invalid)
}

/// Undo RFC 5545 TEXT escaping.
fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n' | 'N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
