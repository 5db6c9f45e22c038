//! Task duplication rule.
//!
//! A duplicate is a deep copy of the original with group membership and
//! dependency fields removed, and every absolute date moved by
//! `reference - original.created`. Relative timing (deadline five hours after
//! creation, artifacts expiring a year later, ...) is preserved exactly.
//!
//! Dates are written back in RFC 3339 with the same fractional-second
//! precision as the input, and with `Z` when the input used it. Values that
//! do not parse as dates are left alone, as is everything else on the task.

use chrono::{DateTime, FixedOffset, SecondsFormat, TimeDelta, Utc};
use serde_json::Value;

use crate::constants::fields;
use crate::models::TaskDefinition;

/// Duplicate `original` as if it had been created at `reference`
pub fn duplicate_task(original: &TaskDefinition, reference: DateTime<Utc>) -> TaskDefinition {
    let mut task = original.clone();
    for field in fields::STRIPPED {
        task.remove(field);
    }

    let Some(delta) = original
        .created()
        .and_then(parse_date)
        .map(|created| reference.signed_duration_since(created.with_timezone(&Utc)))
    else {
        return task;
    };

    for field in fields::REBASED_DATES {
        if let Some(Value::String(raw)) = task.as_map_mut().get_mut(field) {
            shift_in_place(raw, delta);
        }
    }

    if let Some(artifacts) = task
        .as_map_mut()
        .get_mut(fields::PAYLOAD)
        .and_then(|payload| payload.get_mut(fields::ARTIFACTS))
    {
        shift_artifacts(artifacts, delta);
    }

    task
}

/// [`duplicate_task`] with the current time as reference
pub fn duplicate_task_now(original: &TaskDefinition) -> TaskDefinition {
    duplicate_task(original, Utc::now())
}

/// Artifacts are either a name-keyed map or a list of entries; only entries
/// carrying a string `expires` are touched.
fn shift_artifacts(artifacts: &mut Value, delta: TimeDelta) {
    let entries: Box<dyn Iterator<Item = &mut Value>> = match artifacts {
        Value::Object(map) => Box::new(map.values_mut()),
        Value::Array(list) => Box::new(list.iter_mut()),
        _ => return,
    };

    for entry in entries {
        if let Some(Value::String(raw)) = entry.get_mut(fields::EXPIRES) {
            shift_in_place(raw, delta);
        }
    }
}

fn shift_in_place(raw: &mut String, delta: TimeDelta) {
    if let Some(shifted) = shift_date(raw, delta) {
        *raw = shifted;
    }
}

fn parse_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw).ok()
}

/// Shift an RFC 3339 timestamp by `delta`, keeping its precision and zone style
pub fn shift_date(raw: &str, delta: TimeDelta) -> Option<String> {
    let shifted = parse_date(raw)?.checked_add_signed(delta)?;
    let use_z = raw.ends_with('Z') || raw.ends_with('z');
    Some(shifted.to_rfc3339_opts(seconds_format(raw), use_z))
}

fn seconds_format(raw: &str) -> SecondsFormat {
    let digits = raw
        .split_once('.')
        .map(|(_, fraction)| fraction.chars().take_while(char::is_ascii_digit).count())
        .unwrap_or(0);

    match digits {
        0 => SecondsFormat::Secs,
        1..=3 => SecondsFormat::Millis,
        4..=6 => SecondsFormat::Micros,
        _ => SecondsFormat::Nanos,
    }
}
