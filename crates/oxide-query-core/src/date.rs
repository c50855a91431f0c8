//! Date coercion and normalization.
//!
//! Search values on date fields may be the literal `NOW` or a relative offset
//! such as `-3d` or `+1.5w`. Both resolve against a reference instant. The
//! result (or the untouched text, when nothing matched) is handed to a
//! [`DateNormalizer`] which decides what actually gets bound.

use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use regex::Regex;

use crate::value::SqlValue;

const MINUTE_MS: f64 = 60.0 * 1000.0;
const HOUR_MS: f64 = 60.0 * MINUTE_MS;
const DAY_MS: f64 = 24.0 * HOUR_MS;
const WEEK_MS: f64 = 7.0 * DAY_MS;
const MONTH_MS: f64 = 30.0 * DAY_MS;
const YEAR_MS: f64 = 365.0 * DAY_MS;
/// Offsets beyond this are not representable as milliseconds.
const MAX_OFFSET_MS: f64 = 9.0e18;

static RELATIVE_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([+-]?\d+(?:\.\d+)?)([yMwdhm])$").expect("relative date pattern is valid")
});

/// A date-like value before normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateInput<'a> {
    /// A resolved instant.
    Instant(DateTime<Utc>),
    /// Text that did not match `NOW` or a relative offset.
    Text(&'a str),
}

/// Converts date-like values into the value that gets bound.
pub trait DateNormalizer: Send + Sync {
    /// Normalizes a date-like value.
    fn normalize(&self, input: DateInput<'_>) -> SqlValue;
}

impl<F> DateNormalizer for F
where
    F: Fn(DateInput<'_>) -> SqlValue + Send + Sync,
{
    fn normalize(&self, input: DateInput<'_>) -> SqlValue {
        self(input)
    }
}

/// Default normalizer: milliseconds since the Unix epoch.
///
/// Text is read as RFC 3339, `YYYY-MM-DDTHH:MM:SS[.fff]` or `YYYY-MM-DD`
/// (the last two in UTC). Anything else is an invalid date and binds `NULL`.
#[derive(Debug, Default, Clone, Copy)]
pub struct EpochMillis;

impl DateNormalizer for EpochMillis {
    fn normalize(&self, input: DateInput<'_>) -> SqlValue {
        let instant = match input {
            DateInput::Instant(instant) => Some(instant),
            DateInput::Text(text) => parse_instant(text),
        };
        instant.map_or(SqlValue::Null, |i| SqlValue::Int(i.timestamp_millis()))
    }
}

impl fmt::Debug for dyn DateNormalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DateNormalizer")
    }
}

/// Parses an absolute date or date-time.
#[must_use]
pub fn parse_instant(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Resolves `NOW` or a relative offset against `now`.
///
/// Units: `y` (365 days), `M` (30 days), `w`, `d`, `h` and `m` (minutes).
/// Returns `None` when the text is neither, or the offset overflows.
#[must_use]
pub fn resolve_relative(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if text == "NOW" {
        return Some(now);
    }

    let caps = RELATIVE_DATE.captures(text)?;
    let magnitude: f64 = caps[1].parse().ok()?;
    let unit_ms = match &caps[2] {
        "y" => YEAR_MS,
        "M" => MONTH_MS,
        "w" => WEEK_MS,
        "d" => DAY_MS,
        "h" => HOUR_MS,
        "m" => MINUTE_MS,
        _ => return None,
    };

    let offset = (magnitude * unit_ms).trunc();
    if !offset.is_finite() || offset.abs() >= MAX_OFFSET_MS {
        return None;
    }
    #[allow(clippy::cast_possible_truncation)]
    let delta = TimeDelta::try_milliseconds(offset as i64)?;
    now.checked_add_signed(delta)
}

/// Epoch milliseconds of an instant, as bound for operator payloads.
#[must_use]
pub fn epoch_millis(instant: DateTime<Utc>) -> SqlValue {
    SqlValue::Int(instant.timestamp_millis())
}
