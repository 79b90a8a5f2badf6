//! Relative range resolution and range display.
//!
//! Everything here is display logic and is total: an expression that does
//! not match a known shape still yields a usable descriptor, flagged
//! [`RangeDescriptor::invalid`], and formatting helpers degrade to literal
//! text or an empty string. The one exception is
//! [`convert_raw_to_range`], which must produce absolute instants.
//!
//! # Functions
//!
//! - [`describe_text_range`] — expression (`5m`, `now-1h`, `+15m`) → descriptor
//! - [`describe_time_range`] — raw range → display label
//! - [`is_valid_time_span`] — whether span text resolves to a known shape
//! - [`describe_time_range_abbreviation`] — zone abbreviation for a range
//! - [`convert_raw_to_range`] — raw range → absolute instants

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::datemath::{self, is_math_string};
use crate::error::Result;
use crate::format::{format_date_time, format_time_ago, time_zone_abbreviation};
use crate::index::{self, range_key, RangeDescriptor};
use crate::range::{RawTimeRange, TimeEndpoint, TimeRange, TimeZoneSpec};
use crate::units::SpanUnit;

const NOW: &str = "now";

// ── describe_text_range ─────────────────────────────────────────────────────

/// Resolve a range expression into a descriptor.
///
/// Handles expressions such as:
///
/// - `5m` — shorthand for `now-5m`, the last five minutes
/// - `+5m` — the next five minutes
/// - `now/d` — today so far
/// - `now-6h` — the last six hours
///
/// A past expression ends at `now`; a future one (leading `+`) starts at
/// `now`. Known ranges come back exactly as stored in the index.
///
/// # Examples
///
/// ```
/// use range_resolver::describe_text_range;
///
/// let last = describe_text_range("now-5m");
/// assert_eq!(last.display, "最近 5 分钟");
/// assert_eq!(last.section, Some(3));
///
/// let odd = describe_text_range("now-7m");
/// assert_eq!(odd.display, "最近 7 分s");
/// ```
pub fn describe_text_range(expression: &str) -> RangeDescriptor {
    let is_last = !expression.starts_with('+');
    let expr = if expression.contains(NOW) {
        expression.to_string()
    } else if is_last {
        format!("now-{expression}")
    } else {
        format!("now{expression}")
    };

    if let Some(known) = index::lookup(&range_key(&expr, NOW)) {
        return known.clone();
    }

    let (from, to) = if is_last {
        (expr.clone(), NOW.to_string())
    } else {
        (NOW.to_string(), expr.clone())
    };
    let mut descriptor = RangeDescriptor {
        from,
        to,
        display: String::new(),
        section: None,
        active: false,
        invalid: false,
    };

    match parse_relative_span(&expr) {
        Some((amount, letter)) => {
            // A matched span with an unknown unit keeps an empty display and
            // is not flagged invalid.
            if let Some(unit) = SpanUnit::from_letter(letter) {
                let direction = if is_last { "最近 " } else { "未来 " };
                descriptor.display = format!("{direction}{amount} {}", unit.display());
                // Plural marker is a literal `s` whatever the unit label.
                if amount.len() > 1 || amount > "1" {
                    descriptor.display.push('s');
                }
                descriptor.section = unit.section();
            } else {
                tracing::debug!(expression, unit = %letter, "unknown span unit");
            }
        }
        None => {
            tracing::debug!(expression, "unrecognized range expression");
            descriptor.display = range_key(&descriptor.from, &descriptor.to);
            descriptor.invalid = true;
        }
    }

    descriptor
}

/// Match the prefix `now(-|+)<digits><word char>` and return the amount
/// (leading zeros stripped) and the unit character. Anything after the unit
/// is ignored.
///
/// When the digit run is not followed by a word character, its last digit
/// stands in as the unit, so `now-55` matches with amount `5` and unit `5`.
fn parse_relative_span(expr: &str) -> Option<(&str, char)> {
    let rest = expr.strip_prefix(NOW)?;
    let rest = rest.strip_prefix('-').or_else(|| rest.strip_prefix('+'))?;

    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let (digits, unit) = match rest[digits_end..].chars().next() {
        Some(c) if digits_end > 0 && (c.is_ascii_alphanumeric() || c == '_') => {
            (&rest[..digits_end], c)
        }
        _ if digits_end > 1 => {
            let last = digits_end - 1;
            (&rest[..last], char::from(rest.as_bytes()[last]))
        }
        _ => return None,
    };

    let amount = digits.trim_start_matches('0');
    Some((if amount.is_empty() { "0" } else { amount }, unit))
}

// ── describe_time_range ─────────────────────────────────────────────────────

/// A display label for a raw range.
///
/// In order of preference: the label of a known range; both endpoints
/// formatted as absolute timestamps; an absolute endpoint next to a
/// time-ago rendering of the relative one; the label of
/// [`describe_text_range`] when the range ends at `now`; otherwise the
/// literal `"<from> to <to>"`.
///
/// `now` anchors the time-ago rendering of relative endpoints.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use range_resolver::{describe_time_range, RawTimeRange, TimeZoneSpec};
///
/// let label = describe_time_range(
///     &RawTimeRange::new("now-1h", "now"),
///     &TimeZoneSpec::default(),
///     Utc::now(),
/// );
/// assert_eq!(label, "最近 1 小时");
/// ```
pub fn describe_time_range(
    range: &RawTimeRange,
    zone: &TimeZoneSpec,
    now: DateTime<Utc>,
) -> String {
    let key = range_key(&range.from.to_string(), &range.to.to_string());
    if let Some(known) = index::lookup(&key) {
        return known.display.clone();
    }

    match (&range.from, &range.to) {
        (TimeEndpoint::Instant(from), TimeEndpoint::Instant(to)) => {
            format!(
                "{} to {}",
                format_date_time(from, zone),
                format_date_time(to, zone)
            )
        }
        (TimeEndpoint::Instant(from), TimeEndpoint::Text(to)) => {
            match datemath::parse(to, true, Tz::UTC, now) {
                Ok(parsed) => format!(
                    "{} to {}",
                    format_date_time(from, zone),
                    format_time_ago(&parsed, zone, now)
                ),
                Err(e) => {
                    tracing::debug!(to = %to, error = %e, "cannot describe range end");
                    String::new()
                }
            }
        }
        (TimeEndpoint::Text(from), TimeEndpoint::Instant(to)) => {
            match datemath::parse(from, false, Tz::UTC, now) {
                Ok(parsed) => format!(
                    "{} to {}",
                    format_time_ago(&parsed, zone, now),
                    format_date_time(to, zone)
                ),
                Err(e) => {
                    tracing::debug!(from = %from, error = %e, "cannot describe range start");
                    String::new()
                }
            }
        }
        (TimeEndpoint::Text(from), TimeEndpoint::Text(to)) if to == NOW => {
            describe_text_range(from).display
        }
        (from, to) => range_key(&from.to_string(), &to.to_string()),
    }
}

// ── is_valid_time_span ──────────────────────────────────────────────────────

/// Whether `span` resolves to a recognizable range shape.
///
/// Template-variable spans (`$interval`, `+$offset`) cannot be resolved here
/// and are always accepted.
pub fn is_valid_time_span(span: &str) -> bool {
    if span.starts_with('$') || span.starts_with("+$") {
        return true;
    }
    !describe_text_range(span).invalid
}

// ── describe_time_range_abbreviation ────────────────────────────────────────

/// The zone abbreviation for the start of `range`, or an empty string if
/// the start cannot be resolved.
pub fn describe_time_range_abbreviation(
    range: &RawTimeRange,
    zone: &TimeZoneSpec,
    now: DateTime<Utc>,
) -> String {
    match &range.from {
        TimeEndpoint::Instant(from) => time_zone_abbreviation(from, zone),
        TimeEndpoint::Text(from) => match datemath::parse(from, true, zone.tz(), now) {
            Ok(parsed) => time_zone_abbreviation(&parsed, zone),
            Err(e) => {
                tracing::debug!(from = %from, error = %e, "cannot abbreviate range start");
                String::new()
            }
        },
    }
}

// ── convert_raw_to_range ────────────────────────────────────────────────────

/// Resolve both endpoints of `raw` to instants in `zone`: `from` rounded
/// down, `to` rounded up.
///
/// When either endpoint is a math string the raw text is kept so the range
/// can be resolved again against a later `now`. Otherwise nothing is left to
/// re-evaluate and `raw` is replaced by the resolved instants.
///
/// # Errors
///
/// Returns the [`datemath`] error for an endpoint that cannot be parsed.
pub fn convert_raw_to_range(
    raw: &RawTimeRange,
    zone: &TimeZoneSpec,
    now: DateTime<Utc>,
) -> Result<TimeRange> {
    let tz = zone.tz();
    let from = resolve_endpoint(&raw.from, false, tz, now)?;
    let to = resolve_endpoint(&raw.to, true, tz, now)?;

    let is_dynamic = |endpoint: &TimeEndpoint| match endpoint {
        TimeEndpoint::Text(text) => is_math_string(text),
        TimeEndpoint::Instant(_) => false,
    };

    let raw = if is_dynamic(&raw.from) || is_dynamic(&raw.to) {
        raw.clone()
    } else {
        RawTimeRange::new(from.with_timezone(&Utc), to.with_timezone(&Utc))
    };

    Ok(TimeRange { from, to, raw })
}

fn resolve_endpoint(
    endpoint: &TimeEndpoint,
    round_up: bool,
    tz: Tz,
    now: DateTime<Utc>,
) -> Result<DateTime<Tz>> {
    match endpoint {
        TimeEndpoint::Instant(dt) => Ok(dt.with_timezone(&tz)),
        TimeEndpoint::Text(text) => datemath::parse(text, round_up, tz, now),
    }
}
