//! Zone-aware rendering of range endpoints.

use chrono::{DateTime, TimeZone, Utc};

use crate::range::TimeZoneSpec;

/// Default display format for absolute endpoints.
pub const DEFAULT_DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format an instant as `YYYY-MM-DD HH:MM:SS` in `zone`.
pub fn format_date_time<T: TimeZone>(instant: &DateTime<T>, zone: &TimeZoneSpec) -> String {
    instant
        .with_timezone(&zone.tz())
        .format(DEFAULT_DATE_TIME_FORMAT)
        .to_string()
}

/// The zone abbreviation (`UTC`, `EST`, `JST`, ...) in effect at `instant`.
///
/// Zones without a conventional abbreviation render as their offset, e.g. `+04`.
pub fn time_zone_abbreviation<T: TimeZone>(instant: &DateTime<T>, zone: &TimeZoneSpec) -> String {
    instant.with_timezone(&zone.tz()).format("%Z").to_string()
}

/// Render `instant` relative to `now`: `5 minutes ago`, `in 2 hours`,
/// `a few seconds ago`.
///
/// Each bucket is chosen from the rounded magnitude of the difference:
///
/// | difference        | phrase          |
/// |-------------------|-----------------|
/// | < 45 seconds      | a few seconds   |
/// | < 90 seconds      | a minute        |
/// | < 45 minutes      | N minutes       |
/// | < 90 minutes      | an hour         |
/// | < 22 hours        | N hours         |
/// | < 36 hours        | a day           |
/// | < 26 days         | N days          |
/// | < 45 days         | a month         |
/// | < 11 months       | N months        |
/// | < 18 months       | a year          |
/// | otherwise         | N years         |
///
/// The zone does not change the phrase; it is accepted so that every
/// endpoint formatter has the same shape.
pub fn format_time_ago<T: TimeZone>(
    instant: &DateTime<T>,
    _zone: &TimeZoneSpec,
    now: DateTime<Utc>,
) -> String {
    let diff_ms = (instant.with_timezone(&Utc) - now).num_milliseconds();
    let phrase = humanize(diff_ms.unsigned_abs());
    if diff_ms > 0 {
        format!("in {phrase}")
    } else {
        format!("{phrase} ago")
    }
}

fn humanize(abs_ms: u64) -> String {
    let ms = abs_ms as f64;
    let seconds = (ms / 1_000.0).round();
    let minutes = (ms / 60_000.0).round();
    let hours = (ms / 3_600_000.0).round();
    let days_exact = ms / 86_400_000.0;
    let days = days_exact.round();
    // Average Gregorian month: 146097 days per 4800 months.
    let months_exact = days_exact * 4800.0 / 146_097.0;
    let months = months_exact.round();
    let years = (months_exact / 12.0).round();

    if seconds < 45.0 {
        "a few seconds".to_string()
    } else if minutes <= 1.0 {
        "a minute".to_string()
    } else if minutes < 45.0 {
        format!("{} minutes", minutes as i64)
    } else if hours <= 1.0 {
        "an hour".to_string()
    } else if hours < 22.0 {
        format!("{} hours", hours as i64)
    } else if days <= 1.0 {
        "a day".to_string()
    } else if days < 26.0 {
        format!("{} days", days as i64)
    } else if months <= 1.0 {
        "a month".to_string()
    } else if months < 11.0 {
        format!("{} months", months as i64)
    } else if years <= 1.0 {
        "a year".to_string()
    } else {
        format!("{} years", years as i64)
    }
}
