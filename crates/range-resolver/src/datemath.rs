//! Date math for range endpoints.
//!
//! An endpoint is either anchored at `now` (`now`, `now-5m`, `now-1d/d`) or
//! at an absolute instant optionally followed by `||` and math
//! (`2026-03-01||+1M/M`). Math is a sequence of operations:
//!
//! - `+N<unit>` / `-N<unit>` — add or subtract `N` units (`N` defaults to 1)
//! - `/<unit>` — round to the unit boundary
//!
//! Units are `y Q M w d h m s`. Prefixing `y` or `Q` with `f` selects fiscal
//! years and quarters counted from [`DateMathOptions::fiscal_year_start_month`].
//!
//! Rounding snaps to the first instant of the unit, or to its last
//! millisecond when `round_up` is set, so that `now-1d/d to now-1d/d` covers
//! the whole of yesterday. All functions take the `now` anchor explicitly.

use chrono::{
    DateTime, Datelike, Days, LocalResult, Months, NaiveDate, NaiveDateTime, TimeDelta,
    TimeZone, Timelike, Utc, Weekday,
};
use chrono_tz::Tz;
use serde::Serialize;

use crate::error::{RangeError, Result};

/// Longest accepted amount, in digits.
const MAX_AMOUNT_DIGITS: usize = 10;

/// Which day begins a week when rounding with `/w`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum WeekStartDay {
    /// ISO 8601 standard (Monday = day 0 of the week).
    #[default]
    Monday,
    /// US/Canada convention (Sunday = day 0 of the week).
    Sunday,
}

/// Options for [`parse_with_options`].
#[derive(Debug, Clone, Default)]
pub struct DateMathOptions {
    /// Which day starts the week for `/w` rounding.
    pub week_start: WeekStartDay,
    /// First month of the fiscal year, 0-based (0 = January).
    pub fiscal_year_start_month: u32,
}

/// How many days `weekday` is from the week-start day.
fn days_from_week_start(weekday: Weekday, week_start: WeekStartDay) -> u64 {
    match week_start {
        WeekStartDay::Monday => weekday.num_days_from_monday() as u64,
        WeekStartDay::Sunday => weekday.num_days_from_sunday() as u64,
    }
}

/// Whether `text` must be evaluated against "now" rather than being a fixed
/// instant.
pub fn is_math_string(text: &str) -> bool {
    text.starts_with("now") || text.contains("||")
}

/// Parse a range endpoint with default options.
pub fn parse(text: &str, round_up: bool, tz: Tz, now: DateTime<Utc>) -> Result<DateTime<Tz>> {
    parse_with_options(text, round_up, tz, now, &DateMathOptions::default())
}

/// Parse a range endpoint into an absolute instant in `tz`.
///
/// # Errors
///
/// Returns [`RangeError::InvalidDatetime`] if the absolute part cannot be
/// parsed, or [`RangeError::InvalidExpression`] if the math part is malformed.
pub fn parse_with_options(
    text: &str,
    round_up: bool,
    tz: Tz,
    now: DateTime<Utc>,
    options: &DateMathOptions,
) -> Result<DateTime<Tz>> {
    let text = text.trim();
    if text.is_empty() {
        return Err(RangeError::InvalidDatetime("empty endpoint".to_string()));
    }

    let (anchor, math) = if let Some(rest) = text.strip_prefix("now") {
        (now.with_timezone(&tz), rest)
    } else {
        match text.split_once("||") {
            Some((date, math)) => (parse_absolute(date, tz)?, math),
            None => (parse_absolute(text, tz)?, ""),
        }
    };

    if math.is_empty() {
        return Ok(anchor);
    }
    apply_math(math, anchor, round_up, options).map_err(|e| {
        tracing::debug!(expression = text, error = %e, "date math rejected");
        e
    })
}

/// Parse the absolute part of an endpoint: epoch milliseconds, RFC 3339, or
/// an ISO 8601 local date/datetime interpreted in `tz`.
fn parse_absolute(s: &str, tz: Tz) -> Result<DateTime<Tz>> {
    let s = s.trim();

    if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
        let millis: i64 = s
            .parse()
            .map_err(|_| RangeError::InvalidDatetime(format!("'{s}': epoch out of range")))?;
        return match Utc.timestamp_millis_opt(millis) {
            LocalResult::Single(dt) => Ok(dt.with_timezone(&tz)),
            _ => Err(RangeError::InvalidDatetime(format!(
                "'{s}': epoch out of range"
            ))),
        };
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&tz));
    }

    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return localize(tz, naive);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return localize(tz, date.and_time(chrono::NaiveTime::MIN));
    }

    Err(RangeError::InvalidDatetime(format!("'{s}'")))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MathOp {
    Round,
    Add,
    Subtract,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MathUnit {
    Year,
    Quarter,
    Month,
    Week,
    Day,
    Hour,
    Minute,
    Second,
}

impl MathUnit {
    fn from_letter(c: char) -> Option<Self> {
        match c {
            'y' => Some(MathUnit::Year),
            'Q' => Some(MathUnit::Quarter),
            'M' => Some(MathUnit::Month),
            'w' => Some(MathUnit::Week),
            'd' => Some(MathUnit::Day),
            'h' => Some(MathUnit::Hour),
            'm' => Some(MathUnit::Minute),
            's' => Some(MathUnit::Second),
            _ => None,
        }
    }
}

/// Apply a math string such as `-1d/d` to `time`.
fn apply_math(
    math: &str,
    time: DateTime<Tz>,
    round_up: bool,
    options: &DateMathOptions,
) -> Result<DateTime<Tz>> {
    let chars: Vec<char> = math.chars().filter(|c| !c.is_whitespace()).collect();
    let invalid = |reason: &str| RangeError::InvalidExpression(format!("'{math}': {reason}"));

    let mut result = time;
    let mut i = 0;
    while i < chars.len() {
        let op = match chars[i] {
            '/' => MathOp::Round,
            '+' => MathOp::Add,
            '-' => MathOp::Subtract,
            c => return Err(invalid(&format!("unexpected '{c}'"))),
        };
        i += 1;

        let digits_start = i;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
            if i - digits_start > MAX_AMOUNT_DIGITS {
                return Err(invalid("amount too large"));
            }
        }
        let amount: i64 = if i == digits_start {
            1
        } else {
            chars[digits_start..i]
                .iter()
                .collect::<String>()
                .parse()
                .map_err(|_| invalid("invalid amount"))?
        };
        if op == MathOp::Round && amount != 1 {
            return Err(invalid("rounding takes no amount"));
        }

        let fiscal = chars.get(i) == Some(&'f');
        if fiscal {
            i += 1;
        }
        let unit = chars
            .get(i)
            .copied()
            .ok_or_else(|| invalid("missing unit"))?;
        i += 1;
        let unit = MathUnit::from_letter(unit)
            .ok_or_else(|| invalid(&format!("unknown unit '{unit}'")))?;
        if fiscal && !matches!(unit, MathUnit::Year | MathUnit::Quarter) {
            return Err(invalid("fiscal periods are years or quarters"));
        }

        result = match op {
            MathOp::Round if round_up => end_of(result, unit, fiscal, options),
            MathOp::Round => start_of(result, unit, fiscal, options),
            MathOp::Add => shift(result, unit, amount),
            MathOp::Subtract => shift(result, unit, -amount),
        }
        .ok_or_else(|| invalid("result out of range"))?;
    }

    Ok(result)
}

/// First instant of the `unit` containing `dt`, in `dt`'s zone.
fn start_of(
    dt: DateTime<Tz>,
    unit: MathUnit,
    fiscal: bool,
    options: &DateMathOptions,
) -> Option<DateTime<Tz>> {
    let naive = start_of_naive(dt.naive_local(), unit, fiscal, options)?;
    localize(dt.timezone(), naive).ok()
}

/// Last millisecond of the `unit` containing `dt`.
fn end_of(
    dt: DateTime<Tz>,
    unit: MathUnit,
    fiscal: bool,
    options: &DateMathOptions,
) -> Option<DateTime<Tz>> {
    let start = start_of_naive(dt.naive_local(), unit, fiscal, options)?;
    let next = shift_naive(start, unit, 1)?;
    let next = localize(dt.timezone(), next).ok()?;
    next.checked_sub_signed(TimeDelta::milliseconds(1))
}

fn start_of_naive(
    local: NaiveDateTime,
    unit: MathUnit,
    fiscal: bool,
    options: &DateMathOptions,
) -> Option<NaiveDateTime> {
    let date = local.date();
    let year_start_month = if fiscal {
        options.fiscal_year_start_month % 12 + 1
    } else {
        1
    };
    match unit {
        MathUnit::Second => local.with_nanosecond(0),
        MathUnit::Minute => date.and_hms_opt(local.hour(), local.minute(), 0),
        MathUnit::Hour => date.and_hms_opt(local.hour(), 0, 0),
        MathUnit::Day => date.and_hms_opt(0, 0, 0),
        MathUnit::Week => {
            let days_since_start = days_from_week_start(date.weekday(), options.week_start);
            date.checked_sub_days(Days::new(days_since_start))?
                .and_hms_opt(0, 0, 0)
        }
        MathUnit::Month => {
            NaiveDate::from_ymd_opt(date.year(), date.month(), 1)?.and_hms_opt(0, 0, 0)
        }
        MathUnit::Quarter => {
            let year_start = year_start(date, year_start_month)?;
            let months_in = (date.month() + 12 - year_start_month) % 12;
            year_start
                .checked_add_months(Months::new(months_in / 3 * 3))?
                .and_hms_opt(0, 0, 0)
        }
        MathUnit::Year => year_start(date, year_start_month)?.and_hms_opt(0, 0, 0),
    }
}

/// First day of the (possibly fiscal) year containing `date`.
fn year_start(date: NaiveDate, start_month: u32) -> Option<NaiveDate> {
    let year = if date.month() >= start_month {
        date.year()
    } else {
        date.year() - 1
    };
    NaiveDate::from_ymd_opt(year, start_month, 1)
}

/// Add `amount` units to `dt`. Calendar units keep the local wall-clock time
/// across DST transitions; sub-day units are exact durations.
fn shift(dt: DateTime<Tz>, unit: MathUnit, amount: i64) -> Option<DateTime<Tz>> {
    match unit {
        MathUnit::Hour => dt.checked_add_signed(TimeDelta::try_hours(amount)?),
        MathUnit::Minute => dt.checked_add_signed(TimeDelta::try_minutes(amount)?),
        MathUnit::Second => dt.checked_add_signed(TimeDelta::try_seconds(amount)?),
        _ => {
            let naive = shift_naive(dt.naive_local(), unit, amount)?;
            localize(dt.timezone(), naive).ok()
        }
    }
}

fn shift_naive(naive: NaiveDateTime, unit: MathUnit, amount: i64) -> Option<NaiveDateTime> {
    let months = match unit {
        MathUnit::Year => amount.checked_mul(12)?,
        MathUnit::Quarter => amount.checked_mul(3)?,
        MathUnit::Month => amount,
        MathUnit::Week => return naive.checked_add_signed(TimeDelta::try_weeks(amount)?),
        MathUnit::Day => return naive.checked_add_signed(TimeDelta::try_days(amount)?),
        MathUnit::Hour => return naive.checked_add_signed(TimeDelta::try_hours(amount)?),
        MathUnit::Minute => return naive.checked_add_signed(TimeDelta::try_minutes(amount)?),
        MathUnit::Second => return naive.checked_add_signed(TimeDelta::try_seconds(amount)?),
    };
    let step = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        naive.checked_add_months(step)
    } else {
        naive.checked_sub_months(step)
    }
}

/// Map a local wall-clock time to an instant. Ambiguous times take the
/// earlier instant; times inside a DST gap move forward one hour.
fn localize(tz: Tz, naive: NaiveDateTime) -> Result<DateTime<Tz>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest),
        LocalResult::None => naive
            .checked_add_signed(TimeDelta::hours(1))
            .and_then(|shifted| tz.from_local_datetime(&shifted).earliest())
            .ok_or_else(|| {
                RangeError::InvalidDatetime(format!(
                    "nonexistent local time {naive} in {}",
                    tz.name()
                ))
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::New_York;

    fn anchor() -> DateTime<Utc> {
        // Wednesday, February 18, 2026, 14:30:45 UTC
        Utc.with_ymd_and_hms(2026, 2, 18, 14, 30, 45).unwrap()
    }

    fn utc(text: &str, round_up: bool) -> String {
        parse(text, round_up, Tz::UTC, anchor())
            .unwrap()
            .to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
    }

    // ── is_math_string tests ────────────────────────────────────────────

    #[test]
    fn test_is_math_string() {
        assert!(is_math_string("now"));
        assert!(is_math_string("now-5m"));
        assert!(is_math_string("2026-01-01||+1d"));
        assert!(!is_math_string("2026-01-01"));
        assert!(!is_math_string("1767225600000"));
        assert!(!is_math_string(""));
    }

    // ── now-anchored math tests ─────────────────────────────────────────

    #[test]
    fn test_parse_now() {
        assert_eq!(utc("now", false), "2026-02-18T14:30:45.000Z");
    }

    #[test]
    fn test_parse_subtract_minutes() {
        assert_eq!(utc("now-5m", false), "2026-02-18T14:25:45.000Z");
    }

    #[test]
    fn test_parse_add_hours() {
        assert_eq!(utc("now+2h", false), "2026-02-18T16:30:45.000Z");
    }

    #[test]
    fn test_parse_missing_amount_means_one() {
        assert_eq!(utc("now-d", false), "2026-02-17T14:30:45.000Z");
    }

    #[test]
    fn test_parse_subtract_year() {
        assert_eq!(utc("now-1y", false), "2025-02-18T14:30:45.000Z");
    }

    #[test]
    fn test_parse_whitespace_ignored() {
        assert_eq!(utc("now - 5m", false), "2026-02-18T14:25:45.000Z");
    }

    #[test]
    fn test_parse_round_day_down_and_up() {
        assert_eq!(utc("now/d", false), "2026-02-18T00:00:00.000Z");
        assert_eq!(utc("now/d", true), "2026-02-18T23:59:59.999Z");
    }

    #[test]
    fn test_parse_yesterday() {
        assert_eq!(utc("now-1d/d", false), "2026-02-17T00:00:00.000Z");
        assert_eq!(utc("now-1d/d", true), "2026-02-17T23:59:59.999Z");
    }

    #[test]
    fn test_parse_round_hour_and_minute() {
        assert_eq!(utc("now/h", false), "2026-02-18T14:00:00.000Z");
        assert_eq!(utc("now/m", true), "2026-02-18T14:30:59.999Z");
    }

    #[test]
    fn test_parse_round_week_monday_start() {
        assert_eq!(utc("now/w", false), "2026-02-16T00:00:00.000Z");
        assert_eq!(utc("now/w", true), "2026-02-22T23:59:59.999Z");
    }

    #[test]
    fn test_parse_round_week_sunday_start() {
        let options = DateMathOptions {
            week_start: WeekStartDay::Sunday,
            ..Default::default()
        };
        let result = parse_with_options("now/w", false, Tz::UTC, anchor(), &options).unwrap();
        assert_eq!(result.to_rfc3339(), "2026-02-15T00:00:00+00:00");
    }

    #[test]
    fn test_parse_round_month() {
        assert_eq!(utc("now/M", false), "2026-02-01T00:00:00.000Z");
        assert_eq!(utc("now/M", true), "2026-02-28T23:59:59.999Z");
        assert_eq!(utc("now-1M/M", false), "2026-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_parse_round_quarter_and_year() {
        assert_eq!(utc("now/Q", false), "2026-01-01T00:00:00.000Z");
        assert_eq!(utc("now/Q", true), "2026-03-31T23:59:59.999Z");
        assert_eq!(utc("now/y", false), "2026-01-01T00:00:00.000Z");
        assert_eq!(utc("now-1y/y", true), "2025-12-31T23:59:59.999Z");
    }

    #[test]
    fn test_parse_fiscal_year_and_quarter() {
        let options = DateMathOptions {
            fiscal_year_start_month: 1, // February
            ..Default::default()
        };
        let start = parse_with_options("now/fQ", false, Tz::UTC, anchor(), &options).unwrap();
        assert_eq!(start.to_rfc3339(), "2026-02-01T00:00:00+00:00");
        let end = parse_with_options("now/fQ", true, Tz::UTC, anchor(), &options).unwrap();
        assert_eq!(
            end.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            "2026-04-30T23:59:59.999Z"
        );

        let april = DateMathOptions {
            fiscal_year_start_month: 3,
            ..Default::default()
        };
        let fy = parse_with_options("now/fy", false, Tz::UTC, anchor(), &april).unwrap();
        assert_eq!(fy.to_rfc3339(), "2025-04-01T00:00:00+00:00");
    }

    #[test]
    fn test_parse_round_in_timezone() {
        // 14:30 UTC is 09:30 EST, so the local day starts at 05:00 UTC
        let result = parse("now/d", false, New_York, anchor()).unwrap();
        assert_eq!(result.with_timezone(&Utc).to_rfc3339(), "2026-02-18T05:00:00+00:00");
    }

    #[test]
    fn test_parse_day_across_dst_keeps_wall_clock() {
        // March 8, 2026: US spring forward. 10:00 EST → 10:00 EDT next day.
        let now = Utc.with_ymd_and_hms(2026, 3, 7, 15, 0, 0).unwrap();
        let result = parse("now+1d", false, New_York, now).unwrap();
        assert_eq!(result.with_timezone(&Utc).to_rfc3339(), "2026-03-08T14:00:00+00:00");
    }

    // ── absolute anchor tests ───────────────────────────────────────────

    #[test]
    fn test_parse_iso_date() {
        assert_eq!(utc("2026-01-10", false), "2026-01-10T00:00:00.000Z");
    }

    #[test]
    fn test_parse_iso_date_in_timezone() {
        let result = parse("2026-01-10", false, New_York, anchor()).unwrap();
        assert_eq!(result.with_timezone(&Utc).to_rfc3339(), "2026-01-10T05:00:00+00:00");
    }

    #[test]
    fn test_parse_local_datetime_formats() {
        assert_eq!(utc("2026-01-10T08:15:00", false), "2026-01-10T08:15:00.000Z");
        assert_eq!(utc("2026-01-10 08:15:00.250", false), "2026-01-10T08:15:00.250Z");
        assert_eq!(utc("2026-01-10 08:15", false), "2026-01-10T08:15:00.000Z");
    }

    #[test]
    fn test_parse_rfc3339() {
        assert_eq!(utc("2026-01-10T08:15:00-05:00", false), "2026-01-10T13:15:00.000Z");
    }

    #[test]
    fn test_parse_epoch_millis() {
        assert_eq!(utc("1767225600000", false), "2026-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_parse_absolute_with_math() {
        assert_eq!(utc("2026-01-10||+1d", false), "2026-01-11T00:00:00.000Z");
        assert_eq!(utc("2026-01-10T12:00:00Z||/d", false), "2026-01-10T00:00:00.000Z");
        assert_eq!(utc("2026-01-31||+1M", false), "2026-02-28T00:00:00.000Z");
    }

    // ── error tests ─────────────────────────────────────────────────────

    #[test]
    fn test_parse_unknown_unit_returns_error() {
        let err = parse("now-5x", false, Tz::UTC, anchor()).unwrap_err().to_string();
        assert!(err.contains("Invalid expression"), "got: {err}");
    }

    #[test]
    fn test_parse_round_with_amount_returns_error() {
        assert!(parse("now/2d", false, Tz::UTC, anchor()).is_err());
    }

    #[test]
    fn test_parse_amount_too_long_returns_error() {
        assert!(parse("now-12345678901m", false, Tz::UTC, anchor()).is_err());
    }

    #[test]
    fn test_parse_missing_unit_returns_error() {
        assert!(parse("now-5", false, Tz::UTC, anchor()).is_err());
    }

    #[test]
    fn test_parse_fiscal_day_returns_error() {
        assert!(parse("now/fd", false, Tz::UTC, anchor()).is_err());
    }

    #[test]
    fn test_parse_garbage_returns_error() {
        let err = parse("garbage", false, Tz::UTC, anchor()).unwrap_err().to_string();
        assert!(err.contains("Invalid datetime"), "got: {err}");
        assert!(parse("nowhere", false, Tz::UTC, anchor()).is_err());
        assert!(parse("", false, Tz::UTC, anchor()).is_err());
    }

    #[test]
    fn test_parse_round_week_at_min_date_returns_error() {
        assert!(parse("-262143-01-01||/w", false, Tz::UTC, anchor()).is_err());
        assert!(parse("-262143-01-01||/w", true, Tz::UTC, anchor()).is_err());
    }
}
