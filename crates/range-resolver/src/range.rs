//! Range endpoints, raw and resolved ranges, and time zone selection.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Serialize, Serializer};

use crate::error::RangeError;

/// One end of a raw range: either a text expression (`now-5m`, `now/d`,
/// `2026-03-01`) or an already-absolute instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeEndpoint {
    Text(String),
    Instant(DateTime<Utc>),
}

impl TimeEndpoint {
    pub fn text(s: impl Into<String>) -> Self {
        TimeEndpoint::Text(s.into())
    }

    pub fn is_instant(&self) -> bool {
        matches!(self, TimeEndpoint::Instant(_))
    }

    pub fn as_instant(&self) -> Option<DateTime<Utc>> {
        match self {
            TimeEndpoint::Instant(dt) => Some(*dt),
            TimeEndpoint::Text(_) => None,
        }
    }
}

impl fmt::Display for TimeEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeEndpoint::Text(s) => f.write_str(s),
            TimeEndpoint::Instant(dt) => f.write_str(&dt.to_rfc3339()),
        }
    }
}

impl From<&str> for TimeEndpoint {
    fn from(s: &str) -> Self {
        TimeEndpoint::Text(s.to_string())
    }
}

impl From<DateTime<Utc>> for TimeEndpoint {
    fn from(dt: DateTime<Utc>) -> Self {
        TimeEndpoint::Instant(dt)
    }
}

impl Serialize for TimeEndpoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A range as the user entered it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawTimeRange {
    pub from: TimeEndpoint,
    pub to: TimeEndpoint,
}

impl RawTimeRange {
    pub fn new(from: impl Into<TimeEndpoint>, to: impl Into<TimeEndpoint>) -> Self {
        RawTimeRange {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// A range resolved to absolute instants, keeping the raw form it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeRange {
    #[serde(serialize_with = "serialize_zoned")]
    pub from: DateTime<Tz>,
    #[serde(serialize_with = "serialize_zoned")]
    pub to: DateTime<Tz>,
    pub raw: RawTimeRange,
}

fn serialize_zoned<S: Serializer>(dt: &DateTime<Tz>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&dt.to_rfc3339())
}

/// Which zone to render and round in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeZoneSpec {
    /// The viewer's zone. No host zone is known at this layer, so it
    /// resolves to UTC.
    #[default]
    Browser,
    Utc,
    Named(Tz),
}

impl TimeZoneSpec {
    pub fn tz(&self) -> Tz {
        match self {
            TimeZoneSpec::Browser | TimeZoneSpec::Utc => Tz::UTC,
            TimeZoneSpec::Named(tz) => *tz,
        }
    }
}

impl FromStr for TimeZoneSpec {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("browser") {
            return Ok(TimeZoneSpec::Browser);
        }
        if s.eq_ignore_ascii_case("utc") {
            return Ok(TimeZoneSpec::Utc);
        }
        s.parse::<Tz>()
            .map(TimeZoneSpec::Named)
            .map_err(|_| RangeError::InvalidTimezone(format!("'{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_endpoint_display() {
        assert_eq!(TimeEndpoint::text("now-5m").to_string(), "now-5m");
        let dt = Utc.with_ymd_and_hms(2026, 3, 15, 14, 0, 0).unwrap();
        assert_eq!(TimeEndpoint::from(dt).to_string(), "2026-03-15T14:00:00+00:00");
    }

    #[test]
    fn test_endpoint_is_instant() {
        let dt = Utc.with_ymd_and_hms(2026, 3, 15, 14, 0, 0).unwrap();
        assert!(TimeEndpoint::from(dt).is_instant());
        assert!(!TimeEndpoint::from("now").is_instant());
        assert_eq!(TimeEndpoint::from("now").as_instant(), None);
    }

    #[test]
    fn test_zone_spec_parse() {
        assert_eq!("".parse::<TimeZoneSpec>().unwrap(), TimeZoneSpec::Browser);
        assert_eq!("browser".parse::<TimeZoneSpec>().unwrap(), TimeZoneSpec::Browser);
        assert_eq!("UTC".parse::<TimeZoneSpec>().unwrap(), TimeZoneSpec::Utc);
        assert_eq!(
            "Asia/Tokyo".parse::<TimeZoneSpec>().unwrap(),
            TimeZoneSpec::Named(chrono_tz::Asia::Tokyo)
        );
    }

    #[test]
    fn test_zone_spec_invalid() {
        let err = "Invalid/Zone".parse::<TimeZoneSpec>().unwrap_err().to_string();
        assert!(err.contains("Invalid timezone"), "got: {err}");
    }

    #[test]
    fn test_browser_resolves_to_utc() {
        assert_eq!(TimeZoneSpec::Browser.tz(), Tz::UTC);
    }

    #[test]
    fn test_raw_range_serializes_endpoints_as_strings() {
        let dt = Utc.with_ymd_and_hms(2026, 3, 15, 14, 0, 0).unwrap();
        let raw = RawTimeRange::new("now-1h", dt);
        let json = serde_json::to_value(&raw).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"from": "now-1h", "to": "2026-03-15T14:00:00+00:00"})
        );
    }
}
