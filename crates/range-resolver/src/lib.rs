//! # range-resolver
//!
//! Relative time-range resolution for dashboard time pickers.
//!
//! Converts compact range expressions such as `now-15m` or `now/d to now/d`
//! into descriptors with a human label and a quick-pick section, renders
//! ranges for display, and normalizes raw ranges into absolute instants.
//!
//! ## Modules
//!
//! - [`rangeutil`] — expression → descriptor, range display, span validation, normalization
//! - [`index`] — the fixed Known-Range Index and grouped quick-pick list
//! - [`units`] — span units with display names and sections
//! - [`datemath`] — `now-1d/d` style date math and absolute instant parsing
//! - [`format`] — zone-aware timestamp, time-ago, and zone abbreviation formatting
//! - [`range`] — range endpoint and time zone value types
//! - [`error`] — Error types

pub mod datemath;
pub mod error;
pub mod format;
pub mod index;
pub mod range;
pub mod rangeutil;
pub mod units;

pub use datemath::{is_math_string, DateMathOptions, WeekStartDay};
pub use error::RangeError;
pub use index::{lookup, relative_times_list, RangeDescriptor};
pub use range::{RawTimeRange, TimeEndpoint, TimeRange, TimeZoneSpec};
pub use rangeutil::{
    convert_raw_to_range, describe_text_range, describe_time_range,
    describe_time_range_abbreviation, is_valid_time_span,
};
pub use units::SpanUnit;
