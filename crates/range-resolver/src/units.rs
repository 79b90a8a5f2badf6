//! Span units used by `now±N<unit>` range expressions.

use serde::Serialize;

/// A span unit, identified in expressions by a single letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SpanUnit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl SpanUnit {
    pub const ALL: [SpanUnit; 7] = [
        SpanUnit::Second,
        SpanUnit::Minute,
        SpanUnit::Hour,
        SpanUnit::Day,
        SpanUnit::Week,
        SpanUnit::Month,
        SpanUnit::Year,
    ];

    /// Look up a unit by its expression letter. Case matters: `m` is minutes,
    /// `M` is months.
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            's' => Some(SpanUnit::Second),
            'm' => Some(SpanUnit::Minute),
            'h' => Some(SpanUnit::Hour),
            'd' => Some(SpanUnit::Day),
            'w' => Some(SpanUnit::Week),
            'M' => Some(SpanUnit::Month),
            'y' => Some(SpanUnit::Year),
            _ => None,
        }
    }

    pub fn letter(self) -> char {
        match self {
            SpanUnit::Second => 's',
            SpanUnit::Minute => 'm',
            SpanUnit::Hour => 'h',
            SpanUnit::Day => 'd',
            SpanUnit::Week => 'w',
            SpanUnit::Month => 'M',
            SpanUnit::Year => 'y',
        }
    }

    /// Label used when building a `最近 N <unit>` / `未来 N <unit>` display.
    pub fn display(self) -> &'static str {
        match self {
            SpanUnit::Second => "秒",
            SpanUnit::Minute => "分",
            SpanUnit::Hour => "小时",
            SpanUnit::Day => "天",
            SpanUnit::Week => "周",
            SpanUnit::Month => "月",
            SpanUnit::Year => "年",
        }
    }

    /// Quick-pick section for ranges built from this unit. Only sub-day
    /// ranges are grouped.
    pub fn section(self) -> Option<i32> {
        match self {
            SpanUnit::Minute | SpanUnit::Hour => Some(3),
            _ => None,
        }
    }
}
