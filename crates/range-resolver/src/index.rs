//! The Known-Range Index: fixed quick-pick ranges keyed by `"<from> to <to>"`.
//!
//! Two static tables feed the index. The visible table drives the grouped
//! quick-pick menu; the hidden table mirrors the same shapes pointing into
//! the future. Lookup is exact string match, so `now-1h` and `now-60m` are
//! different keys.

use std::collections::{BTreeMap, HashMap};

use once_cell::sync::Lazy;
use serde::Serialize;

/// A resolved range with its display label and menu grouping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RangeDescriptor {
    pub from: String,
    pub to: String,
    /// Human-facing label.
    pub display: String,
    /// Quick-pick menu bucket.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<i32>,
    /// Whether this entry matches the currently selected range.
    #[serde(skip_serializing_if = "is_false")]
    pub active: bool,
    /// The expression did not match any known range shape.
    #[serde(skip_serializing_if = "is_false")]
    pub invalid: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl RangeDescriptor {
    /// The index key for this range.
    pub fn key(&self) -> String {
        range_key(&self.from, &self.to)
    }
}

pub(crate) fn range_key(from: &str, to: &str) -> String {
    format!("{from} to {to}")
}

struct RangeOption {
    from: &'static str,
    to: &'static str,
    display: &'static str,
    section: i32,
}

const fn opt(
    from: &'static str,
    to: &'static str,
    display: &'static str,
    section: i32,
) -> RangeOption {
    RangeOption {
        from,
        to,
        display,
        section,
    }
}

impl RangeOption {
    fn descriptor(&self) -> RangeDescriptor {
        RangeDescriptor {
            from: self.from.to_string(),
            to: self.to.to_string(),
            display: self.display.to_string(),
            section: Some(self.section),
            active: false,
            invalid: false,
        }
    }
}

const RANGE_OPTIONS: &[RangeOption] = &[
    opt("now/d", "now/d", "今天", 2),
    opt("now/d", "now", "Today so far", 2),
    opt("now/w", "now/w", "本周", 2),
    opt("now/w", "now", "This week so far", 2),
    opt("now/M", "now/M", "本月", 2),
    opt("now/M", "now", "This month so far", 2),
    opt("now/y", "now/y", "今年", 2),
    opt("now/y", "now", "This year so far", 2),
    // Previous calendar periods
    opt("now-1d/d", "now-1d/d", "昨天", 1),
    opt("now-2d/d", "now-2d/d", "前天", 1),
    opt("now-7d/d", "now-7d/d", "此前一周", 1),
    opt("now-1w/w", "now-1w/w", "上周", 1),
    opt("now-1M/M", "now-1M/M", "上个月", 1),
    opt("now-1y/y", "now-1y/y", "去年", 1),
    // Sliding windows ending now
    opt("now-5m", "now", "最近 5 分钟", 3),
    opt("now-15m", "now", "最近 15 分钟", 3),
    opt("now-30m", "now", "最近 30 分钟", 3),
    opt("now-1h", "now", "最近 1 小时", 3),
    opt("now-3h", "now", "最近 3 小时", 3),
    opt("now-6h", "now", "最近 6 小时", 3),
    opt("now-12h", "now", "最近 12 小时", 3),
    opt("now-24h", "now", "最近 24 小时", 3),
    opt("now-2d", "now", "最近 2 天", 0),
    opt("now-7d", "now", "最近 7 天", 0),
    opt("now-30d", "now", "最近 30 天", 0),
    opt("now-90d", "now", "最近 90 天", 0),
    opt("now-6M", "now", "最近 6 月", 0),
    opt("now-1y", "now", "最近 1 年", 0),
    opt("now-2y", "now", "最近 2 年", 0),
    opt("now-5y", "now", "最近 5 年", 0),
];

const HIDDEN_RANGE_OPTIONS: &[RangeOption] = &[
    opt("now", "now+1m", "未来 minute", 3),
    opt("now", "now+5m", "未来 5 分钟", 3),
    opt("now", "now+15m", "未来 15 分钟", 3),
    opt("now", "now+30m", "未来 30 分钟", 3),
    opt("now", "now+1h", "未来 hour", 3),
    opt("now", "now+3h", "未来 3 小时", 3),
    opt("now", "now+6h", "未来 6 小时", 3),
    opt("now", "now+12h", "未来 12 小时", 3),
    opt("now", "now+24h", "未来 24 小时", 3),
    opt("now", "now+2d", "未来 2 天", 0),
    opt("now", "now+7d", "未来 7 天", 0),
    opt("now", "now+30d", "未来 30 天", 0),
    opt("now", "now+90d", "未来 90 天", 0),
    opt("now", "now+6M", "未来 6 月", 0),
    opt("now", "now+1y", "未来 1 年", 0),
    opt("now", "now+2y", "未来 2 年", 0),
    opt("now", "now+5y", "未来 5 年", 0),
];

static RANGE_INDEX: Lazy<HashMap<String, RangeDescriptor>> = Lazy::new(|| {
    let index: HashMap<String, RangeDescriptor> = RANGE_OPTIONS
        .iter()
        .chain(HIDDEN_RANGE_OPTIONS)
        .map(|option| {
            let descriptor = option.descriptor();
            (descriptor.key(), descriptor)
        })
        .collect();
    tracing::trace!(entries = index.len(), "built known-range index");
    index
});

/// Look up a known range by its literal `"<from> to <to>"` key.
pub fn lookup(key: &str) -> Option<&'static RangeDescriptor> {
    RANGE_INDEX.get(key)
}

/// Every descriptor in the index, visible entries first.
pub fn known_ranges() -> impl Iterator<Item = RangeDescriptor> {
    RANGE_OPTIONS
        .iter()
        .chain(HIDDEN_RANGE_OPTIONS)
        .map(RangeOption::descriptor)
}

/// The visible quick-pick ranges grouped by section, each marked `active`
/// when its display equals `current_display`.
///
/// Hidden future-pointing ranges are never listed.
pub fn relative_times_list(current_display: Option<&str>) -> BTreeMap<i32, Vec<RangeDescriptor>> {
    let mut groups: BTreeMap<i32, Vec<RangeDescriptor>> = BTreeMap::new();
    for option in RANGE_OPTIONS {
        let mut descriptor = option.descriptor();
        descriptor.active = current_display == Some(option.display);
        groups.entry(option.section).or_default().push(descriptor);
    }
    groups
}
