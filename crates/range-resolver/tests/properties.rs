use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use range_resolver::index::known_ranges;
use range_resolver::{
    describe_text_range, describe_time_range, is_valid_time_span, lookup, RawTimeRange,
    SpanUnit, TimeZoneSpec,
};

#[test]
fn every_known_range_resolves_to_itself() {
    for known in known_ranges() {
        let found = lookup(&known.key()).expect("indexed");
        assert_eq!(found.display, known.display);
        assert_eq!(found.section, known.section);

        let range = RawTimeRange::new(known.from.as_str(), known.to.as_str());
        let now = Utc.with_ymd_and_hms(2026, 2, 18, 14, 30, 0).unwrap();
        assert_eq!(
            describe_time_range(&range, &TimeZoneSpec::Utc, now),
            known.display
        );
    }
}

#[test]
fn every_past_window_resolves_from_its_start() {
    for known in known_ranges().filter(|k| k.to == "now") {
        let resolved = describe_text_range(&known.from);
        assert_eq!(resolved, known, "resolving {}", known.from);
    }
}

fn unit_strategy() -> impl Strategy<Value = SpanUnit> {
    prop::sample::select(SpanUnit::ALL.to_vec())
}

proptest! {
    #[test]
    fn resolve_never_panics(expr in "\\PC{0,24}") {
        let _ = describe_text_range(&expr);
        let _ = is_valid_time_span(&expr);
    }

    #[test]
    fn resolve_is_deterministic(expr in "[-+]?(now)?[-+/]?[0-9]{0,4}[smhdwMyx]?") {
        prop_assert_eq!(describe_text_range(&expr), describe_text_range(&expr));
    }

    #[test]
    fn past_shorthand_is_valid(amount in 1u32..10_000, unit in unit_strategy()) {
        let expr = format!("{amount}{}", unit.letter());
        let resolved = describe_text_range(&expr);
        prop_assert!(!resolved.invalid);
        prop_assert_eq!(resolved.to, "now");
        prop_assert!(resolved.from.starts_with("now-"));
        prop_assert!(is_valid_time_span(&expr));
    }

    #[test]
    fn future_shorthand_starts_now(amount in 1u32..10_000, unit in unit_strategy()) {
        let expr = format!("+{amount}{}", unit.letter());
        let resolved = describe_text_range(&expr);
        prop_assert!(!resolved.invalid);
        prop_assert_eq!(resolved.from, "now");
        prop_assert!(resolved.display.starts_with("未来 "));
    }

    #[test]
    fn unindexed_window_display_follows_amount(amount in 1u32..10_000, unit in unit_strategy()) {
        let expr = format!("now-{amount}{}", unit.letter());
        prop_assume!(lookup(&format!("{expr} to now")).is_none());
        let resolved = describe_text_range(&expr);
        let mut expected = format!("最近 {amount} {}", unit.display());
        if amount > 1 {
            expected.push('s');
        }
        prop_assert_eq!(resolved.display, expected);
        prop_assert_eq!(resolved.section, unit.section());
    }

    #[test]
    fn any_word_unit_is_not_invalid(digits in "[0-9]{1,30}", unit in "[A-Za-z0-9_]") {
        let expr = format!("now-{digits}{unit}");
        prop_assert!(!describe_text_range(&expr).invalid);
        let span = format!("{digits}{unit}");
        prop_assert!(is_valid_time_span(&span));
    }

    #[test]
    fn template_variables_always_valid(
        name in "[A-Za-z_][A-Za-z0-9_]{0,12}",
        future in any::<bool>(),
    ) {
        let span = if future { format!("+${name}") } else { format!("${name}") };
        prop_assert!(is_valid_time_span(&span));
    }

    #[test]
    fn invalid_display_is_literal(word in "[a-z]{3,10}") {
        prop_assume!(!word.contains("now"));
        let resolved = describe_text_range(&word);
        prop_assert!(resolved.invalid);
        prop_assert_eq!(resolved.display, format!("now-{word} to now"));
    }
}
