//! Price resolution property-based and unit tests
//!
//! Covers:
//! - priceAt returns the latest history entry not later than the timestamp
//! - Resolution is idempotent and insensitive to history order
//! - Pairs with no history resolve to nothing (never zero)

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use shared::ledger::{price_per_kg, resolve_price_at, PricePoint};

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

// ============================================================================
// Property Test Strategies
// ============================================================================

/// A price history of distinct effective times within one season
fn history_strategy() -> impl Strategy<Value = Vec<PricePoint>> {
    prop::collection::btree_set(0i64..=10_000, 1..20).prop_map(|offsets| {
        let base = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        offsets
            .into_iter()
            .map(|minutes| PricePoint {
                price_per_ton: Decimal::from(1500 + (minutes % 700)),
                effective_at: base + chrono::Duration::minutes(minutes),
            })
            .collect()
    })
}

proptest! {
    /// The resolved entry is never later than the requested time, and no
    /// other entry between it and the request exists
    #[test]
    fn test_resolves_latest_not_later(history in history_strategy(), query_minutes in 0i64..=10_000) {
        let base = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let at = base + chrono::Duration::minutes(query_minutes);

        let resolved = resolve_price_at(&history, at);
        let expected = history
            .iter()
            .filter(|p| p.effective_at <= at)
            .max_by_key(|p| p.effective_at)
            .map(|p| p.price_per_ton);

        prop_assert_eq!(resolved, expected);
    }

    /// Calling twice with identical arguments returns identical results
    #[test]
    fn test_resolution_idempotent(history in history_strategy(), query_minutes in 0i64..=10_000) {
        let base = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let at = base + chrono::Duration::minutes(query_minutes);
        prop_assert_eq!(resolve_price_at(&history, at), resolve_price_at(&history, at));
    }

    /// Appending entries strictly later than the query cannot change the result
    #[test]
    fn test_later_writes_do_not_affect_earlier_queries(
        history in history_strategy(),
        query_minutes in 0i64..=10_000
    ) {
        let base = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let at = base + chrono::Duration::minutes(query_minutes);
        let before = resolve_price_at(&history, at);

        let mut extended = history.clone();
        extended.push(PricePoint {
            price_per_ton: dec("9999"),
            effective_at: at + chrono::Duration::minutes(1),
        });
        prop_assert_eq!(resolve_price_at(&extended, at), before);
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[test]
fn test_empty_history_resolves_to_nothing() {
    let at = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
    assert_eq!(resolve_price_at(&[], at), None);
}

#[test]
fn test_query_before_first_entry_resolves_to_nothing() {
    let effective = Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).unwrap();
    let history = vec![PricePoint {
        price_per_ton: dec("1800"),
        effective_at: effective,
    }];
    let before = Utc.with_ymd_and_hms(2026, 3, 9, 23, 59, 59).unwrap();
    assert_eq!(resolve_price_at(&history, before), None);
    assert_eq!(resolve_price_at(&history, effective), Some(dec("1800")));
}

#[test]
fn test_price_changes_take_effect_at_their_timestamp() {
    let t1 = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
    let t2 = Utc.with_ymd_and_hms(2026, 3, 15, 8, 0, 0).unwrap();
    let history = vec![
        PricePoint {
            price_per_ton: dec("1700"),
            effective_at: t1,
        },
        PricePoint {
            price_per_ton: dec("1800"),
            effective_at: t2,
        },
    ];

    let mid = Utc.with_ymd_and_hms(2026, 3, 8, 0, 0, 0).unwrap();
    assert_eq!(resolve_price_at(&history, mid), Some(dec("1700")));
    assert_eq!(resolve_price_at(&history, t2), Some(dec("1800")));
}

#[test]
fn test_season_price_converts_to_per_kg() {
    // RM 1800/ton is RM 1.80/kg
    assert_eq!(price_per_kg(dec("1800")), dec("1.8"));
    assert_eq!(price_per_kg(dec("2125")), dec("2.125"));
}
