//! Receipt identity property-based and unit tests
//!
//! Covers:
//! - Purchase receipt number format and per-season uniqueness
//! - Sales number format, parsing and per-day ordering
//! - Split child numbers never collide with sequence-generated numbers

use chrono::NaiveDate;
use proptest::prelude::*;
use std::collections::HashSet;

use shared::ledger::{
    format_receipt_number, format_sales_number, parse_sales_sequence, split_child_receipt_numbers,
};

// ============================================================================
// Property Test Strategies
// ============================================================================

fn season_code_strategy() -> impl Strategy<Value = String> {
    "[A-Z]{2,4}2[0-9]{3}"
}

fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (2024i32..=2030, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

proptest! {
    /// Distinct sequence numbers always produce distinct receipt numbers
    /// within a season
    #[test]
    fn test_receipt_numbers_unique_within_season(
        code in season_code_strategy(),
        sequences in prop::collection::btree_set(1i64..=999_999, 1..200)
    ) {
        let numbers: Vec<String> = sequences
            .iter()
            .map(|seq| format_receipt_number(&code, *seq))
            .collect();
        let unique: HashSet<&String> = numbers.iter().collect();
        prop_assert_eq!(unique.len(), numbers.len());
    }

    /// Receipt numbers from different seasons never collide
    #[test]
    fn test_receipt_numbers_distinct_across_seasons(
        code_a in season_code_strategy(),
        code_b in season_code_strategy(),
        seq in 1i64..=999_999
    ) {
        prop_assume!(code_a != code_b);
        prop_assert_ne!(
            format_receipt_number(&code_a, seq),
            format_receipt_number(&code_b, seq)
        );
    }

    /// Sales numbers round-trip through the sequence parser
    #[test]
    fn test_sales_number_round_trip(date in date_strategy(), seq in 1u32..=9999) {
        let number = format_sales_number(date, seq);
        prop_assert_eq!(parse_sales_sequence(&number), Some(seq));
    }

    /// Within one day, lexicographic order of sales numbers matches numeric
    /// order, so "read the maximum and increment" is sound under the unique
    /// index
    #[test]
    fn test_sales_numbers_sort_numerically_within_day(
        date in date_strategy(),
        a in 1u32..=9999,
        b in 1u32..=9999
    ) {
        let number_a = format_sales_number(date, a);
        let number_b = format_sales_number(date, b);
        prop_assert_eq!(a.cmp(&b), number_a.cmp(&number_b));
    }

    /// Sales numbers from different days never collide
    #[test]
    fn test_sales_numbers_distinct_across_days(
        date_a in date_strategy(),
        date_b in date_strategy(),
        seq in 1u32..=9999
    ) {
        prop_assume!(date_a != date_b);
        prop_assert_ne!(format_sales_number(date_a, seq), format_sales_number(date_b, seq));
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[test]
fn test_receipt_number_format() {
    assert_eq!(format_receipt_number("MS2026", 1), "MS2026-000001");
    assert_eq!(format_receipt_number("MS2026", 123_456), "MS2026-123456");
}

#[test]
fn test_sales_number_format() {
    let date = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
    assert_eq!(format_sales_number(date, 1), "SALE-20260807-0001");
    assert_eq!(format_sales_number(date, 9999), "SALE-20260807-9999");
}

#[test]
fn test_parse_sales_sequence_rejects_garbage() {
    assert_eq!(parse_sales_sequence("SALE-20260807-0042"), Some(42));
    assert_eq!(parse_sales_sequence("not-a-number-x"), None);
    assert_eq!(parse_sales_sequence(""), None);
}

#[test]
fn test_split_children_never_collide_with_sequence_numbers() {
    // Sequence numbers end in six digits; child numbers end in -A/-B
    let parent = format_receipt_number("MS2026", 42);
    let (a, b) = split_child_receipt_numbers(&parent);
    assert!(a.ends_with("-A"));
    assert!(b.ends_with("-B"));

    let all: HashSet<String> = (1..=100)
        .map(|seq| format_receipt_number("MS2026", seq))
        .chain([a, b])
        .collect();
    assert_eq!(all.len(), 102);
}

#[test]
fn test_first_sale_of_day_starts_at_one() {
    // No previous number today: the next sequence is 1
    let next = None::<String>
        .as_deref()
        .and_then(parse_sales_sequence)
        .map(|n| n + 1)
        .unwrap_or(1);
    assert_eq!(next, 1);

    // A previous number increments
    let next = Some("SALE-20260807-0012".to_string())
        .as_deref()
        .and_then(parse_sales_sequence)
        .map(|n| n + 1)
        .unwrap_or(1);
    assert_eq!(next, 13);
}
