//! Deduction calculator property-based and unit tests
//!
//! Covers:
//! - Effective weight = net × (1 − total rate / 100), rounded to whole kg
//! - Determinism and idempotence of the calculation
//! - Legacy deduction configuration migration
//! - The standard purchase pricing scenario

use proptest::prelude::*;
use rust_decimal::Decimal;

use shared::deduction::{
    apply_deductions, round_amount, round_weight_kg, DeductionConfig, DeductionLine,
    LEGACY_PRESET_NAME,
};

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

// ============================================================================
// Property Test Strategies
// ============================================================================

/// Net weights from 1 kg to 60 t, in 0.1 kg steps
fn net_weight_strategy() -> impl Strategy<Value = Decimal> {
    (10i64..=600_000).prop_map(|n| Decimal::new(n, 1))
}

/// Deduction lists whose percentages sum to at most 100
fn deduction_list_strategy() -> impl Strategy<Value = Vec<DeductionLine>> {
    prop::collection::vec(0i64..=200, 0..5).prop_map(|raw| {
        // Each entry is tenths of a percent; cap keeps the sum under 100%
        raw.into_iter()
            .enumerate()
            .map(|(i, tenths)| DeductionLine {
                name: format!("Deduction {}", i + 1),
                percent: Decimal::new(tenths, 1),
            })
            .collect()
    })
}

proptest! {
    /// Effective weight follows the formula exactly, up to whole-kg rounding
    #[test]
    fn test_effective_weight_formula(
        net in net_weight_strategy(),
        items in deduction_list_strategy()
    ) {
        let outcome = apply_deductions(net, &items).unwrap();

        let total: Decimal = items.iter().map(|i| i.percent).sum();
        prop_assert_eq!(outcome.total_rate_percent, total);

        if items.is_empty() {
            prop_assert_eq!(outcome.effective_weight_kg, net);
        } else {
            let exact = net * (Decimal::from(100) - total) / Decimal::from(100);
            let diff = (outcome.effective_weight_kg - exact).abs();
            prop_assert!(diff <= dec("0.5"), "rounding moved more than half a kg");
        }

        // Conservation: effective + deducted = net
        prop_assert_eq!(
            outcome.effective_weight_kg + outcome.deducted_weight_kg,
            net
        );
    }

    /// Rerunning the calculator on the same inputs yields the same outcome
    #[test]
    fn test_deterministic(
        net in net_weight_strategy(),
        items in deduction_list_strategy()
    ) {
        let a = apply_deductions(net, &items).unwrap();
        let b = apply_deductions(net, &items).unwrap();
        prop_assert_eq!(a, b);
    }

    /// Effective weight never exceeds net and never goes negative
    #[test]
    fn test_effective_weight_bounds(
        net in net_weight_strategy(),
        items in deduction_list_strategy()
    ) {
        let outcome = apply_deductions(net, &items).unwrap();
        prop_assert!(outcome.effective_weight_kg >= Decimal::ZERO);
        prop_assert!(outcome.effective_weight_kg <= round_weight_kg(net).max(net));
    }
}

// ============================================================================
// Unit Tests: Calculator
// ============================================================================

#[test]
fn test_empty_deductions_identity() {
    let outcome = apply_deductions(dec("812.4"), &[]).unwrap();
    assert_eq!(outcome.effective_weight_kg, dec("812.4"));
    assert_eq!(outcome.deducted_weight_kg, Decimal::ZERO);
}

#[test]
fn test_standard_purchase_scenario() {
    // 1000 kg gross, 200 kg tare, 5% moisture + 3% foreign matter at
    // RM 1800/ton: 800 kg net, 8% total, 736 kg effective, RM 1324.80.
    let net = dec("1000") - dec("200");
    let items = vec![
        DeductionLine {
            name: "Moisture".to_string(),
            percent: dec("5"),
        },
        DeductionLine {
            name: "Foreign Matter".to_string(),
            percent: dec("3"),
        },
    ];

    let outcome = apply_deductions(net, &items).unwrap();
    assert_eq!(outcome.total_rate_percent, dec("8"));
    assert_eq!(outcome.effective_weight_kg, dec("736"));

    let price_per_kg = dec("1800") / Decimal::from(1000);
    assert_eq!(price_per_kg, dec("1.8"));
    let total = round_amount(outcome.effective_weight_kg * price_per_kg);
    assert_eq!(total, dec("1324.80"));
}

#[test]
fn test_rejects_rates_over_100() {
    let items = vec![DeductionLine {
        name: "Everything".to_string(),
        percent: dec("100.1"),
    }];
    assert!(apply_deductions(dec("500"), &items).is_err());
}

#[test]
fn test_full_deduction_gives_zero_effective() {
    let items = vec![DeductionLine {
        name: "Everything".to_string(),
        percent: dec("100"),
    }];
    let outcome = apply_deductions(dec("500"), &items).unwrap();
    assert_eq!(outcome.effective_weight_kg, Decimal::ZERO);
    assert_eq!(outcome.deducted_weight_kg, dec("500"));
}

// ============================================================================
// Unit Tests: Configuration Migration
// ============================================================================

#[test]
fn test_flat_config_migrates_to_single_preset() {
    let legacy = serde_json::json!([
        {"name": "Moisture", "value": 5},
        {"name": "Foreign Matter", "value": 3}
    ]);
    let config = DeductionConfig::from_value(&legacy).unwrap();
    assert_eq!(config.presets.len(), 1);
    assert_eq!(config.presets[0].name, LEGACY_PRESET_NAME);
    assert_eq!(config.presets[0].items.len(), 2);
}

#[test]
fn test_preset_array_config_migrates_field_by_field() {
    let legacy = serde_json::json!([
        {"preset_name": "Wet Season", "deductions": [{"name": "Moisture", "value": "7.5"}]}
    ]);
    let config = DeductionConfig::from_value(&legacy).unwrap();
    assert_eq!(config.presets[0].name, "Wet Season");
    assert_eq!(config.presets[0].items[0].percent, dec("7.5"));
}

#[test]
fn test_versioned_config_round_trips() {
    let config = DeductionConfig::from_value(&serde_json::json!([
        {"name": "Moisture", "value": 5}
    ]))
    .unwrap();
    let serialized = serde_json::to_value(&config).unwrap();
    let reparsed = DeductionConfig::from_value(&serialized).unwrap();
    assert_eq!(config, reparsed);
}

#[test]
fn test_migrated_config_feeds_calculator() {
    let legacy = serde_json::json!([
        {"name": "Moisture", "value": 5},
        {"name": "Foreign Matter", "value": 3}
    ]);
    let config = DeductionConfig::from_value(&legacy).unwrap();
    let preset = config.default_preset().unwrap();
    let outcome = apply_deductions(dec("800"), &preset.items).unwrap();
    assert_eq!(outcome.effective_weight_kg, dec("736"));
}
