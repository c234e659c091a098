//! Paddy grade thresholds and quality penalty pricing
//!
//! When a purchase is recorded without an explicit deduction configuration,
//! the price is adjusted by measured moisture and foreign matter against the
//! grade's thresholds: every percentage point above a threshold deducts
//! `penalty_per_percent` from the price per kg.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::deduction::round_amount;

/// The quality thresholds of a paddy grade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeThresholds {
    pub max_moisture_percent: Decimal,
    pub max_foreign_matter_percent: Decimal,
    /// Price deduction per kg for each percentage point above a threshold.
    pub penalty_per_percent: Decimal,
}

/// Computed pricing of a purchase after quality penalties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchasePricing {
    /// Absolute penalty amounts for the whole transaction.
    pub moisture_penalty: Decimal,
    pub foreign_matter_penalty: Decimal,
    pub final_price_per_kg: Decimal,
    pub total_amount: Decimal,
}

/// Price a purchase from its base price, measured quality and effective weight.
///
/// Per-kg penalties are the excess over each threshold times the grade's
/// penalty rate; the final price never drops below zero. Penalty amounts are
/// stored as per-transaction totals (per-kg penalty × effective weight) so
/// that a later split can scale them by weight ratio.
pub fn price_purchase(
    base_price_per_kg: Decimal,
    moisture_percent: Decimal,
    foreign_matter_percent: Decimal,
    grade: &GradeThresholds,
    effective_weight_kg: Decimal,
) -> PurchasePricing {
    let moisture_excess =
        (moisture_percent - grade.max_moisture_percent).max(Decimal::ZERO);
    let foreign_excess =
        (foreign_matter_percent - grade.max_foreign_matter_percent).max(Decimal::ZERO);

    let moisture_per_kg = moisture_excess * grade.penalty_per_percent;
    let foreign_per_kg = foreign_excess * grade.penalty_per_percent;

    let final_price_per_kg =
        (base_price_per_kg - moisture_per_kg - foreign_per_kg).max(Decimal::ZERO);

    PurchasePricing {
        moisture_penalty: round_amount(moisture_per_kg * effective_weight_kg),
        foreign_matter_penalty: round_amount(foreign_per_kg * effective_weight_kg),
        final_price_per_kg,
        total_amount: round_amount(final_price_per_kg * effective_weight_kg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn grade_b() -> GradeThresholds {
        GradeThresholds {
            max_moisture_percent: dec("14"),
            max_foreign_matter_percent: dec("2"),
            penalty_per_percent: dec("0.02"),
        }
    }

    #[test]
    fn test_no_penalty_within_thresholds() {
        let pricing = price_purchase(dec("1.8"), dec("13"), dec("1.5"), &grade_b(), dec("736"));
        assert_eq!(pricing.moisture_penalty, Decimal::ZERO);
        assert_eq!(pricing.foreign_matter_penalty, Decimal::ZERO);
        assert_eq!(pricing.final_price_per_kg, dec("1.8"));
        assert_eq!(pricing.total_amount, dec("1324.80"));
    }

    #[test]
    fn test_moisture_over_threshold_reduces_price() {
        // 2 points over at 0.02/kg/point = 0.04/kg off the price
        let pricing = price_purchase(dec("1.8"), dec("16"), dec("1"), &grade_b(), dec("700"));
        assert_eq!(pricing.final_price_per_kg, dec("1.76"));
        assert_eq!(pricing.moisture_penalty, dec("28.00"));
        assert_eq!(pricing.total_amount, dec("1232.00"));
    }

    #[test]
    fn test_both_penalties_stack() {
        let pricing = price_purchase(dec("1.8"), dec("16"), dec("4"), &grade_b(), dec("500"));
        // moisture: 2 × 0.02, foreign matter: 2 × 0.02
        assert_eq!(pricing.final_price_per_kg, dec("1.72"));
        assert_eq!(pricing.moisture_penalty, dec("20.00"));
        assert_eq!(pricing.foreign_matter_penalty, dec("20.00"));
    }

    #[test]
    fn test_price_floors_at_zero() {
        let harsh = GradeThresholds {
            penalty_per_percent: dec("1"),
            ..grade_b()
        };
        let pricing = price_purchase(dec("1.8"), dec("30"), dec("10"), &harsh, dec("100"));
        assert_eq!(pricing.final_price_per_kg, Decimal::ZERO);
        assert_eq!(pricing.total_amount, Decimal::ZERO);
    }
}
