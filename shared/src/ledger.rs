//! Pure ledger arithmetic: receipt splitting, sale allocation planning,
//! price resolution and receipt identity formatting.
//!
//! The backend services wrap these functions in database transactions; keeping
//! the arithmetic here means every conservation invariant can be tested
//! without a live store.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::deduction::{round_amount, round_weight_kg};

// ============================================================================
// Receipt splitting
// ============================================================================

/// The fields of a purchase transaction that splitting depends on.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitSource {
    pub net_weight_kg: Decimal,
    pub effective_weight_kg: Decimal,
    pub total_deduction_percent: Decimal,
    pub final_price_per_kg: Decimal,
    pub moisture_penalty: Decimal,
    pub foreign_matter_penalty: Decimal,
    pub total_amount: Decimal,
}

/// One side of a planned split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitPortion {
    pub net_weight_kg: Decimal,
    pub effective_weight_kg: Decimal,
    pub moisture_penalty: Decimal,
    pub foreign_matter_penalty: Decimal,
    pub total_amount: Decimal,
}

/// A planned split of one receipt into two children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitPlan {
    pub child1: SplitPortion,
    pub child2: SplitPortion,
}

/// Partition a receipt's weight into two portions.
///
/// The first portion is computed proportionally: the parent's deduction rate is
/// applied to its net weight, penalties scale by the weight ratio, and the
/// amount is its effective weight at the parent's final price. The second
/// portion takes exact remainders, so the two portions always reproduce the
/// parent's net weight, effective weight, penalties and total amount without
/// rounding drift.
pub fn plan_split(parent: &SplitSource, split_weight_kg: Decimal) -> Result<SplitPlan, String> {
    if split_weight_kg <= Decimal::ZERO {
        return Err("split weight must be positive".to_string());
    }
    if split_weight_kg >= parent.net_weight_kg {
        return Err(format!(
            "split weight {} kg must be less than the receipt net weight {} kg",
            split_weight_kg, parent.net_weight_kg
        ));
    }

    let ratio = split_weight_kg / parent.net_weight_kg;
    let keep_factor =
        (Decimal::from(100) - parent.total_deduction_percent) / Decimal::from(100);

    let child1_effective = round_weight_kg(split_weight_kg * keep_factor);
    let child1_amount = round_amount(child1_effective * parent.final_price_per_kg);
    let child1_moisture = round_amount(parent.moisture_penalty * ratio);
    let child1_foreign = round_amount(parent.foreign_matter_penalty * ratio);

    let child1 = SplitPortion {
        net_weight_kg: split_weight_kg,
        effective_weight_kg: child1_effective,
        moisture_penalty: child1_moisture,
        foreign_matter_penalty: child1_foreign,
        total_amount: child1_amount,
    };

    // Remainders land on the second child so the conservation invariants hold
    // exactly rather than within tolerance.
    let child2 = SplitPortion {
        net_weight_kg: parent.net_weight_kg - split_weight_kg,
        effective_weight_kg: parent.effective_weight_kg - child1_effective,
        moisture_penalty: parent.moisture_penalty - child1_moisture,
        foreign_matter_penalty: parent.foreign_matter_penalty - child1_foreign,
        total_amount: parent.total_amount - child1_amount,
    };

    Ok(SplitPlan { child1, child2 })
}

// ============================================================================
// Sale allocation planning
// ============================================================================

/// How a requested quantity is drawn from one purchase receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "action")]
pub enum AllocationAction {
    /// The receipt's full remaining weight is consumed; map it directly.
    ConsumeWhole,
    /// Carve a child of exactly the requested weight and map the child.
    SplitThenConsume { split_weight_kg: Decimal },
}

/// Decide how to draw `requested_kg` from a receipt with `remaining_kg` left.
pub fn plan_allocation(
    requested_kg: Decimal,
    remaining_kg: Decimal,
) -> Result<AllocationAction, String> {
    if requested_kg <= Decimal::ZERO {
        return Err("requested quantity must be positive".to_string());
    }
    if requested_kg > remaining_kg {
        return Err(format!(
            "requested {} kg exceeds the {} kg remaining on this receipt",
            requested_kg, remaining_kg
        ));
    }
    if requested_kg == remaining_kg {
        Ok(AllocationAction::ConsumeWhole)
    } else {
        Ok(AllocationAction::SplitThenConsume {
            split_weight_kg: requested_kg,
        })
    }
}

/// Allocations must account for the sale's net weight within one kilogram,
/// the storage precision of weights in this domain.
pub const ALLOCATION_TOLERANCE_KG: Decimal = Decimal::ONE;

/// Check that allocation quantities match the sale's net weight.
pub fn validate_allocation_total(
    sale_net_weight_kg: Decimal,
    quantities: &[Decimal],
) -> Result<(), String> {
    if quantities.is_empty() {
        return Err("a sale needs at least one purchase allocation".to_string());
    }
    let total: Decimal = quantities.iter().copied().sum();
    let diff = (total - sale_net_weight_kg).abs();
    if diff > ALLOCATION_TOLERANCE_KG {
        return Err(format!(
            "allocations total {} kg but the sale net weight is {} kg",
            total, sale_net_weight_kg
        ));
    }
    Ok(())
}

// ============================================================================
// Price resolution
// ============================================================================

/// One entry of a (season, product) price history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub price_per_ton: Decimal,
    pub effective_at: DateTime<Utc>,
}

/// Resolve the price in effect at `at`: the entry with the greatest
/// effective_at that is not later than `at`. Later entries win ties, matching
/// the append-only history order. Returns None when no price was in effect.
pub fn resolve_price_at(history: &[PricePoint], at: DateTime<Utc>) -> Option<Decimal> {
    let mut best: Option<&PricePoint> = None;
    for point in history {
        if point.effective_at <= at {
            match best {
                Some(current) if current.effective_at > point.effective_at => {}
                _ => best = Some(point),
            }
        }
    }
    best.map(|p| p.price_per_ton)
}

/// Season prices are quoted per ton; transactions are priced per kg.
pub fn price_per_kg(price_per_ton: Decimal) -> Decimal {
    price_per_ton / Decimal::from(crate::types::KG_PER_TON)
}

// ============================================================================
// Receipt identity formatting
// ============================================================================

/// Purchase receipt number: one sequence per season, `<season_code>-NNNNNN`.
pub fn format_receipt_number(season_code: &str, sequence: i64) -> String {
    format!("{}-{:06}", season_code, sequence)
}

/// Receipt numbers for the two children of a split.
pub fn split_child_receipt_numbers(parent_receipt: &str) -> (String, String) {
    (
        format!("{}-A", parent_receipt),
        format!("{}-B", parent_receipt),
    )
}

/// Sales number: one sequence per calendar day, `SALE-YYYYMMDD-NNNN`.
pub fn format_sales_number(date: NaiveDate, sequence: u32) -> String {
    format!("SALE-{}-{:04}", date.format("%Y%m%d"), sequence)
}

/// Extract the numeric suffix of a sales number, e.g. `SALE-20260807-0012` → 12.
pub fn parse_sales_sequence(sales_number: &str) -> Option<u32> {
    sales_number.rsplit('-').next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn sample_parent() -> SplitSource {
        // 800 kg net at 8% deduction and RM 1.80/kg: 736 kg effective, RM 1324.80
        SplitSource {
            net_weight_kg: dec("800"),
            effective_weight_kg: dec("736"),
            total_deduction_percent: dec("8"),
            final_price_per_kg: dec("1.8"),
            moisture_penalty: dec("0"),
            foreign_matter_penalty: dec("0"),
            total_amount: dec("1324.80"),
        }
    }

    #[test]
    fn test_split_weights_conserved_exactly() {
        let plan = plan_split(&sample_parent(), dec("300")).unwrap();
        assert_eq!(plan.child1.net_weight_kg, dec("300"));
        assert_eq!(plan.child2.net_weight_kg, dec("500"));
        assert_eq!(
            plan.child1.net_weight_kg + plan.child2.net_weight_kg,
            dec("800")
        );
        assert_eq!(
            plan.child1.effective_weight_kg + plan.child2.effective_weight_kg,
            dec("736")
        );
    }

    #[test]
    fn test_split_amounts_conserved_exactly() {
        let plan = plan_split(&sample_parent(), dec("300")).unwrap();
        // child1: 276 kg effective at 1.80 = 496.80; child2 takes the rest
        assert_eq!(plan.child1.total_amount, dec("496.80"));
        assert_eq!(plan.child2.total_amount, dec("828.00"));
        assert_eq!(
            plan.child1.total_amount + plan.child2.total_amount,
            dec("1324.80")
        );
    }

    #[test]
    fn test_split_rejects_out_of_range_weights() {
        let parent = sample_parent();
        assert!(plan_split(&parent, Decimal::ZERO).is_err());
        assert!(plan_split(&parent, dec("-5")).is_err());
        assert!(plan_split(&parent, dec("800")).is_err());
        assert!(plan_split(&parent, dec("900")).is_err());
    }

    #[test]
    fn test_split_scales_penalties_proportionally() {
        let parent = SplitSource {
            moisture_penalty: dec("40.00"),
            foreign_matter_penalty: dec("24.00"),
            ..sample_parent()
        };
        let plan = plan_split(&parent, dec("300")).unwrap();
        assert_eq!(plan.child1.moisture_penalty, dec("15.00"));
        assert_eq!(plan.child2.moisture_penalty, dec("25.00"));
        assert_eq!(
            plan.child1.foreign_matter_penalty + plan.child2.foreign_matter_penalty,
            dec("24.00")
        );
    }

    #[test]
    fn test_plan_allocation_partial_splits() {
        let action = plan_allocation(dec("250"), dec("300")).unwrap();
        assert_eq!(
            action,
            AllocationAction::SplitThenConsume {
                split_weight_kg: dec("250")
            }
        );
    }

    #[test]
    fn test_plan_allocation_exact_consumes_whole() {
        assert_eq!(
            plan_allocation(dec("300"), dec("300")).unwrap(),
            AllocationAction::ConsumeWhole
        );
    }

    #[test]
    fn test_plan_allocation_rejects_over_request() {
        assert!(plan_allocation(dec("301"), dec("300")).is_err());
        assert!(plan_allocation(Decimal::ZERO, dec("300")).is_err());
    }

    #[test]
    fn test_allocation_total_tolerance() {
        assert!(validate_allocation_total(dec("1000"), &[dec("600"), dec("400")]).is_ok());
        assert!(validate_allocation_total(dec("1000"), &[dec("600"), dec("399.5")]).is_ok());
        assert!(validate_allocation_total(dec("1000"), &[dec("600"), dec("350")]).is_err());
        assert!(validate_allocation_total(dec("1000"), &[]).is_err());
    }

    #[test]
    fn test_resolve_price_at_latest_not_later() {
        let t = |d: u32| Utc.with_ymd_and_hms(2026, 3, d, 12, 0, 0).unwrap();
        let history = vec![
            PricePoint {
                price_per_ton: dec("1700"),
                effective_at: t(1),
            },
            PricePoint {
                price_per_ton: dec("1800"),
                effective_at: t(10),
            },
            PricePoint {
                price_per_ton: dec("1750"),
                effective_at: t(20),
            },
        ];
        assert_eq!(resolve_price_at(&history, t(5)), Some(dec("1700")));
        assert_eq!(resolve_price_at(&history, t(10)), Some(dec("1800")));
        assert_eq!(resolve_price_at(&history, t(15)), Some(dec("1800")));
        assert_eq!(resolve_price_at(&history, t(25)), Some(dec("1750")));
    }

    #[test]
    fn test_resolve_price_before_any_entry() {
        let t = Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).unwrap();
        let history = vec![PricePoint {
            price_per_ton: dec("1800"),
            effective_at: t,
        }];
        let earlier = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(resolve_price_at(&history, earlier), None);
        assert_eq!(resolve_price_at(&[], t), None);
    }

    #[test]
    fn test_resolve_price_ties_prefer_later_entry() {
        let t = Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).unwrap();
        let history = vec![
            PricePoint {
                price_per_ton: dec("1800"),
                effective_at: t,
            },
            PricePoint {
                price_per_ton: dec("1850"),
                effective_at: t,
            },
        ];
        assert_eq!(resolve_price_at(&history, t), Some(dec("1850")));
    }

    #[test]
    fn test_price_per_kg() {
        assert_eq!(price_per_kg(dec("1800")), dec("1.8"));
    }

    #[test]
    fn test_receipt_number_format() {
        assert_eq!(format_receipt_number("MS2026-1", 42), "MS2026-1-000042");
    }

    #[test]
    fn test_split_child_receipt_numbers() {
        let (a, b) = split_child_receipt_numbers("MS2026-1-000042");
        assert_eq!(a, "MS2026-1-000042-A");
        assert_eq!(b, "MS2026-1-000042-B");
    }

    #[test]
    fn test_sales_number_format_and_parse() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        let number = format_sales_number(date, 12);
        assert_eq!(number, "SALE-20260807-0012");
        assert_eq!(parse_sales_sequence(&number), Some(12));
        assert_eq!(parse_sales_sequence("SALE-20260807-9999"), Some(9999));
        assert_eq!(parse_sales_sequence("garbage"), None);
    }
}
