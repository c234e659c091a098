//! Sale allocation planning property-based and unit tests
//!
//! Covers:
//! - Partial allocations split, exact allocations consume whole receipts
//! - Over-allocation is always rejected
//! - Allocation totals must match the sale net weight within tolerance
//! - The auto-split sale scenario

use proptest::prelude::*;
use rust_decimal::Decimal;

use shared::ledger::{
    plan_allocation, plan_split, validate_allocation_total, AllocationAction, SplitSource,
    ALLOCATION_TOLERANCE_KG,
};

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

// ============================================================================
// Property Test Strategies
// ============================================================================

/// (requested, remaining) pairs with requested within remaining
fn satisfiable_allocation_strategy() -> impl Strategy<Value = (Decimal, Decimal)> {
    (1i64..=50_000).prop_flat_map(|remaining| {
        (1i64..=remaining, Just(remaining))
            .prop_map(|(req, rem)| (Decimal::from(req), Decimal::from(rem)))
    })
}

proptest! {
    /// A satisfiable request either consumes the whole receipt or splits off
    /// exactly the requested weight
    #[test]
    fn test_satisfiable_requests_always_plan((requested, remaining) in satisfiable_allocation_strategy()) {
        let action = plan_allocation(requested, remaining).unwrap();
        match action {
            AllocationAction::ConsumeWhole => prop_assert_eq!(requested, remaining),
            AllocationAction::SplitThenConsume { split_weight_kg } => {
                prop_assert_eq!(split_weight_kg, requested);
                prop_assert!(requested < remaining);
            }
        }
    }

    /// Requests beyond the remaining weight are always rejected
    #[test]
    fn test_over_allocation_rejected(remaining in 1i64..=50_000, excess in 1i64..=1000) {
        let remaining = Decimal::from(remaining);
        let requested = remaining + Decimal::from(excess);
        prop_assert!(plan_allocation(requested, remaining).is_err());
    }

    /// After a planned split, the carved child can satisfy the request
    /// exactly and the rest stays available
    #[test]
    fn test_split_then_consume_leaves_remainder((requested, remaining) in satisfiable_allocation_strategy()) {
        prop_assume!(requested < remaining);

        let parent = SplitSource {
            net_weight_kg: remaining,
            effective_weight_kg: remaining,
            total_deduction_percent: Decimal::ZERO,
            final_price_per_kg: dec("1.8"),
            moisture_penalty: Decimal::ZERO,
            foreign_matter_penalty: Decimal::ZERO,
            total_amount: remaining * dec("1.8"),
        };
        let plan = plan_split(&parent, requested).unwrap();

        // The carved child satisfies the request exactly
        prop_assert_eq!(plan.child1.net_weight_kg, requested);
        prop_assert_eq!(
            plan_allocation(requested, plan.child1.net_weight_kg).unwrap(),
            AllocationAction::ConsumeWhole
        );
        // The remainder stays available for later sales
        prop_assert_eq!(plan.child2.net_weight_kg, remaining - requested);
    }
}

// ============================================================================
// Unit Tests: Allocation Totals
// ============================================================================

#[test]
fn test_allocation_total_must_match_sale_weight() {
    assert!(validate_allocation_total(dec("1000"), &[dec("400"), dec("600")]).is_ok());
    assert!(validate_allocation_total(dec("1000"), &[dec("1000")]).is_ok());
    assert!(validate_allocation_total(dec("1000"), &[dec("400"), dec("500")]).is_err());
    assert!(validate_allocation_total(dec("1000"), &[dec("400"), dec("700")]).is_err());
}

#[test]
fn test_allocation_total_tolerance_is_one_kg() {
    assert_eq!(ALLOCATION_TOLERANCE_KG, Decimal::ONE);
    assert!(validate_allocation_total(dec("1000"), &[dec("999.5")]).is_ok());
    assert!(validate_allocation_total(dec("1000"), &[dec("1001")]).is_ok());
    assert!(validate_allocation_total(dec("1000"), &[dec("1001.5")]).is_err());
}

#[test]
fn test_empty_allocations_rejected() {
    assert!(validate_allocation_total(dec("1000"), &[]).is_err());
}

// ============================================================================
// Unit Tests: The Auto-Split Sale Scenario
// ============================================================================

/// Sale requests 250 kg from a receipt with 300 kg available: the receipt is
/// split into a 250 kg child mapped to the sale and a 50 kg child left
/// available.
#[test]
fn test_scenario_sale_250_from_300() {
    let action = plan_allocation(dec("250"), dec("300")).unwrap();
    assert_eq!(
        action,
        AllocationAction::SplitThenConsume {
            split_weight_kg: dec("250")
        }
    );

    let parent = SplitSource {
        net_weight_kg: dec("300"),
        effective_weight_kg: dec("276"),
        total_deduction_percent: dec("8"),
        final_price_per_kg: dec("1.8"),
        moisture_penalty: Decimal::ZERO,
        foreign_matter_penalty: Decimal::ZERO,
        total_amount: dec("496.80"),
    };
    let plan = plan_split(&parent, dec("250")).unwrap();

    // 250 kg child feeds the sale; 50 kg child stays on the stockpile
    assert_eq!(plan.child1.net_weight_kg, dec("250"));
    assert_eq!(plan.child2.net_weight_kg, dec("50"));
    assert_eq!(
        plan.child1.total_amount + plan.child2.total_amount,
        parent.total_amount
    );
}

#[test]
fn test_scenario_exact_allocation_never_splits() {
    assert_eq!(
        plan_allocation(dec("300"), dec("300")).unwrap(),
        AllocationAction::ConsumeWhole
    );
}
