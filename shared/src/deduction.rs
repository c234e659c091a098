//! Quality deduction configuration and calculator
//!
//! A season carries named deduction presets (e.g. "Standard", "Wet Season");
//! each preset is an ordered list of percentage deductions applied to the net
//! weight of a purchase. Older installations stored the configuration either
//! as a flat deduction list or as an ad hoc preset array; both shapes are
//! migrated into the versioned schema at load time.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// One named percentage deduction, e.g. {"Moisture", 5}.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeductionLine {
    pub name: String,
    pub percent: Decimal,
}

/// A named, reusable set of deduction lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeductionPreset {
    pub name: String,
    pub items: Vec<DeductionLine>,
}

/// Versioned season deduction configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DeductionConfig {
    pub presets: Vec<DeductionPreset>,
}

/// Name given to the implicit preset when migrating a legacy flat list.
pub const LEGACY_PRESET_NAME: &str = "Standard";

impl DeductionConfig {
    /// Parse a stored configuration value, accepting all historical shapes:
    ///
    /// - versioned: `{"presets": [{"name", "items": [{"name", "percent"}]}]}`
    /// - preset array: `[{"preset_name", "deductions": [{"name", "value"}]}]`
    /// - flat list: `[{"name", "value"}]` (becomes a single "Standard" preset)
    /// - null / empty array: empty configuration
    pub fn from_value(value: &serde_json::Value) -> Result<Self, String> {
        if value.is_null() {
            return Ok(DeductionConfig::default());
        }

        if value.is_object() {
            return serde_json::from_value(value.clone())
                .map_err(|e| format!("invalid deduction config: {}", e));
        }

        let items = value
            .as_array()
            .ok_or_else(|| "deduction config must be an object or array".to_string())?;

        if items.is_empty() {
            return Ok(DeductionConfig::default());
        }

        // Preset array if the first element carries a preset_name
        if items[0].get("preset_name").is_some() {
            let mut presets = Vec::with_capacity(items.len());
            for item in items {
                let name = item
                    .get("preset_name")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| "preset missing preset_name".to_string())?
                    .to_string();
                let lines = item
                    .get("deductions")
                    .and_then(|v| v.as_array())
                    .map(|list| parse_legacy_lines(list))
                    .transpose()?
                    .unwrap_or_default();
                presets.push(DeductionPreset { name, items: lines });
            }
            return Ok(DeductionConfig { presets });
        }

        // Flat list of deductions, migrated into a single implicit preset
        let lines = parse_legacy_lines(items)?;
        Ok(DeductionConfig {
            presets: vec![DeductionPreset {
                name: LEGACY_PRESET_NAME.to_string(),
                items: lines,
            }],
        })
    }

    /// The preset applied when the operator does not pick one.
    pub fn default_preset(&self) -> Option<&DeductionPreset> {
        self.presets.first()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.iter().all(|p| p.items.is_empty())
    }
}

/// Legacy lines use `value` for the percentage; accept `percent` too.
fn parse_legacy_lines(list: &[serde_json::Value]) -> Result<Vec<DeductionLine>, String> {
    let mut lines = Vec::with_capacity(list.len());
    for item in list {
        let name = item
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| "deduction line missing name".to_string())?
            .to_string();
        let raw = item
            .get("value")
            .or_else(|| item.get("percent"))
            .ok_or_else(|| format!("deduction line '{}' missing value", name))?;
        let percent = decimal_from_json(raw)
            .ok_or_else(|| format!("deduction line '{}' has a non-numeric value", name))?;
        lines.push(DeductionLine { name, percent });
    }
    Ok(lines)
}

fn decimal_from_json(value: &serde_json::Value) -> Option<Decimal> {
    if let Some(s) = value.as_str() {
        return s.parse().ok();
    }
    value.as_f64().and_then(Decimal::from_f64_retain)
}

/// Outcome of applying a deduction list to a net weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeductionOutcome {
    /// Sum of all deduction percentages.
    pub total_rate_percent: Decimal,
    /// Weight actually paid for, rounded half-up to whole kg.
    pub effective_weight_kg: Decimal,
    /// Net minus effective.
    pub deducted_weight_kg: Decimal,
    /// Per-line share of the deducted weight, in input order.
    pub allocations: Vec<DeductionAllocation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeductionAllocation {
    pub name: String,
    pub percent: Decimal,
    pub weight_kg: Decimal,
}

/// Apply an ordered deduction list to a net weight.
///
/// Effective weight = net × (1 − total/100), rounded half-up to whole kg, the
/// storage precision of this domain. An empty list returns the net weight
/// exactly. The calculation is deterministic: the engine recomputes it at
/// creation, payment update and split, and must always land on the same value.
///
/// Fails when the net weight is not positive or the percentages sum past 100
/// (which would produce a negative effective weight).
pub fn apply_deductions(
    net_weight_kg: Decimal,
    items: &[DeductionLine],
) -> Result<DeductionOutcome, String> {
    if net_weight_kg <= Decimal::ZERO {
        return Err("net weight must be positive".to_string());
    }

    let mut total_rate = Decimal::ZERO;
    for item in items {
        if item.percent < Decimal::ZERO {
            return Err(format!("deduction '{}' is negative", item.name));
        }
        total_rate += item.percent;
    }
    if total_rate > Decimal::from(100) {
        return Err(format!(
            "deductions sum to {}%, exceeding 100%",
            total_rate
        ));
    }

    if items.is_empty() {
        return Ok(DeductionOutcome {
            total_rate_percent: Decimal::ZERO,
            effective_weight_kg: net_weight_kg,
            deducted_weight_kg: Decimal::ZERO,
            allocations: Vec::new(),
        });
    }

    let factor = (Decimal::from(100) - total_rate) / Decimal::from(100);
    let effective = round_weight_kg(net_weight_kg * factor);
    let deducted = net_weight_kg - effective;

    let allocations = items
        .iter()
        .map(|item| DeductionAllocation {
            name: item.name.clone(),
            percent: item.percent,
            weight_kg: if total_rate.is_zero() {
                Decimal::ZERO
            } else {
                round_weight_kg(deducted * item.percent / total_rate)
            },
        })
        .collect();

    Ok(DeductionOutcome {
        total_rate_percent: total_rate,
        effective_weight_kg: effective,
        deducted_weight_kg: deducted,
        allocations,
    })
}

/// Round a weight to whole kilograms, half-up.
pub fn round_weight_kg(weight: Decimal) -> Decimal {
    weight.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Round a monetary amount to two decimal places, half-up.
pub fn round_amount(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn lines(items: &[(&str, &str)]) -> Vec<DeductionLine> {
        items
            .iter()
            .map(|(n, p)| DeductionLine {
                name: n.to_string(),
                percent: dec(p),
            })
            .collect()
    }

    #[test]
    fn test_empty_list_is_identity() {
        let outcome = apply_deductions(dec("800"), &[]).unwrap();
        assert_eq!(outcome.effective_weight_kg, dec("800"));
        assert_eq!(outcome.deducted_weight_kg, Decimal::ZERO);
        assert_eq!(outcome.total_rate_percent, Decimal::ZERO);
    }

    #[test]
    fn test_standard_moisture_and_foreign_matter() {
        let items = lines(&[("Moisture", "5"), ("Foreign Matter", "3")]);
        let outcome = apply_deductions(dec("800"), &items).unwrap();
        assert_eq!(outcome.total_rate_percent, dec("8"));
        assert_eq!(outcome.effective_weight_kg, dec("736"));
        assert_eq!(outcome.deducted_weight_kg, dec("64"));
    }

    #[test]
    fn test_rounds_half_up_to_whole_kg() {
        // 1001 × 0.95 = 950.95 → 951
        let items = lines(&[("Moisture", "5")]);
        let outcome = apply_deductions(dec("1001"), &items).unwrap();
        assert_eq!(outcome.effective_weight_kg, dec("951"));

        // 1910 × 0.95 = 1814.5 → 1815: half rounds up, not to even
        let outcome = apply_deductions(dec("1910"), &items).unwrap();
        assert_eq!(outcome.effective_weight_kg, dec("1815"));
    }

    #[test]
    fn test_idempotent_for_same_inputs() {
        let items = lines(&[("Moisture", "4.5"), ("Immature Grains", "2.5")]);
        let a = apply_deductions(dec("1234"), &items).unwrap();
        let b = apply_deductions(dec("1234"), &items).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rejects_total_over_100() {
        let items = lines(&[("Moisture", "60"), ("Foreign Matter", "50")]);
        assert!(apply_deductions(dec("800"), &items).is_err());
    }

    #[test]
    fn test_rejects_negative_line() {
        let items = lines(&[("Moisture", "-5")]);
        assert!(apply_deductions(dec("800"), &items).is_err());
    }

    #[test]
    fn test_rejects_non_positive_weight() {
        assert!(apply_deductions(Decimal::ZERO, &[]).is_err());
        assert!(apply_deductions(dec("-10"), &[]).is_err());
    }

    #[test]
    fn test_allocations_split_deducted_weight() {
        let items = lines(&[("Moisture", "5"), ("Foreign Matter", "3")]);
        let outcome = apply_deductions(dec("800"), &items).unwrap();
        assert_eq!(outcome.allocations.len(), 2);
        assert_eq!(outcome.allocations[0].weight_kg, dec("40"));
        assert_eq!(outcome.allocations[1].weight_kg, dec("24"));
    }

    #[test]
    fn test_parse_versioned_config() {
        let value = serde_json::json!({
            "presets": [
                {"name": "Standard", "items": [{"name": "Moisture", "percent": "5"}]}
            ]
        });
        let config = DeductionConfig::from_value(&value).unwrap();
        assert_eq!(config.presets.len(), 1);
        assert_eq!(config.presets[0].items[0].percent, dec("5"));
    }

    #[test]
    fn test_parse_legacy_flat_list() {
        let value = serde_json::json!([
            {"name": "Moisture", "value": 5},
            {"name": "Foreign Matter", "value": 3}
        ]);
        let config = DeductionConfig::from_value(&value).unwrap();
        assert_eq!(config.presets.len(), 1);
        assert_eq!(config.presets[0].name, LEGACY_PRESET_NAME);
        assert_eq!(config.presets[0].items.len(), 2);
        assert_eq!(config.presets[0].items[1].percent, dec("3"));
    }

    #[test]
    fn test_parse_legacy_preset_array() {
        let value = serde_json::json!([
            {
                "preset_name": "Wet Season",
                "deductions": [{"name": "Moisture", "value": "7.5"}]
            },
            {
                "preset_name": "Dry Season",
                "deductions": [{"name": "Moisture", "value": "3"}]
            }
        ]);
        let config = DeductionConfig::from_value(&value).unwrap();
        assert_eq!(config.presets.len(), 2);
        assert_eq!(config.presets[0].name, "Wet Season");
        assert_eq!(config.presets[0].items[0].percent, dec("7.5"));
        assert_eq!(config.default_preset().unwrap().name, "Wet Season");
    }

    #[test]
    fn test_parse_null_and_empty() {
        assert!(DeductionConfig::from_value(&serde_json::Value::Null)
            .unwrap()
            .is_empty());
        assert!(DeductionConfig::from_value(&serde_json::json!([]))
            .unwrap()
            .is_empty());
    }
}
