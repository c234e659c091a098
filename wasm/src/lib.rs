//! WebAssembly module for the Paddy Collection Management Platform
//!
//! Provides client-side computation for the desktop UI:
//! - Deduction and effective-weight previews in the weigh-out wizard
//! - Split previews before committing a receipt split
//! - Offline validation of farmer registration fields

use rust_decimal::Decimal;
use wasm_bindgen::prelude::*;

use shared::deduction::{apply_deductions, DeductionConfig, DeductionLine};
use shared::ledger::{plan_split, SplitSource};
use shared::validation::{validate_malaysian_phone, validate_mykad, validate_weights};

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    // Set up panic hook for better error messages in browser console
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Preview the deduction outcome for a net weight and deduction lines.
///
/// `deductions_json` is a list of `{name, percent}`; returns the outcome as
/// JSON: total rate, effective weight, deducted weight and per-line shares.
#[wasm_bindgen]
pub fn preview_deductions(net_weight_kg: &str, deductions_json: &str) -> Result<String, JsValue> {
    let net: Decimal = net_weight_kg
        .parse()
        .map_err(|_| JsValue::from_str("Invalid net weight"))?;
    let lines: Vec<DeductionLine> = serde_json::from_str(deductions_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid deductions JSON: {}", e)))?;

    let outcome = apply_deductions(net, &lines).map_err(|e| JsValue::from_str(&e))?;
    serde_json::to_string(&outcome).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Migrate a stored season deduction configuration (any historical shape) to
/// the current preset schema and return it as JSON.
#[wasm_bindgen]
pub fn normalize_deduction_config(config_json: &str) -> Result<String, JsValue> {
    let value: serde_json::Value = serde_json::from_str(config_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid config JSON: {}", e)))?;
    let config = DeductionConfig::from_value(&value).map_err(|e| JsValue::from_str(&e))?;
    serde_json::to_string(&config).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Preview a receipt split. `parent_json` carries the parent's ledger fields;
/// returns both child portions as JSON.
#[wasm_bindgen]
pub fn preview_split(parent_json: &str, split_weight_kg: &str) -> Result<String, JsValue> {
    #[derive(serde::Deserialize)]
    struct ParentFields {
        net_weight_kg: Decimal,
        effective_weight_kg: Decimal,
        total_deduction_percent: Decimal,
        final_price_per_kg: Decimal,
        moisture_penalty: Decimal,
        foreign_matter_penalty: Decimal,
        total_amount: Decimal,
    }

    let parent: ParentFields = serde_json::from_str(parent_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid parent JSON: {}", e)))?;
    let weight: Decimal = split_weight_kg
        .parse()
        .map_err(|_| JsValue::from_str("Invalid split weight"))?;

    let source = SplitSource {
        net_weight_kg: parent.net_weight_kg,
        effective_weight_kg: parent.effective_weight_kg,
        total_deduction_percent: parent.total_deduction_percent,
        final_price_per_kg: parent.final_price_per_kg,
        moisture_penalty: parent.moisture_penalty,
        foreign_matter_penalty: parent.foreign_matter_penalty,
        total_amount: parent.total_amount,
    };
    let plan = plan_split(&source, weight).map_err(|e| JsValue::from_str(&e))?;
    serde_json::to_string(&plan).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Validate a gross/tare pair before submission
#[wasm_bindgen]
pub fn check_weights(gross_kg: &str, tare_kg: &str) -> Option<String> {
    let gross: Decimal = match gross_kg.parse() {
        Ok(v) => v,
        Err(_) => return Some("Invalid gross weight".to_string()),
    };
    let tare: Decimal = match tare_kg.parse() {
        Ok(v) => v,
        Err(_) => return Some("Invalid tare weight".to_string()),
    };
    validate_weights(gross, tare).err().map(|e| e.to_string())
}

/// Validate a MyKad number, returning an error message or null
#[wasm_bindgen]
pub fn check_mykad(id: &str) -> Option<String> {
    validate_mykad(id).err().map(|e| e.to_string())
}

/// Validate a Malaysian phone number, returning an error message or null
#[wasm_bindgen]
pub fn check_phone(phone: &str) -> Option<String> {
    validate_malaysian_phone(phone).err().map(|e| e.to_string())
}
