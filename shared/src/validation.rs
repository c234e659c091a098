//! Validation utilities for the Paddy Collection Management Platform
//!
//! Includes Malaysia-specific validations for farmer registration records.

use rust_decimal::Decimal;

// ============================================================================
// Weighbridge / Ledger Validations
// ============================================================================

/// Validate a gross/tare weight pair from the weighbridge.
pub fn validate_weights(gross_kg: Decimal, tare_kg: Decimal) -> Result<(), &'static str> {
    if gross_kg <= Decimal::ZERO {
        return Err("Gross weight must be positive");
    }
    if tare_kg < Decimal::ZERO {
        return Err("Tare weight cannot be negative");
    }
    if gross_kg <= tare_kg {
        return Err("Gross weight must exceed tare weight");
    }
    Ok(())
}

/// Validate a percentage reading (moisture, foreign matter).
pub fn validate_percent(value: Decimal) -> Result<(), &'static str> {
    if value < Decimal::ZERO || value > Decimal::from(100) {
        return Err("Percentage must be between 0 and 100");
    }
    Ok(())
}

/// Validate a price per ton.
pub fn validate_price_per_ton(price: Decimal) -> Result<(), &'static str> {
    if price <= Decimal::ZERO {
        return Err("Price per ton must be positive");
    }
    Ok(())
}

/// Validate a season code (3-12 uppercase alphanumeric, dashes allowed).
pub fn validate_season_code(code: &str) -> Result<(), &'static str> {
    if code.len() < 3 {
        return Err("Season code must be at least 3 characters");
    }
    if code.len() > 12 {
        return Err("Season code must be at most 12 characters");
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
    {
        return Err("Season code must be uppercase alphanumeric");
    }
    Ok(())
}

/// Validate a farmer code (3-10 uppercase alphanumeric).
pub fn validate_farmer_code(code: &str) -> Result<(), &'static str> {
    if code.len() < 3 {
        return Err("Farmer code must be at least 3 characters");
    }
    if code.len() > 10 {
        return Err("Farmer code must be at most 10 characters");
    }
    if !code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()) {
        return Err("Farmer code must be uppercase alphanumeric only");
    }
    Ok(())
}

// ============================================================================
// Malaysia-Specific Validations
// ============================================================================

/// Validate a Malaysian phone number.
/// Accepts: 0123456789, 012-345-6789, +60123456789
pub fn validate_malaysian_phone(phone: &str) -> Result<(), &'static str> {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    // Domestic format: 9-11 digits starting with 0 (e.g. 0123456789)
    if (9..=11).contains(&digits.len()) && digits.starts_with('0') {
        return Ok(());
    }
    // International format with country code: starts with 60
    if (10..=12).contains(&digits.len()) && digits.starts_with("60") {
        return Ok(());
    }

    Err("Invalid Malaysian phone number format")
}

/// Validate a Malaysian National Registration Identity Card (MyKad) number.
/// Format: YYMMDD-PB-###G, 12 digits with a valid embedded birth date.
pub fn validate_mykad(id: &str) -> Result<(), &'static str> {
    let digits: String = id.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.len() != 12 {
        return Err("MyKad number must be 12 digits");
    }

    let month: u32 = digits[2..4].parse().map_err(|_| "Invalid MyKad format")?;
    let day: u32 = digits[4..6].parse().map_err(|_| "Invalid MyKad format")?;

    if !(1..=12).contains(&month) {
        return Err("Invalid birth month in MyKad number");
    }
    if !(1..=31).contains(&day) {
        return Err("Invalid birth day in MyKad number");
    }

    Ok(())
}

/// Malaysian states with significant paddy cultivation (jelapang padi).
pub const MALAYSIAN_PADDY_STATES: &[&str] = &[
    "Kedah",
    "Perlis",
    "Pulau Pinang",
    "Perak",
    "Selangor",
    "Kelantan",
    "Terengganu",
    "Pahang",
    "Sabah",
    "Sarawak",
];

/// Validate that a state is a recognised paddy-growing region.
pub fn validate_paddy_state(state: &str) -> Result<(), &'static str> {
    let lowered = state.to_lowercase();
    if MALAYSIAN_PADDY_STATES
        .iter()
        .any(|s| s.to_lowercase() == lowered)
    {
        Ok(())
    } else {
        Err("State is not a recognised paddy-growing region")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    // ========================================================================
    // Ledger Validation Tests
    // ========================================================================

    #[test]
    fn test_validate_weights_valid() {
        assert!(validate_weights(dec("1000"), dec("200")).is_ok());
        assert!(validate_weights(dec("1000"), Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_validate_weights_invalid() {
        assert!(validate_weights(Decimal::ZERO, Decimal::ZERO).is_err());
        assert!(validate_weights(dec("-100"), Decimal::ZERO).is_err());
        assert!(validate_weights(dec("200"), dec("200")).is_err());
        assert!(validate_weights(dec("200"), dec("300")).is_err());
        assert!(validate_weights(dec("200"), dec("-1")).is_err());
    }

    #[test]
    fn test_validate_percent() {
        assert!(validate_percent(Decimal::ZERO).is_ok());
        assert!(validate_percent(dec("14.5")).is_ok());
        assert!(validate_percent(dec("100")).is_ok());
        assert!(validate_percent(dec("-0.1")).is_err());
        assert!(validate_percent(dec("100.1")).is_err());
    }

    #[test]
    fn test_validate_price_per_ton() {
        assert!(validate_price_per_ton(dec("1800")).is_ok());
        assert!(validate_price_per_ton(Decimal::ZERO).is_err());
        assert!(validate_price_per_ton(dec("-1")).is_err());
    }

    #[test]
    fn test_validate_season_code() {
        assert!(validate_season_code("MS2026-1").is_ok());
        assert!(validate_season_code("OFF26").is_ok());
        assert!(validate_season_code("ms2026").is_err()); // lowercase
        assert!(validate_season_code("MS").is_err()); // too short
        assert!(validate_season_code("MS2026-SEASON1").is_err()); // too long
    }

    #[test]
    fn test_validate_farmer_code() {
        assert!(validate_farmer_code("F0001").is_ok());
        assert!(validate_farmer_code("KDH001").is_ok());
        assert!(validate_farmer_code("f1").is_err());
        assert!(validate_farmer_code("F-1").is_err());
    }

    // ========================================================================
    // Malaysia-Specific Validation Tests
    // ========================================================================

    #[test]
    fn test_validate_malaysian_phone_valid() {
        assert!(validate_malaysian_phone("0123456789").is_ok());
        assert!(validate_malaysian_phone("012-345-6789").is_ok());
        assert!(validate_malaysian_phone("+60123456789").is_ok());
        assert!(validate_malaysian_phone("60123456789").is_ok());
        // Landline (Kedah area code)
        assert!(validate_malaysian_phone("04-7331234").is_ok());
    }

    #[test]
    fn test_validate_malaysian_phone_invalid() {
        assert!(validate_malaysian_phone("12345").is_err());
        assert!(validate_malaysian_phone("abcdefghij").is_err());
        assert!(validate_malaysian_phone("1234567890123").is_err());
    }

    #[test]
    fn test_validate_mykad_valid() {
        assert!(validate_mykad("850101-02-5123").is_ok());
        assert!(validate_mykad("850101025123").is_ok());
    }

    #[test]
    fn test_validate_mykad_invalid() {
        assert!(validate_mykad("12345").is_err());
        // Month 13
        assert!(validate_mykad("851301-02-5123").is_err());
        // Day 32
        assert!(validate_mykad("850132-02-5123").is_err());
        assert!(validate_mykad("8501010251234").is_err()); // 13 digits
    }

    #[test]
    fn test_validate_paddy_state() {
        assert!(validate_paddy_state("Kedah").is_ok());
        assert!(validate_paddy_state("kedah").is_ok()); // case insensitive
        assert!(validate_paddy_state("Kuala Lumpur").is_err());
    }
}
