//! Common types used across the platform

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Kilograms per metric ton; season prices are quoted per ton, transactions per kg.
pub const KG_PER_TON: i64 = 1000;

/// Operating mode of a season. DEMO seasons exist for operator training and
/// must never contribute to LIVE inventory or financial aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum SeasonMode {
    #[default]
    Live,
    Demo,
}

impl SeasonMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeasonMode::Live => "LIVE",
            SeasonMode::Demo => "DEMO",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "LIVE" => Some(SeasonMode::Live),
            "DEMO" => Some(SeasonMode::Demo),
            _ => None,
        }
    }
}

/// Season lifecycle status. At most one season is active at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeasonStatus {
    Planned,
    Active,
    Closed,
    Cancelled,
}

impl SeasonStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeasonStatus::Planned => "planned",
            SeasonStatus::Active => "active",
            SeasonStatus::Closed => "closed",
            SeasonStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "planned" => Some(SeasonStatus::Planned),
            "active" => Some(SeasonStatus::Active),
            "closed" => Some(SeasonStatus::Closed),
            "cancelled" => Some(SeasonStatus::Cancelled),
            _ => None,
        }
    }
}

/// Ledger transaction status. Cancellation is an auditable record, never a delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Completed,
    Cancelled,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Completed => "completed",
            TransactionStatus::Cancelled => "cancelled",
        }
    }
}

/// Payment status of a purchase receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Paid => "paid",
        }
    }
}

/// Payment status of a sales transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalePaymentStatus {
    Pending,
    Paid,
}

impl SalePaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SalePaymentStatus::Pending => "pending",
            SalePaymentStatus::Paid => "paid",
        }
    }
}

/// A weight reading delivered by the weighbridge provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightReading {
    pub weight_kg: Decimal,
    pub unit: String,
    /// False while the platform is still settling.
    pub stable: bool,
    pub read_at: chrono::DateTime<chrono::Utc>,
}

/// Date range for ledger queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateRange {
    pub start: chrono::NaiveDate,
    pub end: chrono::NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_season_mode_round_trip() {
        assert_eq!(SeasonMode::from_str("LIVE"), Some(SeasonMode::Live));
        assert_eq!(SeasonMode::from_str("DEMO"), Some(SeasonMode::Demo));
        assert_eq!(SeasonMode::from_str("live"), None);
        assert_eq!(SeasonMode::Live.as_str(), "LIVE");
    }

    #[test]
    fn test_season_status_round_trip() {
        for s in ["planned", "active", "closed", "cancelled"] {
            assert_eq!(SeasonStatus::from_str(s).map(|v| v.as_str()), Some(s));
        }
        assert_eq!(SeasonStatus::from_str("open"), None);
    }
}
