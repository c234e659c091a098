//! Weighbridge indicator client
//!
//! The ledger consumes the weighbridge through this narrow seam: it asks for
//! the next measured weight and gets a plain reading back. The serial
//! protocol itself is handled by the indicator integration; in simulate mode
//! (the default for development) the client fabricates stable readings so the
//! rest of the platform can be exercised without hardware.

use chrono::Utc;
use rust_decimal::Decimal;

use crate::config::WeighbridgeConfig;
use crate::error::{AppError, AppResult};
use shared::types::WeightReading;

/// Client for the weighbridge indicator
#[derive(Clone)]
pub struct WeighbridgeClient {
    config: WeighbridgeConfig,
}

impl WeighbridgeClient {
    /// Create a client from the weighbridge configuration
    pub fn new(config: WeighbridgeConfig) -> Self {
        Self { config }
    }

    /// Read the current weight from the indicator.
    pub async fn read(&self) -> AppResult<WeightReading> {
        if self.config.simulate {
            return Ok(self.simulated_reading());
        }

        // Hardware reads go through the indicator bridge process, which owns
        // the serial port; the backend never opens it directly.
        Err(AppError::WeighbridgeUnavailable(format!(
            "indicator on {} is not connected",
            self.config.port
        )))
    }

    fn simulated_reading(&self) -> WeightReading {
        let now = Utc::now();
        // Deterministic-looking value in the lorry range, varying by time
        let kg = 8000 + (now.timestamp() % 240) * 25;
        WeightReading {
            weight_kg: Decimal::from(kg),
            unit: "kg".to_string(),
            stable: true,
            read_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simulate_config() -> WeighbridgeConfig {
        WeighbridgeConfig {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 9600,
            simulate: true,
        }
    }

    #[tokio::test]
    async fn test_simulated_reading_is_stable_and_positive() {
        let client = WeighbridgeClient::new(simulate_config());
        let reading = client.read().await.unwrap();
        assert!(reading.stable);
        assert!(reading.weight_kg > Decimal::ZERO);
        assert_eq!(reading.unit, "kg");
    }

    #[tokio::test]
    async fn test_hardware_mode_without_indicator_errors() {
        let client = WeighbridgeClient::new(WeighbridgeConfig {
            simulate: false,
            ..simulate_config()
        });
        assert!(client.read().await.is_err());
    }
}
