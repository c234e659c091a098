//! Harvesting season service
//!
//! Seasons carry the pricing and deduction configuration for a harvesting
//! period. At most one season is active at a time: activating a season closes
//! every other active season inside the same transaction.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::price::record_price;
use shared::deduction::DeductionConfig;
use shared::validation::validate_season_code;

/// Season service for season lifecycle management
#[derive(Clone)]
pub struct SeasonService {
    db: PgPool,
}

const SEASON_COLUMNS: &str = "id, season_code, season_name, year, season_number, mode, \
     opening_price_per_ton, current_price_per_ton, deduction_config, status, \
     start_date, end_date, notes, closed_at, created_at, updated_at";

/// A harvesting season row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Season {
    pub id: Uuid,
    pub season_code: String,
    pub season_name: String,
    pub year: i32,
    pub season_number: i32,
    pub mode: String,
    pub opening_price_per_ton: Option<Decimal>,
    pub current_price_per_ton: Option<Decimal>,
    pub deduction_config: Option<serde_json::Value>,
    pub status: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub closed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A season with its deduction configuration migrated to the current schema
#[derive(Debug, Clone, Serialize)]
pub struct SeasonWithConfig {
    #[serde(flatten)]
    pub season: Season,
    pub deduction_presets: DeductionConfig,
}

impl SeasonWithConfig {
    fn from_season(season: Season) -> AppResult<Self> {
        let raw = season
            .deduction_config
            .clone()
            .unwrap_or(serde_json::Value::Null);
        let deduction_presets = DeductionConfig::from_value(&raw)
            .map_err(AppError::Configuration)?;
        Ok(Self {
            season,
            deduction_presets,
        })
    }
}

/// Input for creating a season
#[derive(Debug, Deserialize)]
pub struct CreateSeasonInput {
    pub season_code: String,
    pub season_name: String,
    pub year: i32,
    pub season_number: i32,
    pub mode: Option<String>,
    pub opening_price_per_ton: Option<Decimal>,
    pub deduction_config: Option<serde_json::Value>,
    pub status: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
}

/// Input for updating a season
#[derive(Debug, Deserialize)]
pub struct UpdateSeasonInput {
    pub season_name: Option<String>,
    pub current_price_per_ton: Option<Decimal>,
    pub deduction_config: Option<serde_json::Value>,
    pub status: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Filters for listing seasons
#[derive(Debug, Default, Deserialize)]
pub struct SeasonFilters {
    pub status: Option<String>,
    pub mode: Option<String>,
    pub year: Option<i32>,
}

impl SeasonService {
    /// Create a new SeasonService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List seasons with optional filters
    pub async fn get_all(&self, filters: SeasonFilters) -> AppResult<Vec<SeasonWithConfig>> {
        let sql = format!(
            "SELECT {} FROM harvesting_seasons
             WHERE ($1::text IS NULL OR status = $1)
               AND ($2::text IS NULL OR mode = $2)
               AND ($3::int IS NULL OR year = $3)
             ORDER BY year DESC, season_number DESC",
            SEASON_COLUMNS
        );
        let seasons = sqlx::query_as::<_, Season>(&sql)
            .bind(&filters.status)
            .bind(&filters.mode)
            .bind(filters.year)
            .fetch_all(&self.db)
            .await?;

        seasons
            .into_iter()
            .map(SeasonWithConfig::from_season)
            .collect()
    }

    /// Get a season by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<SeasonWithConfig> {
        let sql = format!(
            "SELECT {} FROM harvesting_seasons WHERE id = $1",
            SEASON_COLUMNS
        );
        let season = sqlx::query_as::<_, Season>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Season".to_string()))?;
        SeasonWithConfig::from_season(season)
    }

    /// The currently active season
    pub async fn get_active(&self) -> AppResult<SeasonWithConfig> {
        let sql = format!(
            "SELECT {} FROM harvesting_seasons WHERE status = 'active'
             ORDER BY start_date DESC LIMIT 1",
            SEASON_COLUMNS
        );
        let season = sqlx::query_as::<_, Season>(&sql)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Active season".to_string()))?;
        SeasonWithConfig::from_season(season)
    }

    /// Create a season.
    ///
    /// Activation closes every other active season, and an opening price fans
    /// out to season-product prices for all active products, all in one
    /// transaction.
    pub async fn create(&self, input: CreateSeasonInput) -> AppResult<SeasonWithConfig> {
        validate_season_code(&input.season_code).map_err(|msg| AppError::Validation {
            field: "season_code".to_string(),
            message: msg.to_string(),
            message_ms: "Kod musim tidak sah".to_string(),
        })?;

        let mode = input.mode.unwrap_or_else(|| "LIVE".to_string());
        if shared::types::SeasonMode::from_str(&mode).is_none() {
            return Err(AppError::ValidationError(format!(
                "Unknown season mode '{}'",
                mode
            )));
        }
        let status = input.status.unwrap_or_else(|| "planned".to_string());
        if shared::types::SeasonStatus::from_str(&status).is_none() {
            return Err(AppError::ValidationError(format!(
                "Unknown season status '{}'",
                status
            )));
        }

        // Reject malformed deduction configs before anything is written
        if let Some(ref config) = input.deduction_config {
            DeductionConfig::from_value(config).map_err(AppError::ValidationError)?;
        }

        let mut tx = self.db.begin().await?;

        if status == "active" {
            sqlx::query(
                "UPDATE harvesting_seasons SET status = 'closed', closed_at = NOW()
                 WHERE status = 'active'",
            )
            .execute(&mut *tx)
            .await?;
        }

        let sql = format!(
            "INSERT INTO harvesting_seasons (
                season_code, season_name, year, season_number, mode,
                opening_price_per_ton, current_price_per_ton, deduction_config,
                status, start_date, end_date, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $6, $7, $8, $9, $10, $11)
            RETURNING {}",
            SEASON_COLUMNS
        );
        let season = sqlx::query_as::<_, Season>(&sql)
            .bind(&input.season_code)
            .bind(&input.season_name)
            .bind(input.year)
            .bind(input.season_number)
            .bind(&mode)
            .bind(input.opening_price_per_ton)
            .bind(&input.deduction_config)
            .bind(&status)
            .bind(input.start_date)
            .bind(input.end_date)
            .bind(&input.notes)
            .fetch_one(&mut *tx)
            .await?;

        // Seed product prices from the opening price
        if let Some(opening_price) = input.opening_price_per_ton {
            let product_ids = sqlx::query_scalar::<_, Uuid>(
                "SELECT id FROM paddy_products WHERE is_active = TRUE",
            )
            .fetch_all(&mut *tx)
            .await?;

            for product_id in &product_ids {
                record_price(
                    &mut tx,
                    season.id,
                    *product_id,
                    opening_price,
                    Some("Opening price".to_string()),
                    input.created_by,
                )
                .await?;
            }

            tracing::info!(
                season = %season.season_code,
                products = product_ids.len(),
                "Season product prices initialised"
            );
        }

        tx.commit().await?;

        tracing::info!(season = %season.season_code, status = %season.status, "Season created");
        SeasonWithConfig::from_season(season)
    }

    /// Update a season
    pub async fn update(&self, id: Uuid, input: UpdateSeasonInput) -> AppResult<SeasonWithConfig> {
        if let Some(ref status) = input.status {
            if shared::types::SeasonStatus::from_str(status).is_none() {
                return Err(AppError::ValidationError(format!(
                    "Unknown season status '{}'",
                    status
                )));
            }
        }
        if let Some(ref config) = input.deduction_config {
            DeductionConfig::from_value(config).map_err(AppError::ValidationError)?;
        }

        let mut tx = self.db.begin().await?;

        let sql = format!(
            "SELECT {} FROM harvesting_seasons WHERE id = $1 FOR UPDATE",
            SEASON_COLUMNS
        );
        let existing = sqlx::query_as::<_, Season>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Season".to_string()))?;

        if input.status.as_deref() == Some("active") {
            sqlx::query(
                "UPDATE harvesting_seasons SET status = 'closed', closed_at = NOW()
                 WHERE status = 'active' AND id != $1",
            )
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }

        let season_name = input.season_name.unwrap_or(existing.season_name);
        let current_price = input
            .current_price_per_ton
            .or(existing.current_price_per_ton);
        let deduction_config = input.deduction_config.or(existing.deduction_config);
        let status = input.status.unwrap_or(existing.status);
        let start_date = input.start_date.or(existing.start_date);
        let end_date = input.end_date.or(existing.end_date);
        let notes = input.notes.or(existing.notes);

        let sql = format!(
            "UPDATE harvesting_seasons
             SET season_name = $2, current_price_per_ton = $3, deduction_config = $4,
                 status = $5, start_date = $6, end_date = $7, notes = $8,
                 closed_at = CASE WHEN $5 = 'closed' AND closed_at IS NULL THEN NOW()
                                  ELSE closed_at END,
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            SEASON_COLUMNS
        );
        let season = sqlx::query_as::<_, Season>(&sql)
            .bind(id)
            .bind(&season_name)
            .bind(current_price)
            .bind(&deduction_config)
            .bind(&status)
            .bind(start_date)
            .bind(end_date)
            .bind(&notes)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        SeasonWithConfig::from_season(season)
    }

    /// Close the active season
    pub async fn close(&self, id: Uuid) -> AppResult<SeasonWithConfig> {
        let sql = format!(
            "UPDATE harvesting_seasons
             SET status = 'closed', closed_at = NOW(), updated_at = NOW()
             WHERE id = $1 AND status = 'active'
             RETURNING {}",
            SEASON_COLUMNS
        );
        let season = sqlx::query_as::<_, Season>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| {
                AppError::InvalidStateTransition("Only an active season can be closed".to_string())
            })?;

        tracing::info!(season = %season.season_code, "Season closed");
        SeasonWithConfig::from_season(season)
    }
}
