//! Season-product pricing service
//!
//! Every price change is appended to the history table and the current price
//! row is upserted in the same transaction, so the current price is always
//! the latest history entry for the (season, product) pair.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::ledger::{resolve_price_at, PricePoint};
use shared::validation::validate_price_per_ton;

/// Pricing service for season-product prices
#[derive(Clone)]
pub struct PricingService {
    db: PgPool,
}

/// A season-product price with product details
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SeasonProductPrice {
    pub id: Uuid,
    pub season_id: Uuid,
    pub product_id: Uuid,
    pub opening_price_per_ton: Decimal,
    pub current_price_per_ton: Decimal,
    pub product_code: String,
    pub product_name: String,
    pub product_type: String,
    pub variety: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One price history entry
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PriceHistoryEntry {
    pub id: Uuid,
    pub season_id: Uuid,
    pub product_id: Uuid,
    pub price_per_ton: Decimal,
    pub effective_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Opening price for one product when initialising a season
#[derive(Debug, Clone, Deserialize)]
pub struct ProductOpeningPrice {
    pub product_id: Uuid,
    pub opening_price_per_ton: Decimal,
}

#[derive(Debug, FromRow)]
struct HistoryPointRow {
    price_per_ton: Decimal,
    effective_at: DateTime<Utc>,
}

impl PricingService {
    /// Create a new PricingService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// All product prices for a season
    pub async fn get_season_product_prices(
        &self,
        season_id: Uuid,
    ) -> AppResult<Vec<SeasonProductPrice>> {
        let prices = sqlx::query_as::<_, SeasonProductPrice>(
            r#"
            SELECT spp.id, spp.season_id, spp.product_id,
                   spp.opening_price_per_ton, spp.current_price_per_ton,
                   p.product_code, p.product_name, p.product_type, p.variety,
                   spp.created_at, spp.updated_at
            FROM season_product_prices spp
            JOIN paddy_products p ON p.id = spp.product_id
            WHERE spp.season_id = $1
            ORDER BY p.product_type, p.variety, p.product_name
            "#,
        )
        .bind(season_id)
        .fetch_all(&self.db)
        .await?;
        Ok(prices)
    }

    /// Current price per ton for a (season, product) pair.
    ///
    /// A pair with no price configured is an operator error, never a
    /// default-to-zero case: purchase creation must be blocked on it.
    pub async fn current_price(&self, season_id: Uuid, product_id: Uuid) -> AppResult<Decimal> {
        sqlx::query_scalar::<_, Decimal>(
            "SELECT current_price_per_ton FROM season_product_prices
             WHERE season_id = $1 AND product_id = $2",
        )
        .bind(season_id)
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| {
            AppError::Configuration(
                "No price configured for this product in this season; set one under Settings > Prices"
                    .to_string(),
            )
        })
    }

    /// Price per ton in effect at a point in time, resolved from the
    /// append-only history.
    pub async fn price_at(
        &self,
        season_id: Uuid,
        product_id: Uuid,
        at: DateTime<Utc>,
    ) -> AppResult<Decimal> {
        let rows = sqlx::query_as::<_, HistoryPointRow>(
            "SELECT price_per_ton, effective_at FROM product_price_history
             WHERE season_id = $1 AND product_id = $2
             ORDER BY effective_at, created_at",
        )
        .bind(season_id)
        .bind(product_id)
        .fetch_all(&self.db)
        .await?;

        let history: Vec<PricePoint> = rows
            .into_iter()
            .map(|r| PricePoint {
                price_per_ton: r.price_per_ton,
                effective_at: r.effective_at,
            })
            .collect();

        resolve_price_at(&history, at).ok_or_else(|| {
            AppError::NotFound("Price for this product at the requested time".to_string())
        })
    }

    /// Update a product's price for a season
    pub async fn update_product_price(
        &self,
        season_id: Uuid,
        product_id: Uuid,
        price_per_ton: Decimal,
        notes: Option<String>,
        created_by: Option<Uuid>,
    ) -> AppResult<()> {
        validate_price_per_ton(price_per_ton).map_err(|msg| AppError::Validation {
            field: "price_per_ton".to_string(),
            message: msg.to_string(),
            message_ms: "Harga setiap tan mesti positif".to_string(),
        })?;

        let product_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM paddy_products WHERE id = $1)",
        )
        .bind(product_id)
        .fetch_one(&self.db)
        .await?;
        if !product_exists {
            return Err(AppError::NotFound("Product".to_string()));
        }

        let mut tx = self.db.begin().await?;

        record_price(&mut tx, season_id, product_id, price_per_ton, notes, created_by).await?;

        tx.commit().await?;

        tracing::info!(%season_id, %product_id, price = %price_per_ton, "Product price updated");
        Ok(())
    }

    /// Initialise prices for a season's products, writing opening history
    /// entries. Called when a season is created.
    pub async fn initialize_season_prices(
        &self,
        season_id: Uuid,
        product_prices: Vec<ProductOpeningPrice>,
        created_by: Option<Uuid>,
    ) -> AppResult<usize> {
        let mut tx = self.db.begin().await?;

        for price in &product_prices {
            record_price(
                &mut tx,
                season_id,
                price.product_id,
                price.opening_price_per_ton,
                Some("Opening price".to_string()),
                created_by,
            )
            .await?;
        }

        tx.commit().await?;
        Ok(product_prices.len())
    }

    /// Copy current prices from another season as the target's opening prices
    pub async fn copy_prices_from_season(
        &self,
        target_season_id: Uuid,
        source_season_id: Uuid,
        created_by: Option<Uuid>,
    ) -> AppResult<usize> {
        let source_prices = sqlx::query_as::<_, (Uuid, Decimal)>(
            "SELECT product_id, current_price_per_ton FROM season_product_prices
             WHERE season_id = $1",
        )
        .bind(source_season_id)
        .fetch_all(&self.db)
        .await?;

        if source_prices.is_empty() {
            return Err(AppError::NotFound(
                "Product prices in the source season".to_string(),
            ));
        }

        let mut tx = self.db.begin().await?;

        for (product_id, price) in &source_prices {
            record_price(
                &mut tx,
                target_season_id,
                *product_id,
                *price,
                Some(format!("Copied from season {}", source_season_id)),
                created_by,
            )
            .await?;
        }

        tx.commit().await?;
        Ok(source_prices.len())
    }

    /// Price history for a product in a season, newest first
    pub async fn get_price_history(
        &self,
        season_id: Uuid,
        product_id: Uuid,
    ) -> AppResult<Vec<PriceHistoryEntry>> {
        let history = sqlx::query_as::<_, PriceHistoryEntry>(
            r#"
            SELECT id, season_id, product_id, price_per_ton, effective_at,
                   notes, created_by, created_at
            FROM product_price_history
            WHERE season_id = $1 AND product_id = $2
            ORDER BY effective_at DESC, created_at DESC
            "#,
        )
        .bind(season_id)
        .bind(product_id)
        .fetch_all(&self.db)
        .await?;
        Ok(history)
    }
}

/// Append a history entry and upsert the current price inside a transaction.
pub(crate) async fn record_price(
    tx: &mut Transaction<'_, Postgres>,
    season_id: Uuid,
    product_id: Uuid,
    price_per_ton: Decimal,
    notes: Option<String>,
    created_by: Option<Uuid>,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO product_price_history (season_id, product_id, price_per_ton, notes, created_by)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(season_id)
    .bind(product_id)
    .bind(price_per_ton)
    .bind(&notes)
    .bind(created_by)
    .execute(&mut **tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO season_product_prices (season_id, product_id, opening_price_per_ton, current_price_per_ton)
        VALUES ($1, $2, $3, $3)
        ON CONFLICT (season_id, product_id) DO UPDATE
            SET current_price_per_ton = EXCLUDED.current_price_per_ton,
                updated_at = NOW()
        "#,
    )
    .bind(season_id)
    .bind(product_id)
    .bind(price_per_ton)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
