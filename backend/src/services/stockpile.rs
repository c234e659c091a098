//! Stockpile view: derived, read-only inventory aggregation
//!
//! Reads are not transactional with ledger writes; the dashboard may observe
//! slightly stale totals. Split children are excluded from purchased totals
//! via the parent_id IS NULL filter while their sales still count - splitting
//! must never change total purchased weight.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::AppResult;

/// Stockpile service for inventory reporting
#[derive(Clone)]
pub struct StockpileService {
    db: PgPool,
}

/// Per-product stock position for a season
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockpileSummary {
    pub product_id: Uuid,
    pub product_code: String,
    pub product_name: String,
    pub product_type: String,
    pub variety: Option<String>,
    pub total_purchased_kg: Decimal,
    pub purchase_count: i64,
    pub total_sold_kg: Decimal,
    pub sales_count: i64,
    pub current_stock_kg: Decimal,
    pub current_price_per_ton: Option<Decimal>,
}

/// One stock movement (a purchase in or a sale out)
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockMovement {
    pub movement_type: String,
    pub transaction_id: Uuid,
    pub reference_number: String,
    pub transaction_at: DateTime<Utc>,
    pub party_code: String,
    pub party_name: String,
    pub weight_kg: Decimal,
    pub total_amount: Decimal,
    pub payment_status: String,
}

/// Season-wide stock statistics
#[derive(Debug, Clone, Serialize)]
pub struct StockpileStats {
    pub total_purchased_kg: Decimal,
    pub total_purchase_transactions: i64,
    pub total_sold_kg: Decimal,
    pub total_sale_transactions: i64,
    pub current_stock_kg: Decimal,
    pub turnover_rate_percent: Decimal,
}

/// Filters for the movement listing
#[derive(Debug, Default, Deserialize)]
pub struct MovementFilters {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub movement_type: Option<String>,
}

#[derive(Debug, FromRow)]
struct StatsRow {
    total_purchased_kg: Decimal,
    total_purchase_transactions: i64,
    total_sold_kg: Decimal,
    total_sale_transactions: i64,
}

impl StockpileService {
    /// Create a new StockpileService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Stock position per product for a season
    pub async fn get_summary(&self, season_id: Uuid) -> AppResult<Vec<StockpileSummary>> {
        let rows = sqlx::query_as::<_, StockpileSummary>(
            r#"
            SELECT p.id AS product_id, p.product_code, p.product_name, p.product_type, p.variety,
                   COALESCE(pur.total_purchased_kg, 0) AS total_purchased_kg,
                   COALESCE(pur.purchase_count, 0) AS purchase_count,
                   COALESCE(sold.total_sold_kg, 0) AS total_sold_kg,
                   COALESCE(sold.sales_count, 0) AS sales_count,
                   COALESCE(pur.total_purchased_kg, 0) - COALESCE(sold.total_sold_kg, 0)
                       AS current_stock_kg,
                   spp.current_price_per_ton
            FROM paddy_products p
            LEFT JOIN (
                SELECT product_id,
                       SUM(net_weight_kg) AS total_purchased_kg,
                       COUNT(*) AS purchase_count
                FROM purchase_transactions
                WHERE season_id = $1 AND status = 'completed' AND parent_id IS NULL
                GROUP BY product_id
            ) pur ON pur.product_id = p.id
            LEFT JOIN (
                SELECT pt.product_id,
                       SUM(spm.quantity_kg) AS total_sold_kg,
                       COUNT(DISTINCT spm.sales_id) AS sales_count
                FROM sales_purchase_mapping spm
                JOIN purchase_transactions pt ON pt.id = spm.purchase_id
                JOIN sales_transactions st ON st.id = spm.sales_id AND st.status = 'completed'
                WHERE pt.season_id = $1
                GROUP BY pt.product_id
            ) sold ON sold.product_id = p.id
            LEFT JOIN season_product_prices spp
                ON spp.product_id = p.id AND spp.season_id = $1
            WHERE p.is_active = TRUE
            ORDER BY p.product_type, p.variety, p.product_name
            "#,
        )
        .bind(season_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    /// Movement history for one product: purchases in, sales out
    pub async fn get_product_movements(
        &self,
        season_id: Uuid,
        product_id: Uuid,
        filters: MovementFilters,
    ) -> AppResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT * FROM (
                SELECT 'PURCHASE' AS movement_type,
                       pt.id AS transaction_id,
                       pt.receipt_number AS reference_number,
                       pt.transaction_at,
                       f.farmer_code AS party_code,
                       f.full_name AS party_name,
                       pt.net_weight_kg AS weight_kg,
                       pt.total_amount,
                       pt.payment_status
                FROM purchase_transactions pt
                JOIN farmers f ON f.id = pt.farmer_id
                WHERE pt.season_id = $1 AND pt.product_id = $2
                  AND pt.status = 'completed' AND pt.parent_id IS NULL

                UNION ALL

                SELECT 'SALE' AS movement_type,
                       st.id AS transaction_id,
                       st.sales_number AS reference_number,
                       st.sale_at AS transaction_at,
                       m.manufacturer_code AS party_code,
                       m.company_name AS party_name,
                       spm.quantity_kg AS weight_kg,
                       st.total_amount,
                       st.payment_status
                FROM sales_transactions st
                JOIN manufacturers m ON m.id = st.manufacturer_id
                JOIN sales_purchase_mapping spm ON spm.sales_id = st.id
                JOIN purchase_transactions pt ON pt.id = spm.purchase_id
                WHERE st.season_id = $1 AND pt.product_id = $2
                  AND st.status = 'completed'
            ) movements
            WHERE ($3::timestamptz IS NULL OR transaction_at >= $3)
              AND ($4::timestamptz IS NULL OR transaction_at <= $4)
              AND ($5::text IS NULL OR movement_type = $5)
            ORDER BY transaction_at DESC
            "#,
        )
        .bind(season_id)
        .bind(product_id)
        .bind(filters.start_date)
        .bind(filters.end_date)
        .bind(&filters.movement_type)
        .fetch_all(&self.db)
        .await?;
        Ok(movements)
    }

    /// Season-wide totals and turnover
    pub async fn get_stats(&self, season_id: Uuid) -> AppResult<StockpileStats> {
        let row = sqlx::query_as::<_, StatsRow>(
            r#"
            SELECT
                COALESCE((
                    SELECT SUM(net_weight_kg) FROM purchase_transactions
                    WHERE season_id = $1 AND status = 'completed' AND parent_id IS NULL
                ), 0) AS total_purchased_kg,
                (
                    SELECT COUNT(*) FROM purchase_transactions
                    WHERE season_id = $1 AND status = 'completed' AND parent_id IS NULL
                ) AS total_purchase_transactions,
                COALESCE((
                    SELECT SUM(spm.quantity_kg)
                    FROM sales_purchase_mapping spm
                    JOIN sales_transactions st ON st.id = spm.sales_id
                    WHERE st.season_id = $1 AND st.status = 'completed'
                ), 0) AS total_sold_kg,
                (
                    SELECT COUNT(*) FROM sales_transactions
                    WHERE season_id = $1 AND status = 'completed'
                ) AS total_sale_transactions
            "#,
        )
        .bind(season_id)
        .fetch_one(&self.db)
        .await?;

        let turnover = if row.total_purchased_kg > Decimal::ZERO {
            (row.total_sold_kg / row.total_purchased_kg * Decimal::from(100)).round_dp(2)
        } else {
            Decimal::ZERO
        };

        Ok(StockpileStats {
            current_stock_kg: row.total_purchased_kg - row.total_sold_kg,
            turnover_rate_percent: turnover,
            total_purchased_kg: row.total_purchased_kg,
            total_purchase_transactions: row.total_purchase_transactions,
            total_sold_kg: row.total_sold_kg,
            total_sale_transactions: row.total_sale_transactions,
        })
    }

    /// Products with stock below a threshold
    pub async fn get_low_stock(
        &self,
        season_id: Uuid,
        threshold_kg: Decimal,
    ) -> AppResult<Vec<StockpileSummary>> {
        let summary = self.get_summary(season_id).await?;
        Ok(summary
            .into_iter()
            .filter(|item| {
                item.current_stock_kg < threshold_kg && item.current_stock_kg >= Decimal::ZERO
            })
            .collect())
    }
}
