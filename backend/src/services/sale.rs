//! Sales transaction service: manufacturer sales consuming purchase receipts
//!
//! A sale draws its weight from one or more purchase receipts. Allocations
//! that consume only part of a receipt transparently split it first, so the
//! mapping table always records whole receipts and availability stays exact.
//! The whole sequence - header, splits, mapping rows - is one transaction.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::purchase::{lock_purchase, mapped_quantity, split_locked};
use shared::deduction::round_amount;
use shared::ledger::{
    format_sales_number, parse_sales_sequence, plan_allocation, validate_allocation_total,
    AllocationAction,
};
use shared::validation::validate_weights;

/// Sales service for the manufacturer-side ledger
#[derive(Clone)]
pub struct SalesService {
    db: PgPool,
}

const SALE_COLUMNS: &str = "id, sales_number, season_id, product_id, manufacturer_id, sale_at, \
     gross_weight_kg, tare_weight_kg, net_weight_kg, price_per_kg, total_amount, \
     status, payment_status, vehicle_number, driver_name, notes, created_by, created_at";

/// Bounded retries when two sales race for the same day sequence number.
const SALES_NUMBER_ATTEMPTS: u32 = 5;

/// A sales transaction row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SalesTransaction {
    pub id: Uuid,
    pub sales_number: String,
    pub season_id: Uuid,
    pub product_id: Uuid,
    pub manufacturer_id: Uuid,
    pub sale_at: DateTime<Utc>,
    pub gross_weight_kg: Decimal,
    pub tare_weight_kg: Decimal,
    pub net_weight_kg: Decimal,
    pub price_per_kg: Decimal,
    pub total_amount: Decimal,
    pub status: String,
    pub payment_status: String,
    pub vehicle_number: Option<String>,
    pub driver_name: Option<String>,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// One purchase receipt feeding a sale
#[derive(Debug, Clone, Deserialize)]
pub struct SaleAllocationInput {
    pub purchase_id: Uuid,
    pub quantity_kg: Decimal,
}

/// Input for creating a sales transaction
#[derive(Debug, Deserialize)]
pub struct CreateSaleInput {
    pub season_id: Uuid,
    pub product_id: Uuid,
    pub manufacturer_id: Uuid,
    pub gross_weight_kg: Decimal,
    pub tare_weight_kg: Decimal,
    pub price_per_kg: Decimal,
    pub allocations: Vec<SaleAllocationInput>,
    pub vehicle_number: Option<String>,
    pub driver_name: Option<String>,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
}

/// A mapping row with receipt details, for the sale detail view
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SaleReceiptLine {
    pub purchase_id: Uuid,
    pub receipt_number: String,
    pub quantity_kg: Decimal,
    pub original_weight_kg: Decimal,
    pub farmer_code: String,
    pub farmer_name: String,
    pub grade_name: String,
}

/// A sale with its receipt lines
#[derive(Debug, Clone, Serialize)]
pub struct SaleWithReceipts {
    #[serde(flatten)]
    pub sale: SalesTransaction,
    pub purchase_receipts: Vec<SaleReceiptLine>,
}

/// Filters for listing sales
#[derive(Debug, Default, Deserialize)]
pub struct SaleFilters {
    pub season_id: Option<Uuid>,
    pub manufacturer_id: Option<Uuid>,
    pub status: Option<String>,
    pub payment_status: Option<String>,
}

/// Season sales totals
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SaleStats {
    pub total_transactions: i64,
    pub total_net_weight_kg: Decimal,
    pub total_amount: Decimal,
}

impl SalesService {
    /// Create a new SalesService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record a sale against one manufacturer.
    ///
    /// Fails atomically: if any allocation cannot be satisfied, the header,
    /// every mapping row and every auto-split roll back together. A unique
    /// violation on the day-scoped sales number is retried with a fresh
    /// number up to a bounded number of attempts.
    pub async fn create(&self, input: CreateSaleInput) -> AppResult<SaleWithReceipts> {
        validate_weights(input.gross_weight_kg, input.tare_weight_kg).map_err(|msg| {
            AppError::Validation {
                field: "weights".to_string(),
                message: msg.to_string(),
                message_ms: "Bacaan berat tidak sah".to_string(),
            }
        })?;
        if input.price_per_kg <= Decimal::ZERO {
            return Err(AppError::Validation {
                field: "price_per_kg".to_string(),
                message: "Sale price must be positive".to_string(),
                message_ms: "Harga jualan mesti positif".to_string(),
            });
        }

        let net_weight = input.gross_weight_kg - input.tare_weight_kg;
        if input.allocations.iter().any(|a| a.quantity_kg <= Decimal::ZERO) {
            return Err(AppError::Validation {
                field: "allocations".to_string(),
                message: "Allocation quantities must be positive".to_string(),
                message_ms: "Kuantiti peruntukan mesti positif".to_string(),
            });
        }
        let quantities: Vec<Decimal> = input.allocations.iter().map(|a| a.quantity_kg).collect();
        validate_allocation_total(net_weight, &quantities)
            .map_err(AppError::ValidationError)?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_create(&input, net_weight).await {
                Err(AppError::DatabaseError(e)) if is_sales_number_conflict(&e) => {
                    if attempt < SALES_NUMBER_ATTEMPTS {
                        tracing::warn!(attempt, "Sales number conflict, retrying");
                        continue;
                    }
                    return Err(AppError::Conflict {
                        resource: "sales_number".to_string(),
                        message: "Could not reserve a sales number after repeated conflicts; please retry"
                            .to_string(),
                        message_ms: "Nombor jualan tidak dapat ditempah selepas konflik berulang; sila cuba lagi"
                            .to_string(),
                    });
                }
                other => return other,
            }
        }
    }

    async fn try_create(
        &self,
        input: &CreateSaleInput,
        net_weight: Decimal,
    ) -> AppResult<SaleWithReceipts> {
        let mut tx = self.db.begin().await?;

        let season_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM harvesting_seasons WHERE id = $1)",
        )
        .bind(input.season_id)
        .fetch_one(&mut *tx)
        .await?;
        if !season_exists {
            return Err(AppError::NotFound("Season".to_string()));
        }

        let manufacturer_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM manufacturers WHERE id = $1 AND is_active = TRUE)",
        )
        .bind(input.manufacturer_id)
        .fetch_one(&mut *tx)
        .await?;
        if !manufacturer_exists {
            return Err(AppError::NotFound("Manufacturer".to_string()));
        }

        let sales_number = next_sales_number(&mut tx).await?;
        let total_amount = round_amount(net_weight * input.price_per_kg);

        let sql = format!(
            "INSERT INTO sales_transactions (
                sales_number, season_id, product_id, manufacturer_id,
                gross_weight_kg, tare_weight_kg, net_weight_kg,
                price_per_kg, total_amount, status, payment_status,
                vehicle_number, driver_name, notes, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'completed', 'pending',
                    $10, $11, $12, $13)
            RETURNING {}",
            SALE_COLUMNS
        );
        let sale = sqlx::query_as::<_, SalesTransaction>(&sql)
            .bind(&sales_number)
            .bind(input.season_id)
            .bind(input.product_id)
            .bind(input.manufacturer_id)
            .bind(input.gross_weight_kg)
            .bind(input.tare_weight_kg)
            .bind(net_weight)
            .bind(input.price_per_kg)
            .bind(total_amount)
            .bind(&input.vehicle_number)
            .bind(&input.driver_name)
            .bind(&input.notes)
            .bind(input.created_by)
            .fetch_one(&mut *tx)
            .await?;

        for allocation in &input.allocations {
            self.consume_allocation(&mut tx, &sale, allocation, input.created_by)
                .await?;
        }

        tx.commit().await?;

        tracing::info!(
            sales_number = %sale.sales_number,
            net_kg = %sale.net_weight_kg,
            receipts = input.allocations.len(),
            "Sale recorded"
        );

        self.get_by_id(sale.id).await
    }

    /// Draw one allocation from a locked purchase receipt, splitting it first
    /// when the requested quantity is less than what remains.
    async fn consume_allocation(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        sale: &SalesTransaction,
        allocation: &SaleAllocationInput,
        actor: Option<Uuid>,
    ) -> AppResult<()> {
        let purchase = lock_purchase(tx, allocation.purchase_id).await?;

        if purchase.status != "completed" {
            return Err(AppError::InvalidStateTransition(format!(
                "Receipt {} is cancelled and cannot be sold",
                purchase.receipt_number
            )));
        }
        if purchase.season_id != sale.season_id {
            return Err(AppError::ValidationError(format!(
                "Receipt {} belongs to a different season",
                purchase.receipt_number
            )));
        }
        if purchase.product_id != sale.product_id {
            return Err(AppError::ValidationError(format!(
                "Receipt {} is for a different product",
                purchase.receipt_number
            )));
        }

        let has_children = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM purchase_transactions WHERE parent_id = $1)",
        )
        .bind(purchase.id)
        .fetch_one(&mut **tx)
        .await?;
        if has_children {
            return Err(AppError::InvalidStateTransition(format!(
                "Receipt {} has been split; allocate its child receipts instead",
                purchase.receipt_number
            )));
        }

        let sold = mapped_quantity(tx, purchase.id).await?;
        let remaining = purchase.net_weight_kg - sold;

        let action = plan_allocation(allocation.quantity_kg, remaining).map_err(|_| {
            AppError::InsufficientStock(format!(
                "Receipt {} has {} kg remaining, {} kg requested",
                purchase.receipt_number, remaining, allocation.quantity_kg
            ))
        })?;

        let (mapped_purchase_id, grade_id) = match action {
            AllocationAction::ConsumeWhole => (purchase.id, purchase.grade_id),
            AllocationAction::SplitThenConsume { split_weight_kg } => {
                let (child1, _child2) = split_locked(tx, &purchase, split_weight_kg, actor).await?;
                (child1.id, child1.grade_id)
            }
        };

        sqlx::query(
            r#"
            INSERT INTO sales_purchase_mapping (sales_id, purchase_id, grade_id, quantity_kg, created_by)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(sale.id)
        .bind(mapped_purchase_id)
        .bind(grade_id)
        .bind(allocation.quantity_kg)
        .bind(actor)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// Get a sale with its mapped purchase receipts
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<SaleWithReceipts> {
        let sql = format!(
            "SELECT {} FROM sales_transactions WHERE id = $1",
            SALE_COLUMNS
        );
        let sale = sqlx::query_as::<_, SalesTransaction>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Sales transaction".to_string()))?;

        let purchase_receipts = sqlx::query_as::<_, SaleReceiptLine>(
            r#"
            SELECT spm.purchase_id, pt.receipt_number, spm.quantity_kg,
                   pt.net_weight_kg AS original_weight_kg,
                   f.farmer_code, f.full_name AS farmer_name, g.grade_name
            FROM sales_purchase_mapping spm
            JOIN purchase_transactions pt ON pt.id = spm.purchase_id
            JOIN farmers f ON f.id = pt.farmer_id
            JOIN paddy_grades g ON g.id = spm.grade_id
            WHERE spm.sales_id = $1
            ORDER BY pt.transaction_at
            "#,
        )
        .bind(id)
        .fetch_all(&self.db)
        .await?;

        Ok(SaleWithReceipts {
            sale,
            purchase_receipts,
        })
    }

    /// Get a sale by its sales number
    pub async fn get_by_number(&self, sales_number: &str) -> AppResult<SaleWithReceipts> {
        let id = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM sales_transactions WHERE sales_number = $1",
        )
        .bind(sales_number)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Sales transaction".to_string()))?;

        self.get_by_id(id).await
    }

    /// List sales with optional filters
    pub async fn get_all(&self, filters: SaleFilters) -> AppResult<Vec<SalesTransaction>> {
        let sql = format!(
            "SELECT {} FROM sales_transactions
             WHERE ($1::uuid IS NULL OR season_id = $1)
               AND ($2::uuid IS NULL OR manufacturer_id = $2)
               AND ($3::text IS NULL OR status = $3)
               AND ($4::text IS NULL OR payment_status = $4)
             ORDER BY sale_at DESC, sales_number DESC",
            SALE_COLUMNS
        );
        let sales = sqlx::query_as::<_, SalesTransaction>(&sql)
            .bind(filters.season_id)
            .bind(filters.manufacturer_id)
            .bind(&filters.status)
            .bind(&filters.payment_status)
            .fetch_all(&self.db)
            .await?;
        Ok(sales)
    }

    /// Season sales totals
    pub async fn total_stats(&self, season_id: Uuid) -> AppResult<SaleStats> {
        let stats = sqlx::query_as::<_, SaleStats>(
            r#"
            SELECT COUNT(*) AS total_transactions,
                   COALESCE(SUM(net_weight_kg), 0) AS total_net_weight_kg,
                   COALESCE(SUM(total_amount), 0) AS total_amount
            FROM sales_transactions
            WHERE status = 'completed' AND season_id = $1
            "#,
        )
        .bind(season_id)
        .fetch_one(&self.db)
        .await?;
        Ok(stats)
    }
}

/// Next sales number for today: read the day's maximum suffix and increment.
///
/// The read-then-write window is closed by the unique index on sales_number;
/// a concurrent writer loses the race, hits the constraint and retries with a
/// fresh read.
async fn next_sales_number(tx: &mut Transaction<'_, Postgres>) -> AppResult<String> {
    let today = Utc::now().date_naive();
    let prefix = format!("SALE-{}-%", today.format("%Y%m%d"));

    let last: Option<String> = sqlx::query_scalar(
        "SELECT sales_number FROM sales_transactions
         WHERE sales_number LIKE $1
         ORDER BY sales_number DESC LIMIT 1",
    )
    .bind(&prefix)
    .fetch_optional(&mut **tx)
    .await?;

    let sequence = last
        .as_deref()
        .and_then(parse_sales_sequence)
        .map(|n| n + 1)
        .unwrap_or(1);

    Ok(format_sales_number(today, sequence))
}

fn is_sales_number_conflict(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db) => {
            db.code().as_deref() == Some("23505")
                && db
                    .constraint()
                    .map(|c| c.contains("sales_number"))
                    .unwrap_or(false)
        }
        _ => false,
    }
}
