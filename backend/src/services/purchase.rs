//! Purchase transaction service: receipt creation, splitting, farmer
//! reassignment and availability queries
//!
//! Every mutation runs inside one database transaction. Rows being split or
//! sold against are locked with SELECT ... FOR UPDATE before any remaining
//! capacity is computed, and the lock is held to commit.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::deduction::{apply_deductions, round_amount, DeductionLine};
use shared::ledger::{format_receipt_number, plan_split, split_child_receipt_numbers, SplitSource};
use shared::models::{price_purchase, GradeThresholds};
use shared::validation::{validate_percent, validate_weights};

/// Purchase service for the farmer-side ledger
#[derive(Clone)]
pub struct PurchaseService {
    db: PgPool,
}

const PURCHASE_COLUMNS: &str = "id, receipt_number, season_id, farmer_id, grade_id, product_id, \
     parent_id, transaction_at, gross_weight_kg, tare_weight_kg, net_weight_kg, \
     moisture_percent, foreign_matter_percent, base_price_per_kg, moisture_penalty, \
     foreign_matter_penalty, deduction_config, total_deduction_percent, effective_weight_kg, \
     final_price_per_kg, total_amount, vehicle_number, driver_name, status, payment_status, \
     payment_reference, paid_at, notes, created_by, created_at, updated_at";

/// A purchase receipt row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PurchaseTransaction {
    pub id: Uuid,
    pub receipt_number: String,
    pub season_id: Uuid,
    pub farmer_id: Uuid,
    pub grade_id: Uuid,
    pub product_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub transaction_at: DateTime<Utc>,
    pub gross_weight_kg: Decimal,
    pub tare_weight_kg: Decimal,
    pub net_weight_kg: Decimal,
    pub moisture_percent: Decimal,
    pub foreign_matter_percent: Decimal,
    pub base_price_per_kg: Decimal,
    pub moisture_penalty: Decimal,
    pub foreign_matter_penalty: Decimal,
    pub deduction_config: Option<serde_json::Value>,
    pub total_deduction_percent: Decimal,
    pub effective_weight_kg: Decimal,
    pub final_price_per_kg: Decimal,
    pub total_amount: Decimal,
    pub vehicle_number: Option<String>,
    pub driver_name: Option<String>,
    pub status: String,
    pub payment_status: String,
    pub payment_reference: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a purchase transaction
#[derive(Debug, Deserialize)]
pub struct CreatePurchaseInput {
    pub season_id: Uuid,
    pub farmer_id: Uuid,
    pub product_id: Uuid,
    /// Falls back to the default active grade when omitted
    pub grade_id: Option<Uuid>,
    pub gross_weight_kg: Decimal,
    pub tare_weight_kg: Decimal,
    pub moisture_percent: Decimal,
    pub foreign_matter_percent: Decimal,
    pub base_price_per_kg: Decimal,
    /// Percentage deductions chosen by the operator; when absent the grade's
    /// moisture/foreign-matter penalty formula applies instead
    pub deductions: Option<Vec<DeductionLine>>,
    pub vehicle_number: Option<String>,
    pub driver_name: Option<String>,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
}

/// Input for cancelling a lorry that left before weigh-out
#[derive(Debug, Deserialize)]
pub struct CancelPendingLorryInput {
    pub season_id: Uuid,
    pub farmer_id: Uuid,
    pub product_id: Uuid,
    pub gross_weight_kg: Option<Decimal>,
    pub vehicle_number: Option<String>,
    pub driver_name: Option<String>,
    pub reason: String,
    pub created_by: Option<Uuid>,
}

/// The two receipts produced by a split
#[derive(Debug, Clone, Serialize)]
pub struct SplitOutcome {
    pub child1: PurchaseTransaction,
    pub child2: PurchaseTransaction,
}

/// A receipt with remaining sale capacity, feeding the sale allocation screen
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UnsoldPurchase {
    pub id: Uuid,
    pub receipt_number: String,
    pub transaction_at: DateTime<Utc>,
    pub net_weight_kg: Decimal,
    pub grade_id: Uuid,
    pub product_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub farmer_code: String,
    pub farmer_name: String,
    pub grade_name: String,
    pub sold_quantity_kg: Decimal,
    pub available_quantity_kg: Decimal,
}

/// Filters for listing purchases
#[derive(Debug, Default, Deserialize)]
pub struct PurchaseFilters {
    pub season_id: Option<Uuid>,
    pub farmer_id: Option<Uuid>,
    pub status: Option<String>,
}

/// Season purchase totals
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PurchaseStats {
    pub total_transactions: i64,
    pub total_net_weight_kg: Decimal,
    pub total_amount: Decimal,
}

#[derive(Debug, FromRow)]
struct GradeRow {
    id: Uuid,
    max_moisture_percent: Decimal,
    max_foreign_matter_percent: Decimal,
    penalty_per_percent: Decimal,
}

impl PurchaseService {
    /// Create a new PurchaseService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record a purchase from weighbridge readings.
    ///
    /// Runs in one transaction: the receipt number is reserved under a row
    /// lock, amounts are computed, and the receipt is inserted - or nothing
    /// happens at all.
    pub async fn create(&self, input: CreatePurchaseInput) -> AppResult<PurchaseTransaction> {
        validate_weights(input.gross_weight_kg, input.tare_weight_kg).map_err(|msg| {
            AppError::Validation {
                field: "weights".to_string(),
                message: msg.to_string(),
                message_ms: "Bacaan berat tidak sah".to_string(),
            }
        })?;
        validate_percent(input.moisture_percent).map_err(|_| AppError::Validation {
            field: "moisture_percent".to_string(),
            message: "Moisture must be between 0 and 100".to_string(),
            message_ms: "Kelembapan mesti antara 0 dan 100".to_string(),
        })?;
        validate_percent(input.foreign_matter_percent).map_err(|_| AppError::Validation {
            field: "foreign_matter_percent".to_string(),
            message: "Foreign matter must be between 0 and 100".to_string(),
            message_ms: "Bendasing mesti antara 0 dan 100".to_string(),
        })?;
        if input.base_price_per_kg <= Decimal::ZERO {
            return Err(AppError::Validation {
                field: "base_price_per_kg".to_string(),
                message: "Base price must be positive".to_string(),
                message_ms: "Harga asas mesti positif".to_string(),
            });
        }

        let mut tx = self.db.begin().await?;

        let season_code = sqlx::query_scalar::<_, String>(
            "SELECT season_code FROM harvesting_seasons WHERE id = $1",
        )
        .bind(input.season_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Season".to_string()))?;

        let farmer_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM farmers WHERE id = $1 AND is_active = TRUE)",
        )
        .bind(input.farmer_id)
        .fetch_one(&mut *tx)
        .await?;
        if !farmer_exists {
            return Err(AppError::NotFound("Farmer".to_string()));
        }

        let product_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM paddy_products WHERE id = $1 AND is_active = TRUE)",
        )
        .bind(input.product_id)
        .fetch_one(&mut *tx)
        .await?;
        if !product_exists {
            return Err(AppError::NotFound("Product".to_string()));
        }

        let grade = self.resolve_grade(&mut tx, input.grade_id).await?;

        let receipt_number = reserve_receipt_number(&mut tx, input.season_id, &season_code).await?;

        let net_weight = input.gross_weight_kg - input.tare_weight_kg;

        // Effective weight and pricing: explicit deductions take precedence
        // over the grade penalty formula.
        let deduction_items = input.deductions.unwrap_or_default();
        let (
            effective_weight,
            total_deduction_percent,
            deduction_config,
            moisture_penalty,
            foreign_matter_penalty,
            final_price_per_kg,
            total_amount,
        ) = if deduction_items.is_empty() {
            let thresholds = GradeThresholds {
                max_moisture_percent: grade.max_moisture_percent,
                max_foreign_matter_percent: grade.max_foreign_matter_percent,
                penalty_per_percent: grade.penalty_per_percent,
            };
            let pricing = price_purchase(
                input.base_price_per_kg,
                input.moisture_percent,
                input.foreign_matter_percent,
                &thresholds,
                net_weight,
            );
            (
                net_weight,
                Decimal::ZERO,
                None,
                pricing.moisture_penalty,
                pricing.foreign_matter_penalty,
                pricing.final_price_per_kg,
                pricing.total_amount,
            )
        } else {
            let outcome = apply_deductions(net_weight, &deduction_items)
                .map_err(AppError::ValidationError)?;
            let config = serde_json::to_value(&deduction_items)
                .map_err(|e| AppError::Internal(e.to_string()))?;
            let total = round_amount(outcome.effective_weight_kg * input.base_price_per_kg);
            (
                outcome.effective_weight_kg,
                outcome.total_rate_percent,
                Some(config),
                Decimal::ZERO,
                Decimal::ZERO,
                input.base_price_per_kg,
                total,
            )
        };

        let sql = format!(
            "INSERT INTO purchase_transactions (
                receipt_number, season_id, farmer_id, grade_id, product_id,
                gross_weight_kg, tare_weight_kg, net_weight_kg,
                moisture_percent, foreign_matter_percent,
                base_price_per_kg, moisture_penalty, foreign_matter_penalty,
                deduction_config, total_deduction_percent, effective_weight_kg,
                final_price_per_kg, total_amount,
                vehicle_number, driver_name, status, payment_status, notes, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                    $15, $16, $17, $18, $19, $20, 'completed', 'unpaid', $21, $22)
            RETURNING {}",
            PURCHASE_COLUMNS
        );
        let purchase = sqlx::query_as::<_, PurchaseTransaction>(&sql)
            .bind(&receipt_number)
            .bind(input.season_id)
            .bind(input.farmer_id)
            .bind(grade.id)
            .bind(input.product_id)
            .bind(input.gross_weight_kg)
            .bind(input.tare_weight_kg)
            .bind(net_weight)
            .bind(input.moisture_percent)
            .bind(input.foreign_matter_percent)
            .bind(input.base_price_per_kg)
            .bind(moisture_penalty)
            .bind(foreign_matter_penalty)
            .bind(&deduction_config)
            .bind(total_deduction_percent)
            .bind(effective_weight)
            .bind(final_price_per_kg)
            .bind(total_amount)
            .bind(&input.vehicle_number)
            .bind(&input.driver_name)
            .bind(&input.notes)
            .bind(input.created_by)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            receipt = %purchase.receipt_number,
            net_kg = %purchase.net_weight_kg,
            amount = %purchase.total_amount,
            "Purchase recorded"
        );

        Ok(purchase)
    }

    /// Partition a receipt's weight into two child receipts.
    ///
    /// The parent keeps its weight for historical totals but is excluded from
    /// sale availability once it has children. Child weights and amounts
    /// reproduce the parent's exactly.
    pub async fn split(
        &self,
        parent_id: Uuid,
        split_weight_kg: Decimal,
        actor: Option<Uuid>,
    ) -> AppResult<SplitOutcome> {
        let mut tx = self.db.begin().await?;

        let parent = lock_purchase(&mut tx, parent_id).await?;
        let (child1, child2) = split_locked(&mut tx, &parent, split_weight_kg, actor).await?;

        tx.commit().await?;

        tracing::info!(
            parent = %parent.receipt_number,
            child1_kg = %child1.net_weight_kg,
            child2_kg = %child2.net_weight_kg,
            "Receipt split"
        );

        Ok(SplitOutcome { child1, child2 })
    }

    /// Reassign the farmer on a receipt and all of its split children.
    pub async fn change_farmer(
        &self,
        transaction_id: Uuid,
        new_farmer_id: Uuid,
        actor: Option<Uuid>,
        reason: &str,
    ) -> AppResult<PurchaseTransaction> {
        let mut tx = self.db.begin().await?;

        let purchase = lock_purchase(&mut tx, transaction_id).await?;
        if purchase.status == "cancelled" {
            return Err(AppError::InvalidStateTransition(
                "Cannot change the farmer on a cancelled receipt".to_string(),
            ));
        }

        let farmer_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM farmers WHERE id = $1 AND is_active = TRUE)",
        )
        .bind(new_farmer_id)
        .fetch_one(&mut *tx)
        .await?;
        if !farmer_exists {
            return Err(AppError::NotFound("Farmer".to_string()));
        }

        let note = format!("Farmer reassigned: {}", reason);
        sqlx::query(
            r#"
            UPDATE purchase_transactions
            SET farmer_id = $2,
                notes = COALESCE(notes || E'\n', '') || $3,
                updated_at = NOW()
            WHERE id = $1 OR parent_id = $1
            "#,
        )
        .bind(transaction_id)
        .bind(new_farmer_id)
        .bind(&note)
        .execute(&mut *tx)
        .await?;

        let sql = format!(
            "SELECT {} FROM purchase_transactions WHERE id = $1",
            PURCHASE_COLUMNS
        );
        let updated = sqlx::query_as::<_, PurchaseTransaction>(&sql)
            .bind(transaction_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            receipt = %updated.receipt_number,
            farmer = %new_farmer_id,
            actor = ?actor,
            "Farmer reassigned"
        );

        Ok(updated)
    }

    /// Mark a receipt paid or unpaid.
    pub async fn update_payment(
        &self,
        transaction_id: Uuid,
        paid: bool,
        payment_reference: Option<String>,
    ) -> AppResult<PurchaseTransaction> {
        let mut tx = self.db.begin().await?;

        let purchase = lock_purchase(&mut tx, transaction_id).await?;
        if purchase.status == "cancelled" {
            return Err(AppError::InvalidStateTransition(
                "Cannot update payment on a cancelled receipt".to_string(),
            ));
        }

        let sql = format!(
            "UPDATE purchase_transactions
             SET payment_status = $2,
                 payment_reference = $3,
                 paid_at = CASE WHEN $2 = 'paid' THEN NOW() ELSE NULL END,
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            PURCHASE_COLUMNS
        );
        let updated = sqlx::query_as::<_, PurchaseTransaction>(&sql)
            .bind(transaction_id)
            .bind(if paid { "paid" } else { "unpaid" })
            .bind(&payment_reference)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Record a lorry that was weighed in but left without completing the
    /// purchase. Cancellation is an auditable ledger entry, not a deletion.
    pub async fn cancel_pending_lorry(
        &self,
        input: CancelPendingLorryInput,
    ) -> AppResult<PurchaseTransaction> {
        let mut tx = self.db.begin().await?;

        let season_code = sqlx::query_scalar::<_, String>(
            "SELECT season_code FROM harvesting_seasons WHERE id = $1",
        )
        .bind(input.season_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Season".to_string()))?;

        let farmer_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM farmers WHERE id = $1)",
        )
        .bind(input.farmer_id)
        .fetch_one(&mut *tx)
        .await?;
        if !farmer_exists {
            return Err(AppError::NotFound("Farmer".to_string()));
        }

        let product_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM paddy_products WHERE id = $1)",
        )
        .bind(input.product_id)
        .fetch_one(&mut *tx)
        .await?;
        if !product_exists {
            return Err(AppError::NotFound("Product".to_string()));
        }

        let grade = self.resolve_grade(&mut tx, None).await?;
        let receipt_number = reserve_receipt_number(&mut tx, input.season_id, &season_code).await?;

        let gross = input.gross_weight_kg.unwrap_or(Decimal::ZERO);
        let note = format!("Cancelled before weigh-out: {}", input.reason);

        let sql = format!(
            "INSERT INTO purchase_transactions (
                receipt_number, season_id, farmer_id, grade_id, product_id,
                gross_weight_kg, tare_weight_kg, net_weight_kg,
                base_price_per_kg, effective_weight_kg, final_price_per_kg, total_amount,
                vehicle_number, driver_name, status, payment_status, notes, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, 0, 0, 0, 0, 0, 0,
                    $7, $8, 'cancelled', 'unpaid', $9, $10)
            RETURNING {}",
            PURCHASE_COLUMNS
        );
        let record = sqlx::query_as::<_, PurchaseTransaction>(&sql)
            .bind(&receipt_number)
            .bind(input.season_id)
            .bind(input.farmer_id)
            .bind(grade.id)
            .bind(input.product_id)
            .bind(gross)
            .bind(&input.vehicle_number)
            .bind(&input.driver_name)
            .bind(&note)
            .bind(input.created_by)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(receipt = %record.receipt_number, "Pending lorry cancelled");
        Ok(record)
    }

    /// Get a purchase by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<PurchaseTransaction> {
        let sql = format!(
            "SELECT {} FROM purchase_transactions WHERE id = $1",
            PURCHASE_COLUMNS
        );
        sqlx::query_as::<_, PurchaseTransaction>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Purchase transaction".to_string()))
    }

    /// Get a purchase by receipt number
    pub async fn get_by_receipt(&self, receipt_number: &str) -> AppResult<PurchaseTransaction> {
        let sql = format!(
            "SELECT {} FROM purchase_transactions WHERE receipt_number = $1",
            PURCHASE_COLUMNS
        );
        sqlx::query_as::<_, PurchaseTransaction>(&sql)
            .bind(receipt_number)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Receipt".to_string()))
    }

    /// List purchases with optional filters
    pub async fn get_all(&self, filters: PurchaseFilters) -> AppResult<Vec<PurchaseTransaction>> {
        let sql = format!(
            "SELECT {} FROM purchase_transactions
             WHERE ($1::uuid IS NULL OR season_id = $1)
               AND ($2::uuid IS NULL OR farmer_id = $2)
               AND ($3::text IS NULL OR status = $3)
             ORDER BY transaction_at DESC",
            PURCHASE_COLUMNS
        );
        let purchases = sqlx::query_as::<_, PurchaseTransaction>(&sql)
            .bind(filters.season_id)
            .bind(filters.farmer_id)
            .bind(&filters.status)
            .fetch_all(&self.db)
            .await?;
        Ok(purchases)
    }

    /// Split children of a receipt
    pub async fn get_split_children(&self, parent_id: Uuid) -> AppResult<Vec<PurchaseTransaction>> {
        let sql = format!(
            "SELECT {} FROM purchase_transactions WHERE parent_id = $1 ORDER BY receipt_number",
            PURCHASE_COLUMNS
        );
        let children = sqlx::query_as::<_, PurchaseTransaction>(&sql)
            .bind(parent_id)
            .fetch_all(&self.db)
            .await?;
        Ok(children)
    }

    /// Receipts with remaining sale capacity for a season.
    ///
    /// Split parents are excluded (their children carry the weight); the
    /// parents' own rows still count in season totals elsewhere.
    pub async fn get_unsold(&self, season_id: Uuid) -> AppResult<Vec<UnsoldPurchase>> {
        let unsold = sqlx::query_as::<_, UnsoldPurchase>(
            r#"
            SELECT pt.id, pt.receipt_number, pt.transaction_at, pt.net_weight_kg,
                   pt.grade_id, pt.product_id, pt.parent_id,
                   f.farmer_code, f.full_name AS farmer_name, g.grade_name,
                   COALESCE(SUM(spm.quantity_kg), 0) AS sold_quantity_kg,
                   pt.net_weight_kg - COALESCE(SUM(spm.quantity_kg), 0) AS available_quantity_kg
            FROM purchase_transactions pt
            JOIN farmers f ON f.id = pt.farmer_id
            JOIN paddy_grades g ON g.id = pt.grade_id
            LEFT JOIN sales_purchase_mapping spm ON spm.purchase_id = pt.id
            WHERE pt.status = 'completed'
              AND pt.season_id = $1
              AND NOT EXISTS (
                  SELECT 1 FROM purchase_transactions c WHERE c.parent_id = pt.id
              )
            GROUP BY pt.id, f.farmer_code, f.full_name, g.grade_name
            HAVING pt.net_weight_kg - COALESCE(SUM(spm.quantity_kg), 0) > 0
            ORDER BY pt.transaction_at
            "#,
        )
        .bind(season_id)
        .fetch_all(&self.db)
        .await?;
        Ok(unsold)
    }

    /// Season purchase totals. Split children are excluded so split receipts
    /// are not double counted.
    pub async fn total_stats(&self, season_id: Uuid) -> AppResult<PurchaseStats> {
        let stats = sqlx::query_as::<_, PurchaseStats>(
            r#"
            SELECT COUNT(*) AS total_transactions,
                   COALESCE(SUM(net_weight_kg), 0) AS total_net_weight_kg,
                   COALESCE(SUM(total_amount), 0) AS total_amount
            FROM purchase_transactions
            WHERE status = 'completed' AND season_id = $1 AND parent_id IS NULL
            "#,
        )
        .bind(season_id)
        .fetch_one(&self.db)
        .await?;
        Ok(stats)
    }

    async fn resolve_grade(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        grade_id: Option<Uuid>,
    ) -> AppResult<GradeRow> {
        let grade = match grade_id {
            Some(id) => sqlx::query_as::<_, GradeRow>(
                "SELECT id, max_moisture_percent, max_foreign_matter_percent, penalty_per_percent
                 FROM paddy_grades WHERE id = $1 AND is_active = TRUE",
            )
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Grade".to_string()))?,
            None => sqlx::query_as::<_, GradeRow>(
                "SELECT id, max_moisture_percent, max_foreign_matter_percent, penalty_per_percent
                 FROM paddy_grades WHERE is_active = TRUE
                 ORDER BY display_order, grade_code LIMIT 1",
            )
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| {
                AppError::Configuration(
                    "No active paddy grade is configured; create one under Settings > Grades"
                        .to_string(),
                )
            })?,
        };
        Ok(grade)
    }
}

/// Lock a purchase row for the remainder of the transaction.
pub(crate) async fn lock_purchase(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> AppResult<PurchaseTransaction> {
    let sql = format!(
        "SELECT {} FROM purchase_transactions WHERE id = $1 FOR UPDATE",
        PURCHASE_COLUMNS
    );
    sqlx::query_as::<_, PurchaseTransaction>(&sql)
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Purchase transaction".to_string()))
}

/// Quantity already mapped to sales for a purchase, within the transaction.
pub(crate) async fn mapped_quantity(
    tx: &mut Transaction<'_, Postgres>,
    purchase_id: Uuid,
) -> AppResult<Decimal> {
    let sold = sqlx::query_scalar::<_, Decimal>(
        "SELECT COALESCE(SUM(quantity_kg), 0) FROM sales_purchase_mapping WHERE purchase_id = $1",
    )
    .bind(purchase_id)
    .fetch_one(&mut **tx)
    .await?;
    Ok(sold)
}

/// Split an already-locked receipt inside the caller's transaction.
///
/// Used directly by [`PurchaseService::split`] and by sale creation when an
/// allocation consumes only part of a receipt, so that the split rolls back
/// with the sale on failure.
pub(crate) async fn split_locked(
    tx: &mut Transaction<'_, Postgres>,
    parent: &PurchaseTransaction,
    split_weight_kg: Decimal,
    actor: Option<Uuid>,
) -> AppResult<(PurchaseTransaction, PurchaseTransaction)> {
    if parent.status == "cancelled" {
        return Err(AppError::InvalidStateTransition(
            "Cancelled receipts cannot be split".to_string(),
        ));
    }

    let has_children = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM purchase_transactions WHERE parent_id = $1)",
    )
    .bind(parent.id)
    .fetch_one(&mut **tx)
    .await?;
    if has_children {
        return Err(AppError::InvalidStateTransition(
            "Receipt has already been split".to_string(),
        ));
    }

    let sold = mapped_quantity(tx, parent.id).await?;
    if parent.net_weight_kg - sold <= Decimal::ZERO {
        return Err(AppError::InvalidStateTransition(
            "Receipt is fully allocated to sales".to_string(),
        ));
    }

    let source = SplitSource {
        net_weight_kg: parent.net_weight_kg,
        effective_weight_kg: parent.effective_weight_kg,
        total_deduction_percent: parent.total_deduction_percent,
        final_price_per_kg: parent.final_price_per_kg,
        moisture_penalty: parent.moisture_penalty,
        foreign_matter_penalty: parent.foreign_matter_penalty,
        total_amount: parent.total_amount,
    };
    let plan = plan_split(&source, split_weight_kg).map_err(AppError::ValidationError)?;

    let (receipt1, receipt2) = split_child_receipt_numbers(&parent.receipt_number);

    let child1 = insert_split_child(tx, parent, &receipt1, &plan.child1, actor).await?;
    let child2 = insert_split_child(tx, parent, &receipt2, &plan.child2, actor).await?;

    sqlx::query("UPDATE purchase_transactions SET updated_at = NOW() WHERE id = $1")
        .bind(parent.id)
        .execute(&mut **tx)
        .await?;

    Ok((child1, child2))
}

async fn insert_split_child(
    tx: &mut Transaction<'_, Postgres>,
    parent: &PurchaseTransaction,
    receipt_number: &str,
    portion: &shared::ledger::SplitPortion,
    actor: Option<Uuid>,
) -> AppResult<PurchaseTransaction> {
    // Splitting partitions already-weighed paddy: gross = net, tare = 0.
    let sql = format!(
        "INSERT INTO purchase_transactions (
            receipt_number, season_id, farmer_id, grade_id, product_id, parent_id,
            gross_weight_kg, tare_weight_kg, net_weight_kg,
            moisture_percent, foreign_matter_percent,
            base_price_per_kg, moisture_penalty, foreign_matter_penalty,
            deduction_config, total_deduction_percent, effective_weight_kg,
            final_price_per_kg, total_amount,
            vehicle_number, driver_name, status, payment_status, created_by
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, 0, $7, $8, $9, $10, $11, $12, $13,
                $14, $15, $16, $17, $18, $19, 'completed', $20, $21)
        RETURNING {}",
        PURCHASE_COLUMNS
    );
    let child = sqlx::query_as::<_, PurchaseTransaction>(&sql)
        .bind(receipt_number)
        .bind(parent.season_id)
        .bind(parent.farmer_id)
        .bind(parent.grade_id)
        .bind(parent.product_id)
        .bind(parent.id)
        .bind(portion.net_weight_kg)
        .bind(parent.moisture_percent)
        .bind(parent.foreign_matter_percent)
        .bind(parent.base_price_per_kg)
        .bind(portion.moisture_penalty)
        .bind(portion.foreign_matter_penalty)
        .bind(&parent.deduction_config)
        .bind(parent.total_deduction_percent)
        .bind(portion.effective_weight_kg)
        .bind(parent.final_price_per_kg)
        .bind(portion.total_amount)
        .bind(&parent.vehicle_number)
        .bind(&parent.driver_name)
        .bind(&parent.payment_status)
        .bind(actor.or(parent.created_by))
        .fetch_one(&mut **tx)
        .await?;
    Ok(child)
}

/// Reserve the next receipt number for a season.
///
/// The sequence row is locked FOR UPDATE so two concurrent purchases cannot
/// observe the same number; the reservation commits or rolls back with the
/// purchase itself.
pub(crate) async fn reserve_receipt_number(
    tx: &mut Transaction<'_, Postgres>,
    season_id: Uuid,
    season_code: &str,
) -> AppResult<String> {
    sqlx::query("INSERT INTO receipt_sequences (season_id) VALUES ($1) ON CONFLICT (season_id) DO NOTHING")
        .bind(season_id)
        .execute(&mut **tx)
        .await?;

    let number = sqlx::query_scalar::<_, i64>(
        "SELECT next_number FROM receipt_sequences WHERE season_id = $1 FOR UPDATE",
    )
    .bind(season_id)
    .fetch_one(&mut **tx)
    .await?;

    sqlx::query("UPDATE receipt_sequences SET next_number = next_number + 1 WHERE season_id = $1")
        .bind(season_id)
        .execute(&mut **tx)
        .await?;

    Ok(format_receipt_number(season_code, number))
}
