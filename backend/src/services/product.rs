//! Paddy product (variety) service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Product service for paddy varieties
#[derive(Clone)]
pub struct ProductService {
    db: PgPool,
}

/// A paddy product row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PaddyProduct {
    pub id: Uuid,
    pub product_code: String,
    pub product_name: String,
    pub product_type: String,
    pub variety: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a product
#[derive(Debug, Deserialize)]
pub struct CreateProductInput {
    pub product_code: String,
    pub product_name: String,
    pub product_type: String,
    pub variety: Option<String>,
}

/// Input for updating a product
#[derive(Debug, Deserialize)]
pub struct UpdateProductInput {
    pub product_name: Option<String>,
    pub product_type: Option<String>,
    pub variety: Option<String>,
    pub is_active: Option<bool>,
}

const PRODUCT_COLUMNS: &str =
    "id, product_code, product_name, product_type, variety, is_active, created_at, updated_at";

impl ProductService {
    /// Create a new ProductService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// All products
    pub async fn get_all(&self) -> AppResult<Vec<PaddyProduct>> {
        let sql = format!(
            "SELECT {} FROM paddy_products ORDER BY product_type, variety, product_name",
            PRODUCT_COLUMNS
        );
        let products = sqlx::query_as::<_, PaddyProduct>(&sql)
            .fetch_all(&self.db)
            .await?;
        Ok(products)
    }

    /// Active products only
    pub async fn get_active(&self) -> AppResult<Vec<PaddyProduct>> {
        let sql = format!(
            "SELECT {} FROM paddy_products WHERE is_active = TRUE
             ORDER BY product_type, variety, product_name",
            PRODUCT_COLUMNS
        );
        let products = sqlx::query_as::<_, PaddyProduct>(&sql)
            .fetch_all(&self.db)
            .await?;
        Ok(products)
    }

    /// Get a product by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<PaddyProduct> {
        let sql = format!("SELECT {} FROM paddy_products WHERE id = $1", PRODUCT_COLUMNS);
        sqlx::query_as::<_, PaddyProduct>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))
    }

    /// Create a product
    pub async fn create(&self, input: CreateProductInput) -> AppResult<PaddyProduct> {
        if input.product_code.trim().is_empty() {
            return Err(AppError::Validation {
                field: "product_code".to_string(),
                message: "Product code cannot be empty".to_string(),
                message_ms: "Kod produk tidak boleh kosong".to_string(),
            });
        }
        if input.product_name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "product_name".to_string(),
                message: "Product name cannot be empty".to_string(),
                message_ms: "Nama produk tidak boleh kosong".to_string(),
            });
        }

        let sql = format!(
            "INSERT INTO paddy_products (product_code, product_name, product_type, variety)
             VALUES ($1, $2, $3, $4)
             RETURNING {}",
            PRODUCT_COLUMNS
        );
        let product = sqlx::query_as::<_, PaddyProduct>(&sql)
            .bind(&input.product_code)
            .bind(&input.product_name)
            .bind(&input.product_type)
            .bind(&input.variety)
            .fetch_one(&self.db)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                    AppError::DuplicateEntry("product code".to_string())
                }
                _ => AppError::DatabaseError(e),
            })?;
        Ok(product)
    }

    /// Update a product
    pub async fn update(&self, id: Uuid, input: UpdateProductInput) -> AppResult<PaddyProduct> {
        let existing = self.get_by_id(id).await?;

        let product_name = input.product_name.unwrap_or(existing.product_name);
        let product_type = input.product_type.unwrap_or(existing.product_type);
        let variety = input.variety.or(existing.variety);
        let is_active = input.is_active.unwrap_or(existing.is_active);

        let sql = format!(
            "UPDATE paddy_products
             SET product_name = $2, product_type = $3, variety = $4, is_active = $5,
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            PRODUCT_COLUMNS
        );
        let product = sqlx::query_as::<_, PaddyProduct>(&sql)
            .bind(id)
            .bind(&product_name)
            .bind(&product_type)
            .bind(&variety)
            .bind(is_active)
            .fetch_one(&self.db)
            .await?;
        Ok(product)
    }

    /// Deactivate a product (products referenced by the ledger are never
    /// physically deleted)
    pub async fn deactivate(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE paddy_products SET is_active = FALSE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Product".to_string()));
        }
        Ok(())
    }
}
