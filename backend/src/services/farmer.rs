//! Farmer registry service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::validation::{validate_farmer_code, validate_malaysian_phone, validate_mykad};

/// Farmer service for the farmer registry
#[derive(Clone)]
pub struct FarmerService {
    db: PgPool,
}

/// A farmer row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Farmer {
    pub id: Uuid,
    pub farmer_code: String,
    pub full_name: String,
    pub national_id: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub state: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for registering a farmer
#[derive(Debug, Deserialize)]
pub struct CreateFarmerInput {
    pub farmer_code: String,
    pub full_name: String,
    pub national_id: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub state: Option<String>,
}

/// Input for updating a farmer
#[derive(Debug, Deserialize)]
pub struct UpdateFarmerInput {
    pub full_name: Option<String>,
    pub national_id: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub state: Option<String>,
    pub is_active: Option<bool>,
}

const FARMER_COLUMNS: &str =
    "id, farmer_code, full_name, national_id, phone, address, state, is_active, created_at, updated_at";

impl FarmerService {
    /// Create a new FarmerService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// All farmers
    pub async fn get_all(&self) -> AppResult<Vec<Farmer>> {
        let sql = format!("SELECT {} FROM farmers ORDER BY farmer_code", FARMER_COLUMNS);
        let farmers = sqlx::query_as::<_, Farmer>(&sql).fetch_all(&self.db).await?;
        Ok(farmers)
    }

    /// Get a farmer by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Farmer> {
        let sql = format!("SELECT {} FROM farmers WHERE id = $1", FARMER_COLUMNS);
        sqlx::query_as::<_, Farmer>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Farmer".to_string()))
    }

    /// Search farmers by code or name
    pub async fn search(&self, query: &str) -> AppResult<Vec<Farmer>> {
        let pattern = format!("%{}%", query);
        let sql = format!(
            "SELECT {} FROM farmers
             WHERE farmer_code ILIKE $1 OR full_name ILIKE $1
             ORDER BY farmer_code LIMIT 50",
            FARMER_COLUMNS
        );
        let farmers = sqlx::query_as::<_, Farmer>(&sql)
            .bind(&pattern)
            .fetch_all(&self.db)
            .await?;
        Ok(farmers)
    }

    /// Register a farmer
    pub async fn create(&self, input: CreateFarmerInput) -> AppResult<Farmer> {
        validate_farmer_code(&input.farmer_code).map_err(|msg| AppError::Validation {
            field: "farmer_code".to_string(),
            message: msg.to_string(),
            message_ms: "Kod petani tidak sah".to_string(),
        })?;
        if input.full_name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "full_name".to_string(),
                message: "Farmer name cannot be empty".to_string(),
                message_ms: "Nama petani tidak boleh kosong".to_string(),
            });
        }
        if let Some(ref national_id) = input.national_id {
            validate_mykad(national_id).map_err(|msg| AppError::Validation {
                field: "national_id".to_string(),
                message: msg.to_string(),
                message_ms: "Nombor MyKad tidak sah".to_string(),
            })?;
        }
        if let Some(ref phone) = input.phone {
            validate_malaysian_phone(phone).map_err(|msg| AppError::Validation {
                field: "phone".to_string(),
                message: msg.to_string(),
                message_ms: "Nombor telefon tidak sah".to_string(),
            })?;
        }

        let sql = format!(
            "INSERT INTO farmers (farmer_code, full_name, national_id, phone, address, state)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {}",
            FARMER_COLUMNS
        );
        let farmer = sqlx::query_as::<_, Farmer>(&sql)
            .bind(&input.farmer_code)
            .bind(&input.full_name)
            .bind(&input.national_id)
            .bind(&input.phone)
            .bind(&input.address)
            .bind(&input.state)
            .fetch_one(&self.db)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                    AppError::DuplicateEntry("farmer code".to_string())
                }
                _ => AppError::DatabaseError(e),
            })?;
        Ok(farmer)
    }

    /// Update a farmer
    pub async fn update(&self, id: Uuid, input: UpdateFarmerInput) -> AppResult<Farmer> {
        let existing = self.get_by_id(id).await?;

        if let Some(ref phone) = input.phone {
            validate_malaysian_phone(phone).map_err(|msg| AppError::Validation {
                field: "phone".to_string(),
                message: msg.to_string(),
                message_ms: "Nombor telefon tidak sah".to_string(),
            })?;
        }

        let full_name = input.full_name.unwrap_or(existing.full_name);
        let national_id = input.national_id.or(existing.national_id);
        let phone = input.phone.or(existing.phone);
        let address = input.address.or(existing.address);
        let state = input.state.or(existing.state);
        let is_active = input.is_active.unwrap_or(existing.is_active);

        let sql = format!(
            "UPDATE farmers
             SET full_name = $2, national_id = $3, phone = $4, address = $5,
                 state = $6, is_active = $7, updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            FARMER_COLUMNS
        );
        let farmer = sqlx::query_as::<_, Farmer>(&sql)
            .bind(id)
            .bind(&full_name)
            .bind(&national_id)
            .bind(&phone)
            .bind(&address)
            .bind(&state)
            .bind(is_active)
            .fetch_one(&self.db)
            .await?;
        Ok(farmer)
    }

    /// Deactivate a farmer (farmers referenced by the ledger are never
    /// physically deleted)
    pub async fn deactivate(&self, id: Uuid) -> AppResult<()> {
        let result =
            sqlx::query("UPDATE farmers SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .execute(&self.db)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Farmer".to_string()));
        }
        Ok(())
    }
}
