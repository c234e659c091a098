//! Manufacturer (buyer) registry service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::validation::validate_malaysian_phone;

/// Manufacturer service for the buyer registry
#[derive(Clone)]
pub struct ManufacturerService {
    db: PgPool,
}

/// A manufacturer row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Manufacturer {
    pub id: Uuid,
    pub manufacturer_code: String,
    pub company_name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for registering a manufacturer
#[derive(Debug, Deserialize)]
pub struct CreateManufacturerInput {
    pub manufacturer_code: String,
    pub company_name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Input for updating a manufacturer
#[derive(Debug, Deserialize)]
pub struct UpdateManufacturerInput {
    pub company_name: Option<String>,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub is_active: Option<bool>,
}

const MANUFACTURER_COLUMNS: &str = "id, manufacturer_code, company_name, contact_person, \
     phone, address, is_active, created_at, updated_at";

impl ManufacturerService {
    /// Create a new ManufacturerService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// All manufacturers
    pub async fn get_all(&self) -> AppResult<Vec<Manufacturer>> {
        let sql = format!(
            "SELECT {} FROM manufacturers ORDER BY company_name",
            MANUFACTURER_COLUMNS
        );
        let manufacturers = sqlx::query_as::<_, Manufacturer>(&sql)
            .fetch_all(&self.db)
            .await?;
        Ok(manufacturers)
    }

    /// Get a manufacturer by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Manufacturer> {
        let sql = format!(
            "SELECT {} FROM manufacturers WHERE id = $1",
            MANUFACTURER_COLUMNS
        );
        sqlx::query_as::<_, Manufacturer>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Manufacturer".to_string()))
    }

    /// Register a manufacturer
    pub async fn create(&self, input: CreateManufacturerInput) -> AppResult<Manufacturer> {
        if input.company_name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "company_name".to_string(),
                message: "Company name cannot be empty".to_string(),
                message_ms: "Nama syarikat tidak boleh kosong".to_string(),
            });
        }
        if let Some(ref phone) = input.phone {
            validate_malaysian_phone(phone).map_err(|msg| AppError::Validation {
                field: "phone".to_string(),
                message: msg.to_string(),
                message_ms: "Nombor telefon tidak sah".to_string(),
            })?;
        }

        let sql = format!(
            "INSERT INTO manufacturers (manufacturer_code, company_name, contact_person, phone, address)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {}",
            MANUFACTURER_COLUMNS
        );
        let manufacturer = sqlx::query_as::<_, Manufacturer>(&sql)
            .bind(&input.manufacturer_code)
            .bind(&input.company_name)
            .bind(&input.contact_person)
            .bind(&input.phone)
            .bind(&input.address)
            .fetch_one(&self.db)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                    AppError::DuplicateEntry("manufacturer code".to_string())
                }
                _ => AppError::DatabaseError(e),
            })?;
        Ok(manufacturer)
    }

    /// Update a manufacturer
    pub async fn update(&self, id: Uuid, input: UpdateManufacturerInput) -> AppResult<Manufacturer> {
        let existing = self.get_by_id(id).await?;

        let company_name = input.company_name.unwrap_or(existing.company_name);
        let contact_person = input.contact_person.or(existing.contact_person);
        let phone = input.phone.or(existing.phone);
        let address = input.address.or(existing.address);
        let is_active = input.is_active.unwrap_or(existing.is_active);

        let sql = format!(
            "UPDATE manufacturers
             SET company_name = $2, contact_person = $3, phone = $4, address = $5,
                 is_active = $6, updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            MANUFACTURER_COLUMNS
        );
        let manufacturer = sqlx::query_as::<_, Manufacturer>(&sql)
            .bind(id)
            .bind(&company_name)
            .bind(&contact_person)
            .bind(&phone)
            .bind(&address)
            .bind(is_active)
            .fetch_one(&self.db)
            .await?;
        Ok(manufacturer)
    }
}
