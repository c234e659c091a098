//! Paddy grade service
//!
//! Grades are operator-managed configuration; purchase creation falls back to
//! the default grade (lowest display order among active grades) when the
//! operator does not pick one.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Grade service for paddy quality grades
#[derive(Clone)]
pub struct GradeService {
    db: PgPool,
}

/// A paddy grade row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PaddyGrade {
    pub id: Uuid,
    pub grade_code: String,
    pub grade_name: String,
    pub max_moisture_percent: Decimal,
    pub max_foreign_matter_percent: Decimal,
    pub penalty_per_percent: Decimal,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

const GRADE_COLUMNS: &str = "id, grade_code, grade_name, max_moisture_percent, \
     max_foreign_matter_percent, penalty_per_percent, display_order, is_active, created_at";

impl GradeService {
    /// Create a new GradeService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// All grades, active first in display order
    pub async fn get_all(&self) -> AppResult<Vec<PaddyGrade>> {
        let sql = format!(
            "SELECT {} FROM paddy_grades ORDER BY is_active DESC, display_order, grade_code",
            GRADE_COLUMNS
        );
        let grades = sqlx::query_as::<_, PaddyGrade>(&sql)
            .fetch_all(&self.db)
            .await?;
        Ok(grades)
    }

    /// Get a grade by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<PaddyGrade> {
        let sql = format!("SELECT {} FROM paddy_grades WHERE id = $1", GRADE_COLUMNS);
        sqlx::query_as::<_, PaddyGrade>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Grade".to_string()))
    }

    /// The default grade: lowest display order among active grades.
    ///
    /// Its absence is an operator configuration problem, surfaced as such so
    /// it can be fixed under settings rather than debugged.
    pub async fn default_grade(&self) -> AppResult<PaddyGrade> {
        let sql = format!(
            "SELECT {} FROM paddy_grades WHERE is_active = TRUE
             ORDER BY display_order, grade_code LIMIT 1",
            GRADE_COLUMNS
        );
        sqlx::query_as::<_, PaddyGrade>(&sql)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| {
                AppError::Configuration(
                    "No active paddy grade is configured; create one under Settings > Grades"
                        .to_string(),
                )
            })
    }
}
