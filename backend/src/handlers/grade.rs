//! Paddy grade HTTP handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::services::grade::GradeService;
use crate::AppState;

/// List all grades
pub async fn list_grades(State(state): State<AppState>) -> impl IntoResponse {
    let service = GradeService::new(state.db.clone());

    match service.get_all().await {
        Ok(grades) => (StatusCode::OK, Json(serde_json::json!({ "grades": grades })))
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// The default grade used when a purchase omits one
pub async fn get_default_grade(State(state): State<AppState>) -> impl IntoResponse {
    let service = GradeService::new(state.db.clone());

    match service.default_grade().await {
        Ok(grade) => (StatusCode::OK, Json(grade)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Get a grade by ID
pub async fn get_grade(
    State(state): State<AppState>,
    Path(grade_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = GradeService::new(state.db.clone());

    match service.get_by_id(grade_id).await {
        Ok(grade) => (StatusCode::OK, Json(grade)).into_response(),
        Err(e) => e.into_response(),
    }
}
