//! Manufacturer registry HTTP handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::services::manufacturer::{
    CreateManufacturerInput, ManufacturerService, UpdateManufacturerInput,
};
use crate::AppState;

/// List all manufacturers
pub async fn list_manufacturers(State(state): State<AppState>) -> impl IntoResponse {
    let service = ManufacturerService::new(state.db.clone());

    match service.get_all().await {
        Ok(manufacturers) => (
            StatusCode::OK,
            Json(serde_json::json!({ "manufacturers": manufacturers })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Get a manufacturer by ID
pub async fn get_manufacturer(
    State(state): State<AppState>,
    Path(manufacturer_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = ManufacturerService::new(state.db.clone());

    match service.get_by_id(manufacturer_id).await {
        Ok(manufacturer) => (StatusCode::OK, Json(manufacturer)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Register a manufacturer
pub async fn create_manufacturer(
    State(state): State<AppState>,
    Json(input): Json<CreateManufacturerInput>,
) -> impl IntoResponse {
    let service = ManufacturerService::new(state.db.clone());

    match service.create(input).await {
        Ok(manufacturer) => (StatusCode::CREATED, Json(manufacturer)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Update a manufacturer
pub async fn update_manufacturer(
    State(state): State<AppState>,
    Path(manufacturer_id): Path<Uuid>,
    Json(input): Json<UpdateManufacturerInput>,
) -> impl IntoResponse {
    let service = ManufacturerService::new(state.db.clone());

    match service.update(manufacturer_id, input).await {
        Ok(manufacturer) => (StatusCode::OK, Json(manufacturer)).into_response(),
        Err(e) => e.into_response(),
    }
}
