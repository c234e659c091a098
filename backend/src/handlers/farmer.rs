//! Farmer registry HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::services::farmer::{CreateFarmerInput, FarmerService, UpdateFarmerInput};
use crate::AppState;

/// Query parameters for farmer search
#[derive(Debug, Deserialize)]
pub struct FarmerSearchQuery {
    pub q: String,
}

/// List all farmers
pub async fn list_farmers(State(state): State<AppState>) -> impl IntoResponse {
    let service = FarmerService::new(state.db.clone());

    match service.get_all().await {
        Ok(farmers) => (
            StatusCode::OK,
            Json(serde_json::json!({ "farmers": farmers })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Search farmers by code or name
pub async fn search_farmers(
    State(state): State<AppState>,
    Query(query): Query<FarmerSearchQuery>,
) -> impl IntoResponse {
    let service = FarmerService::new(state.db.clone());

    match service.search(&query.q).await {
        Ok(farmers) => (
            StatusCode::OK,
            Json(serde_json::json!({ "farmers": farmers })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Get a farmer by ID
pub async fn get_farmer(
    State(state): State<AppState>,
    Path(farmer_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = FarmerService::new(state.db.clone());

    match service.get_by_id(farmer_id).await {
        Ok(farmer) => (StatusCode::OK, Json(farmer)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Register a farmer
pub async fn create_farmer(
    State(state): State<AppState>,
    Json(input): Json<CreateFarmerInput>,
) -> impl IntoResponse {
    let service = FarmerService::new(state.db.clone());

    match service.create(input).await {
        Ok(farmer) => (StatusCode::CREATED, Json(farmer)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Update a farmer
pub async fn update_farmer(
    State(state): State<AppState>,
    Path(farmer_id): Path<Uuid>,
    Json(input): Json<UpdateFarmerInput>,
) -> impl IntoResponse {
    let service = FarmerService::new(state.db.clone());

    match service.update(farmer_id, input).await {
        Ok(farmer) => (StatusCode::OK, Json(farmer)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Deactivate a farmer
pub async fn deactivate_farmer(
    State(state): State<AppState>,
    Path(farmer_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = FarmerService::new(state.db.clone());

    match service.deactivate(farmer_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}
