//! Paddy product HTTP handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::services::product::{CreateProductInput, ProductService, UpdateProductInput};
use crate::AppState;

/// List all products
pub async fn list_products(State(state): State<AppState>) -> impl IntoResponse {
    let service = ProductService::new(state.db.clone());

    match service.get_all().await {
        Ok(products) => (
            StatusCode::OK,
            Json(serde_json::json!({ "products": products })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// List active products
pub async fn list_active_products(State(state): State<AppState>) -> impl IntoResponse {
    let service = ProductService::new(state.db.clone());

    match service.get_active().await {
        Ok(products) => (
            StatusCode::OK,
            Json(serde_json::json!({ "products": products })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Get a product by ID
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = ProductService::new(state.db.clone());

    match service.get_by_id(product_id).await {
        Ok(product) => (StatusCode::OK, Json(product)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Create a product
pub async fn create_product(
    State(state): State<AppState>,
    Json(input): Json<CreateProductInput>,
) -> impl IntoResponse {
    let service = ProductService::new(state.db.clone());

    match service.create(input).await {
        Ok(product) => (StatusCode::CREATED, Json(product)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Update a product
pub async fn update_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(input): Json<UpdateProductInput>,
) -> impl IntoResponse {
    let service = ProductService::new(state.db.clone());

    match service.update(product_id, input).await {
        Ok(product) => (StatusCode::OK, Json(product)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Deactivate a product
pub async fn deactivate_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = ProductService::new(state.db.clone());

    match service.deactivate(product_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}
