//! Sales ledger HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::services::sale::{CreateSaleInput, SaleFilters, SalesService};
use crate::AppState;

/// Record a sale against one manufacturer
pub async fn create_sale(
    State(state): State<AppState>,
    Json(input): Json<CreateSaleInput>,
) -> impl IntoResponse {
    let service = SalesService::new(state.db.clone());

    match service.create(input).await {
        Ok(sale) => (StatusCode::CREATED, Json(sale)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// List sales with optional filters
pub async fn list_sales(
    State(state): State<AppState>,
    Query(filters): Query<SaleFilters>,
) -> impl IntoResponse {
    let service = SalesService::new(state.db.clone());

    match service.get_all(filters).await {
        Ok(sales) => (StatusCode::OK, Json(serde_json::json!({ "sales": sales }))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Get a sale with its mapped purchase receipts
pub async fn get_sale(
    State(state): State<AppState>,
    Path(sales_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = SalesService::new(state.db.clone());

    match service.get_by_id(sales_id).await {
        Ok(sale) => (StatusCode::OK, Json(sale)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Get a sale by its sales number
pub async fn get_sale_by_number(
    State(state): State<AppState>,
    Path(sales_number): Path<String>,
) -> impl IntoResponse {
    let service = SalesService::new(state.db.clone());

    match service.get_by_number(&sales_number).await {
        Ok(sale) => (StatusCode::OK, Json(sale)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Season sales totals
pub async fn get_sale_stats(
    State(state): State<AppState>,
    Path(season_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = SalesService::new(state.db.clone());

    match service.total_stats(season_id).await {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(e) => e.into_response(),
    }
}
