//! Season-product pricing HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::services::price::{PricingService, ProductOpeningPrice};
use crate::AppState;

/// Request body for a price update
#[derive(Debug, Deserialize)]
pub struct UpdatePriceRequest {
    pub price_per_ton: Decimal,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
}

/// Request body for initialising season prices
#[derive(Debug, Deserialize)]
pub struct InitializePricesRequest {
    pub product_prices: Vec<ProductOpeningPrice>,
    pub created_by: Option<Uuid>,
}

/// Request body for copying prices from another season
#[derive(Debug, Deserialize)]
pub struct CopyPricesRequest {
    pub source_season_id: Uuid,
    pub created_by: Option<Uuid>,
}

/// Query parameters for point-in-time price resolution
#[derive(Debug, Deserialize)]
pub struct PriceAtQuery {
    pub at: Option<DateTime<Utc>>,
}

/// All product prices for a season
pub async fn list_season_prices(
    State(state): State<AppState>,
    Path(season_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = PricingService::new(state.db.clone());

    match service.get_season_product_prices(season_id).await {
        Ok(prices) => (StatusCode::OK, Json(serde_json::json!({ "prices": prices })))
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Price for one product: current, or at a point in time when `at` is given
pub async fn get_product_price(
    State(state): State<AppState>,
    Path((season_id, product_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<PriceAtQuery>,
) -> impl IntoResponse {
    let service = PricingService::new(state.db.clone());

    let result = match query.at {
        Some(at) => service.price_at(season_id, product_id, at).await,
        None => service.current_price(season_id, product_id).await,
    };

    match result {
        Ok(price) => (
            StatusCode::OK,
            Json(serde_json::json!({ "price_per_ton": price })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Update one product's price for a season
pub async fn update_product_price(
    State(state): State<AppState>,
    Path((season_id, product_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<UpdatePriceRequest>,
) -> impl IntoResponse {
    let service = PricingService::new(state.db.clone());

    match service
        .update_product_price(
            season_id,
            product_id,
            request.price_per_ton,
            request.notes,
            request.created_by,
        )
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

/// Initialise product prices for a season
pub async fn initialize_season_prices(
    State(state): State<AppState>,
    Path(season_id): Path<Uuid>,
    Json(request): Json<InitializePricesRequest>,
) -> impl IntoResponse {
    let service = PricingService::new(state.db.clone());

    match service
        .initialize_season_prices(season_id, request.product_prices, request.created_by)
        .await
    {
        Ok(count) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "products_initialized": count })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Copy product prices from another season
pub async fn copy_season_prices(
    State(state): State<AppState>,
    Path(season_id): Path<Uuid>,
    Json(request): Json<CopyPricesRequest>,
) -> impl IntoResponse {
    let service = PricingService::new(state.db.clone());

    match service
        .copy_prices_from_season(season_id, request.source_season_id, request.created_by)
        .await
    {
        Ok(count) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "products_copied": count })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Price history for a product in a season
pub async fn get_price_history(
    State(state): State<AppState>,
    Path((season_id, product_id)): Path<(Uuid, Uuid)>,
) -> impl IntoResponse {
    let service = PricingService::new(state.db.clone());

    match service.get_price_history(season_id, product_id).await {
        Ok(history) => (
            StatusCode::OK,
            Json(serde_json::json!({ "history": history })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}
