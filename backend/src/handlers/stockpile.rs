//! Stockpile HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::services::stockpile::{MovementFilters, StockpileService};
use crate::AppState;

/// Query parameters for the low-stock listing
#[derive(Debug, Deserialize)]
pub struct LowStockQuery {
    pub threshold_kg: Option<Decimal>,
}

/// Stock position per product for a season
pub async fn get_stockpile_summary(
    State(state): State<AppState>,
    Path(season_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = StockpileService::new(state.db.clone());

    match service.get_summary(season_id).await {
        Ok(summary) => (
            StatusCode::OK,
            Json(serde_json::json!({ "stockpiles": summary })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Movement history for one product
pub async fn get_product_movements(
    State(state): State<AppState>,
    Path((season_id, product_id)): Path<(Uuid, Uuid)>,
    Query(filters): Query<MovementFilters>,
) -> impl IntoResponse {
    let service = StockpileService::new(state.db.clone());

    match service
        .get_product_movements(season_id, product_id, filters)
        .await
    {
        Ok(movements) => (
            StatusCode::OK,
            Json(serde_json::json!({ "movements": movements })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Season-wide stock statistics
pub async fn get_stockpile_stats(
    State(state): State<AppState>,
    Path(season_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = StockpileService::new(state.db.clone());

    match service.get_stats(season_id).await {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Products with stock below a threshold (default 1000 kg)
pub async fn get_low_stock_alerts(
    State(state): State<AppState>,
    Path(season_id): Path<Uuid>,
    Query(query): Query<LowStockQuery>,
) -> impl IntoResponse {
    let service = StockpileService::new(state.db.clone());
    let threshold = query.threshold_kg.unwrap_or_else(|| Decimal::from(1000));

    match service.get_low_stock(season_id, threshold).await {
        Ok(items) => (StatusCode::OK, Json(serde_json::json!({ "alerts": items })))
            .into_response(),
        Err(e) => e.into_response(),
    }
}
