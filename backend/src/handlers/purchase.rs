//! Purchase ledger HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::services::purchase::{
    CancelPendingLorryInput, CreatePurchaseInput, PurchaseFilters, PurchaseService,
};
use crate::AppState;

/// Request body for splitting a receipt
#[derive(Debug, Deserialize)]
pub struct SplitRequest {
    pub split_weight_kg: Decimal,
    pub actor_id: Option<Uuid>,
}

/// Request body for reassigning a farmer
#[derive(Debug, Deserialize)]
pub struct ChangeFarmerRequest {
    pub new_farmer_id: Uuid,
    pub actor_id: Option<Uuid>,
    pub reason: String,
}

/// Request body for payment updates
#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    pub paid: bool,
    pub payment_reference: Option<String>,
}

/// Record a purchase transaction
pub async fn create_purchase(
    State(state): State<AppState>,
    Json(input): Json<CreatePurchaseInput>,
) -> impl IntoResponse {
    let service = PurchaseService::new(state.db.clone());

    match service.create(input).await {
        Ok(purchase) => (StatusCode::CREATED, Json(purchase)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// List purchases with optional filters
pub async fn list_purchases(
    State(state): State<AppState>,
    Query(filters): Query<PurchaseFilters>,
) -> impl IntoResponse {
    let service = PurchaseService::new(state.db.clone());

    match service.get_all(filters).await {
        Ok(purchases) => (
            StatusCode::OK,
            Json(serde_json::json!({ "purchases": purchases })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Get a purchase by ID
pub async fn get_purchase(
    State(state): State<AppState>,
    Path(transaction_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = PurchaseService::new(state.db.clone());

    match service.get_by_id(transaction_id).await {
        Ok(purchase) => (StatusCode::OK, Json(purchase)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Get a purchase by receipt number
pub async fn get_purchase_by_receipt(
    State(state): State<AppState>,
    Path(receipt_number): Path<String>,
) -> impl IntoResponse {
    let service = PurchaseService::new(state.db.clone());

    match service.get_by_receipt(&receipt_number).await {
        Ok(purchase) => (StatusCode::OK, Json(purchase)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Receipts still available for sale in a season
pub async fn get_unsold_purchases(
    State(state): State<AppState>,
    Path(season_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = PurchaseService::new(state.db.clone());

    match service.get_unsold(season_id).await {
        Ok(unsold) => (
            StatusCode::OK,
            Json(serde_json::json!({ "purchases": unsold })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Season purchase totals
pub async fn get_purchase_stats(
    State(state): State<AppState>,
    Path(season_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = PurchaseService::new(state.db.clone());

    match service.total_stats(season_id).await {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Split a receipt into two children
pub async fn split_purchase(
    State(state): State<AppState>,
    Path(transaction_id): Path<Uuid>,
    Json(request): Json<SplitRequest>,
) -> impl IntoResponse {
    let service = PurchaseService::new(state.db.clone());

    match service
        .split(transaction_id, request.split_weight_kg, request.actor_id)
        .await
    {
        Ok(outcome) => (StatusCode::CREATED, Json(outcome)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Children of a split receipt
pub async fn get_split_children(
    State(state): State<AppState>,
    Path(transaction_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = PurchaseService::new(state.db.clone());

    match service.get_split_children(transaction_id).await {
        Ok(children) => (
            StatusCode::OK,
            Json(serde_json::json!({ "children": children })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Reassign the farmer on a receipt and its split children
pub async fn change_farmer(
    State(state): State<AppState>,
    Path(transaction_id): Path<Uuid>,
    Json(request): Json<ChangeFarmerRequest>,
) -> impl IntoResponse {
    let service = PurchaseService::new(state.db.clone());

    match service
        .change_farmer(
            transaction_id,
            request.new_farmer_id,
            request.actor_id,
            &request.reason,
        )
        .await
    {
        Ok(purchase) => (StatusCode::OK, Json(purchase)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Mark a receipt paid or unpaid
pub async fn update_purchase_payment(
    State(state): State<AppState>,
    Path(transaction_id): Path<Uuid>,
    Json(request): Json<PaymentRequest>,
) -> impl IntoResponse {
    let service = PurchaseService::new(state.db.clone());

    match service
        .update_payment(transaction_id, request.paid, request.payment_reference)
        .await
    {
        Ok(purchase) => (StatusCode::OK, Json(purchase)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Record a lorry that left before weigh-out as a cancelled receipt
pub async fn cancel_pending_lorry(
    State(state): State<AppState>,
    Json(input): Json<CancelPendingLorryInput>,
) -> impl IntoResponse {
    let service = PurchaseService::new(state.db.clone());

    match service.cancel_pending_lorry(input).await {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(e) => e.into_response(),
    }
}
