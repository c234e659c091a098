//! Weighbridge HTTP handlers

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::external::WeighbridgeClient;
use crate::AppState;

/// Read the current weight from the weighbridge indicator
pub async fn read_weight(State(state): State<AppState>) -> impl IntoResponse {
    let client = WeighbridgeClient::new(state.config.weighbridge.clone());

    match client.read().await {
        Ok(reading) => (StatusCode::OK, Json(reading)).into_response(),
        Err(e) => e.into_response(),
    }
}
