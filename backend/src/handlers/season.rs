//! Season management HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::services::season::{CreateSeasonInput, SeasonFilters, SeasonService, UpdateSeasonInput};
use crate::AppState;

/// List seasons with optional filters
pub async fn list_seasons(
    State(state): State<AppState>,
    Query(filters): Query<SeasonFilters>,
) -> impl IntoResponse {
    let service = SeasonService::new(state.db.clone());

    match service.get_all(filters).await {
        Ok(seasons) => (
            StatusCode::OK,
            Json(serde_json::json!({ "seasons": seasons })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// The currently active season
pub async fn get_active_season(State(state): State<AppState>) -> impl IntoResponse {
    let service = SeasonService::new(state.db.clone());

    match service.get_active().await {
        Ok(season) => (StatusCode::OK, Json(season)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Get a season by ID
pub async fn get_season(
    State(state): State<AppState>,
    Path(season_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = SeasonService::new(state.db.clone());

    match service.get_by_id(season_id).await {
        Ok(season) => (StatusCode::OK, Json(season)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Create a season
pub async fn create_season(
    State(state): State<AppState>,
    Json(input): Json<CreateSeasonInput>,
) -> impl IntoResponse {
    let service = SeasonService::new(state.db.clone());

    match service.create(input).await {
        Ok(season) => (StatusCode::CREATED, Json(season)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Update a season
pub async fn update_season(
    State(state): State<AppState>,
    Path(season_id): Path<Uuid>,
    Json(input): Json<UpdateSeasonInput>,
) -> impl IntoResponse {
    let service = SeasonService::new(state.db.clone());

    match service.update(season_id, input).await {
        Ok(season) => (StatusCode::OK, Json(season)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Close the active season
pub async fn close_season(
    State(state): State<AppState>,
    Path(season_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = SeasonService::new(state.db.clone());

    match service.close(season_id).await {
        Ok(season) => (StatusCode::OK, Json(season)).into_response(),
        Err(e) => e.into_response(),
    }
}
