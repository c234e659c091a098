//! Route definitions for the Paddy Collection Management Platform

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Season management
        .nest("/seasons", season_routes())
        // Product catalogue
        .nest("/products", product_routes())
        // Grade configuration
        .nest("/grades", grade_routes())
        // Farmer registry
        .nest("/farmers", farmer_routes())
        // Manufacturer registry
        .nest("/manufacturers", manufacturer_routes())
        // Purchase ledger
        .nest("/purchases", purchase_routes())
        // Sales ledger
        .nest("/sales", sale_routes())
        // Stockpile view
        .nest("/stockpiles", stockpile_routes())
        // Weighbridge
        .route("/weighbridge/read", get(handlers::read_weight))
}

/// Season management routes
fn season_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_seasons).post(handlers::create_season))
        .route("/active", get(handlers::get_active_season))
        .route(
            "/:season_id",
            get(handlers::get_season).put(handlers::update_season),
        )
        .route("/:season_id/close", post(handlers::close_season))
        // Season-product pricing
        .route("/:season_id/prices", get(handlers::list_season_prices))
        .route(
            "/:season_id/prices/initialize",
            post(handlers::initialize_season_prices),
        )
        .route("/:season_id/prices/copy", post(handlers::copy_season_prices))
        .route(
            "/:season_id/prices/:product_id",
            get(handlers::get_product_price).put(handlers::update_product_price),
        )
        .route(
            "/:season_id/prices/:product_id/history",
            get(handlers::get_price_history),
        )
}

/// Product catalogue routes
fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_products).post(handlers::create_product))
        .route("/active", get(handlers::list_active_products))
        .route(
            "/:product_id",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::deactivate_product),
        )
}

/// Grade configuration routes
fn grade_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_grades))
        .route("/default", get(handlers::get_default_grade))
        .route("/:grade_id", get(handlers::get_grade))
}

/// Farmer registry routes
fn farmer_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_farmers).post(handlers::create_farmer))
        .route("/search", get(handlers::search_farmers))
        .route(
            "/:farmer_id",
            get(handlers::get_farmer)
                .put(handlers::update_farmer)
                .delete(handlers::deactivate_farmer),
        )
}

/// Manufacturer registry routes
fn manufacturer_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_manufacturers).post(handlers::create_manufacturer),
        )
        .route(
            "/:manufacturer_id",
            get(handlers::get_manufacturer).put(handlers::update_manufacturer),
        )
}

/// Purchase ledger routes
fn purchase_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_purchases).post(handlers::create_purchase),
        )
        .route("/cancel-lorry", post(handlers::cancel_pending_lorry))
        .route("/receipt/:receipt_number", get(handlers::get_purchase_by_receipt))
        .route("/unsold/:season_id", get(handlers::get_unsold_purchases))
        .route("/stats/:season_id", get(handlers::get_purchase_stats))
        .route("/:transaction_id", get(handlers::get_purchase))
        .route("/:transaction_id/split", post(handlers::split_purchase))
        .route("/:transaction_id/children", get(handlers::get_split_children))
        .route("/:transaction_id/change-farmer", post(handlers::change_farmer))
        .route(
            "/:transaction_id/payment",
            put(handlers::update_purchase_payment),
        )
}

/// Sales ledger routes
fn sale_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_sales).post(handlers::create_sale))
        .route("/number/:sales_number", get(handlers::get_sale_by_number))
        .route("/stats/:season_id", get(handlers::get_sale_stats))
        .route("/:sales_id", get(handlers::get_sale))
}

/// Stockpile view routes
fn stockpile_routes() -> Router<AppState> {
    Router::new()
        .route("/:season_id", get(handlers::get_stockpile_summary))
        .route("/:season_id/stats", get(handlers::get_stockpile_stats))
        .route("/:season_id/low-stock", get(handlers::get_low_stock_alerts))
        .route(
            "/:season_id/products/:product_id/movements",
            get(handlers::get_product_movements),
        )
}
