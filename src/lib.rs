//! SwiftCart API Library
//!
//! Backend for the SwiftCart storefront and seller dashboard: a
//! multi-tenant product catalog with option-axis variants, a pure
//! variant resolver, and a checkout that enforces pricing and stock
//! integrity server-side.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod services;

use axum::{routing::get, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

/// Builds the `/api/v1` route tree
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .nest(
            "/products",
            handlers::products::products_routes()
                .merge(handlers::reviews::product_reviews_routes()),
        )
        .nest("/checkout", handlers::checkout::checkout_routes())
        .nest(
            "/stores",
            handlers::stores::stores_routes().merge(handlers::orders::store_orders_routes()),
        )
        .nest("/categories", handlers::categories::categories_routes())
        .nest("/options", handlers::categories::options_routes())
        .nest("/orders", handlers::orders::orders_routes())
        .nest("/reviews", handlers::reviews::reviews_routes())
        .route("/health", get(handlers::health::health))
}
