//! # HTTP Routes
//!
//! Thin axum handlers over the workflow services, mounted under `/api/v1`.
//!
//! ```text
//! /api/v1
//! ├── /health
//! ├── /products            POST, GET
//! │   ├── /{id}            GET
//! │   └── /{id}/restock    POST
//! ├── /shipping
//! │   ├── /zones           GET
//! │   └── /estimate        POST
//! ├── /orders              POST, GET
//! │   ├── /{id}            GET
//! │   ├── /number/{number} GET
//! │   ├── /{id}/status           PATCH
//! │   ├── /{id}/payment-status   PATCH
//! │   └── /{id}/cancel           PATCH
//! ├── /payments            POST
//! │   ├── /mobile-money    POST
//! │   ├── /card            POST
//! │   ├── /cash-on-delivery POST
//! │   ├── /{id}            GET
//! │   ├── /{id}/collect    POST
//! │   └── /{id}/refund     POST
//! └── /shipments           POST
//!     ├── /{id}                  GET
//!     ├── /{id}/status           PATCH
//!     ├── /{id}/tracking-event   POST
//!     └── /track/{tracking}      GET
//! ```

pub mod health;
pub mod orders;
pub mod payments;
pub mod products;
pub mod shipments;
pub mod shipping;

use std::sync::Arc;

use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::AppState;

/// Prefix of every route.
pub const API_PREFIX: &str = "/api/v1";

/// Builds the full router with request tracing.
pub fn router(state: Arc<AppState>) -> Router {
    let products = Router::new()
        .route("/", post(products::create).get(products::list))
        .route("/{id}", get(products::get))
        .route("/{id}/restock", post(products::restock));

    let shipping = Router::new()
        .route("/zones", get(shipping::zones))
        .route("/estimate", post(shipping::estimate));

    let orders = Router::new()
        .route("/", post(orders::create).get(orders::list))
        .route("/{id}", get(orders::get))
        .route("/number/{order_number}", get(orders::get_by_number))
        .route("/{id}/status", patch(orders::update_status))
        .route("/{id}/payment-status", patch(orders::update_payment_status))
        .route("/{id}/cancel", patch(orders::cancel));

    let payments = Router::new()
        .route("/", post(payments::create))
        .route("/mobile-money", post(payments::mobile_money))
        .route("/card", post(payments::card))
        .route("/cash-on-delivery", post(payments::cash_on_delivery))
        .route("/{id}", get(payments::get))
        .route("/{id}/collect", post(payments::collect))
        .route("/{id}/refund", post(payments::refund));

    let shipments = Router::new()
        .route("/", post(shipments::create))
        .route("/{id}", get(shipments::get))
        .route("/{id}/status", patch(shipments::update_status))
        .route("/{id}/tracking-event", post(shipments::add_tracking_event))
        .route("/track/{tracking_number}", get(shipments::track));

    let api = Router::new()
        .route("/health", get(health::health_check))
        .nest("/products", products)
        .nest("/shipping", shipping)
        .nest("/orders", orders)
        .nest("/payments", payments)
        .nest("/shipments", shipments);

    Router::new()
        .nest(API_PREFIX, api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
