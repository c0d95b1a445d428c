//! # PromoWeb API
//!
//! HTTP server for the order / payment / shipment workflow.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Order API Services                              │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  OrderService  │  │ PaymentService │  │  ShipmentService           ││
//! │  │                │  │                │  │                            ││
//! │  │ • create       │  │ • create       │  │ • create                   ││
//! │  │ • update_status│  │ • process      │  │ • update_status            ││
//! │  │ • cancel       │  │ • refund       │  │ • add_tracking_event       ││
//! │  └────────────────┘  └───────┬────────┘  └────────────────────────────┘│
//! │                              │                                          │
//! │  ┌────────────────┐  ┌───────▼────────┐  ┌────────────────┐            │
//! │  │ CatalogService │  │ PaymentGateway │  │ShippingService │            │
//! │  │ products,stock │  │  (simulated)   │  │ zones, quotes  │            │
//! │  └────────────────┘  └────────────────┘  └────────────────┘            │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │         promoweb-db (SQLite)  +  promoweb-core (rules)           │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every operation that touches more than one row runs in one database
//! transaction; the simulated gateway wait happens between transactions.
//! Customer notifications are sent after commit.
//!
//! ## Configuration
//! See [`config`] for the `PROMOWEB_*` environment variables.

pub mod config;
pub mod error;
pub mod routes;
pub mod services;

use std::sync::Arc;

use promoweb_db::Database;

use crate::services::gateway::{PaymentGateway, SimulatedGateway};
use crate::services::notifier::{LogNotifier, Notifier};

// Re-exports
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::router;

/// Shared application state.
pub struct AppState {
    pub db: Database,
    pub config: ApiConfig,
    pub gateway: Arc<dyn PaymentGateway>,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    /// State with the simulated gateway configured from `config`.
    pub fn new(db: Database, config: ApiConfig) -> Self {
        let gateway = SimulatedGateway::new(
            config.gateway_delay(),
            config.mobile_money_success_rate,
            config.card_success_rate,
        );
        AppState {
            db,
            config,
            gateway: Arc::new(gateway),
            notifier: Arc::new(LogNotifier),
        }
    }

    /// Swaps the gateway (tests, demos).
    pub fn with_gateway(mut self, gateway: Arc<dyn PaymentGateway>) -> Self {
        self.gateway = gateway;
        self
    }

    /// Swaps the notification channel.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }
}
