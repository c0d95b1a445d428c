//! Workflow services.
//!
//! Each service owns one aggregate's operations and receives the shared
//! [`AppState`](crate::AppState). Handlers in [`crate::routes`] are thin
//! wrappers around these.

pub mod catalog_service;
pub mod gateway;
pub mod health_service;
pub mod notifier;
pub mod order_service;
pub mod payment_service;
pub mod shipment_service;
pub mod shipping_service;
