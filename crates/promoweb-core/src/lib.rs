//! # promoweb-core: Pure Business Rules for the PromoWeb Order Workflow
//!
//! This crate holds every rule of the order/payment/shipment workflow as pure
//! functions with zero I/O dependencies. The database layer and the HTTP
//! service call into it; nothing here touches a connection.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     PromoWeb Order Workflow                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 apps/api (axum handlers + services)             │   │
//! │  │   POST /orders ──► PATCH /orders/{id}/cancel ──► POST /payments │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ promoweb-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌──────────┐ │   │
//! │  │  │  money  │ │  order  │ │ payment │ │ shipment │ │ shipping │ │   │
//! │  │  │  XAF    │ │ totals  │ │ derive  │ │  edges   │ │  rates   │ │   │
//! │  │  └─────────┘ └─────────┘ └─────────┘ └──────────┘ └──────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  promoweb-db (SQLite via sqlx)                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - XAF money type with integer arithmetic
//! - [`types`] - Products, addresses, shipping zones
//! - [`order`] - Order aggregate: snapshots, totals, status lifecycle
//! - [`payment`] - Payment records, amount checks, payment status derivation
//! - [`shipment`] - Shipment lifecycle and its one-time order edges
//! - [`shipping`] - Region rate tables and shipping cost
//! - [`numbering`] - Human-readable order, transaction and tracking numbers
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use promoweb_core::money::Money;
//!
//! let total = Money::from_xaf(12_500);
//! let deposit = total.percentage(30);
//!
//! assert_eq!(deposit.xaf(), 3_750);
//! assert_eq!((total - deposit).xaf(), 8_750);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod numbering;
pub mod order;
pub mod payment;
pub mod shipment;
pub mod shipping;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::Money;
pub use order::{
    Customer, InventoryEffect, Order, OrderDetails, OrderItem, OrderLine, OrderPaymentStatus,
    OrderStatus, OrderStatusChange, OrderTotals,
};
pub use payment::{Payment, PaymentMetadata, PaymentMethod, PaymentStatus, PaymentType};
pub use shipment::{Shipment, ShipmentEffects, ShipmentStatus, ShippingMethod, TrackingEvent};
pub use shipping::{ShippingQuote, ShippingRate};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Settlement currency of every monetary field.
pub const SETTLEMENT_CURRENCY: &str = "XAF";

/// Deposit percentage applied when checkout does not specify one.
pub const DEFAULT_DEPOSIT_PERCENTAGE: i64 = 30;

/// Maximum number of distinct lines in one order.
pub const MAX_ORDER_LINES: usize = 100;

/// Maximum quantity of a single line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Highest unit price the catalogue accepts (one billion XAF).
///
/// Together with `MAX_ITEM_QUANTITY` and `MAX_ORDER_LINES` this keeps every
/// order total far inside `i64`.
pub const MAX_PRICE_XAF: i64 = 1_000_000_000;

/// Heaviest single catalogue item, in grams (one tonne).
pub const MAX_WEIGHT_GRAMS: i64 = 1_000_000;

/// Heaviest parcel a shipping estimate is computed for, in grams.
pub const MAX_PARCEL_WEIGHT_GRAMS: i64 = MAX_WEIGHT_GRAMS * MAX_ITEM_QUANTITY * MAX_ORDER_LINES as i64;
