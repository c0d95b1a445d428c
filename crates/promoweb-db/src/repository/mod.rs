//! # Repository Module
//!
//! SQL for every table of the order workflow.
//!
//! ## Two Access Styles
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Read-only lookups              Workflow writes                         │
//! │                                                                         │
//! │  db.orders().get_details(id)    let mut tx = db.begin().await?;         │
//! │       │                         sequence::next_number(&mut tx, ..)      │
//! │       │  acquires a pooled      inventory::reserve_stock(&mut tx, ..)   │
//! │       │  connection             order::insert(&mut tx, ..)              │
//! │       ▼                         tx.commit().await?;                     │
//! │  XxxRepository { pool }                                                 │
//! │                                 free functions taking                   │
//! │                                 &mut SqliteConnection                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The repository structs wrap the free functions for one-shot reads; the
//! services compose the free functions inside a single transaction.
//!
//! ## Available Repositories
//!
//! - [`inventory`] - Stock reservation ledger (functions only)
//! - [`sequence`] - Daily counters for human-readable numbers (functions only)
//! - [`product::ProductRepository`] - Catalogue
//! - [`order::OrderRepository`] - Orders, items, status history
//! - [`payment::PaymentRepository`] - Payments and refunds
//! - [`shipment::ShipmentRepository`] - Shipments and tracking events
//! - [`shipping_zone::ShippingZoneRepository`] - Region rate tables

pub mod inventory;
pub mod order;
pub mod payment;
pub mod product;
pub mod sequence;
pub mod shipment;
pub mod shipping_zone;
