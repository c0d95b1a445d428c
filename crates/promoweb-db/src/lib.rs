//! # promoweb-db: Database Layer for the PromoWeb Order Workflow
//!
//! SQLite storage through sqlx: pool, embedded migrations and the
//! repositories the workflow services compose into transactions.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     PromoWeb Order Data Flow                            │
//! │                                                                         │
//! │  axum handler (POST /api/v1/orders)                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  OrderService::create ── pure rules from promoweb-core                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  promoweb-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐   │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │   │   │
//! │  │   │               │    │ inventory     │    │              │   │   │
//! │  │   │ SqlitePool    │◄───│ order         │    │ 001_initial  │   │   │
//! │  │   │ begin() → tx  │    │ payment       │    │   _schema    │   │   │
//! │  │   │               │    │ shipment ...  │    │              │   │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (WAL) ./data/promoweb.db                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Ledger, orders, payments, shipments, zones, sequences
//!
//! ## Usage
//!
//! ```rust,ignore
//! use promoweb_db::{Database, DbConfig};
//! use promoweb_db::repository::inventory;
//!
//! let db = Database::new(DbConfig::new("./data/promoweb.db")).await?;
//!
//! let mut tx = db.begin().await?;
//! if !inventory::reserve_stock(&mut tx, &product_id, 2).await? {
//!     // not enough stock, dropping tx rolls back
//! }
//! tx.commit().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::order::{OrderFilter, OrderRepository};
pub use repository::payment::PaymentRepository;
pub use repository::product::ProductRepository;
pub use repository::shipment::ShipmentRepository;
pub use repository::shipping_zone::ShippingZoneRepository;
