//! # Domain Types
//!
//! Catalogue and geography types shared by the order workflow.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────────────┐  ┌─────────────────┐  ┌───────────────────┐   │
//! │  │      Product         │  │    Address      │  │   ShippingZone    │   │
//! │  │  ──────────────────  │  │  ─────────────  │  │  ───────────────  │   │
//! │  │  id (UUID)           │  │  street_address │  │  code (region)    │   │
//! │  │  sku (business)      │  │  city           │  │  base_rate_xaf    │   │
//! │  │  price_xaf           │  │  region ────────┼──┼► per_kg_rate_xaf  │   │
//! │  │  stock_quantity      │  │  country (CM)   │  │  free threshold   │   │
//! │  │  reserved_quantity   │  └─────────────────┘  │  max weight       │   │
//! │  └──────────────────────┘                       └───────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (sku, zone code) - human-readable

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;
use crate::shipping::ShippingRate;

// =============================================================================
// Product Status
// =============================================================================

/// Catalogue status of a product. Only `active` products can be ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    #[default]
    Active,
    Inactive,
    Discontinued,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Active => "active",
            ProductStatus::Inactive => "inactive",
            ProductStatus::Discontinued => "discontinued",
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Product
// =============================================================================

/// A catalogue product together with its inventory ledger row.
///
/// ## Ledger Invariant
/// `0 <= reserved_quantity <= stock_quantity` at every commit point.
/// `reserved_quantity` is stock earmarked for orders that have not shipped.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    /// Display name shown in the storefront.
    pub name: String,

    pub brand: Option<String>,

    pub image_url: Option<String>,

    /// Unit price in XAF.
    pub price_xaf: i64,

    /// Shipping weight of one unit in grams.
    pub weight_grams: i64,

    /// Units physically on hand.
    pub stock_quantity: i64,

    /// Units earmarked for unshipped orders.
    pub reserved_quantity: i64,

    pub status: ProductStatus,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_xaf(self.price_xaf)
    }

    /// Units that can still be reserved.
    #[inline]
    pub fn available_quantity(&self) -> i64 {
        self.stock_quantity - self.reserved_quantity
    }

    /// Checks if the product can be ordered in the given quantity right now.
    ///
    /// This is a read-side hint only; the ledger's conditional UPDATE is the
    /// authority when reserving.
    pub fn can_reserve(&self, quantity: i64) -> bool {
        self.status == ProductStatus::Active && self.available_quantity() >= quantity
    }
}

// =============================================================================
// Address
// =============================================================================

/// A postal address, stored as a JSON column on orders and shipments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street_address: String,
    pub city: String,
    /// Administrative region, keys the shipping zone ("Littoral", "Centre").
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    /// ISO 3166-1 alpha-2 country code.
    #[serde(default = "default_country")]
    pub country: String,
}

fn default_country() -> String {
    "CM".to_string()
}

impl Address {
    /// Region used for zone lookup, falling back to the city.
    pub fn zone_key(&self) -> &str {
        self.region
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or(&self.city)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.street_address, self.city)?;
        if let Some(region) = &self.region {
            write!(f, ", {}", region)?;
        }
        write!(f, ", {}", self.country)
    }
}

// =============================================================================
// Shipping Zone
// =============================================================================

/// A region-keyed shipping rate table row.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ShippingZone {
    pub id: String,
    /// Region code matched against `Address::zone_key` (case-insensitive).
    pub code: String,
    pub name: String,
    pub base_rate_xaf: i64,
    pub per_kg_rate_xaf: i64,
    pub free_shipping_threshold_xaf: Option<i64>,
    pub max_weight_grams: Option<i64>,
    pub min_delivery_days: i64,
    pub max_delivery_days: i64,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl ShippingZone {
    /// The zone's rate table as a pure value.
    pub fn rate(&self) -> ShippingRate {
        ShippingRate {
            base_rate: Money::from_xaf(self.base_rate_xaf),
            per_kg_rate: Money::from_xaf(self.per_kg_rate_xaf),
            free_shipping_threshold: self.free_shipping_threshold_xaf.map(Money::from_xaf),
            max_weight_grams: self.max_weight_grams,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
