//! # Shipping Module
//!
//! Weight-based shipping cost for an order.
//!
//! ## Formula
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  cost = base_rate + ceil(weight_kg) × per_kg_rate                       │
//! │                                                                         │
//! │  Example (defaults): 2 x 1.2 kg = 2.4 kg → 3 billable kg                │
//! │    2000 + 3 × 500 = 3500 XAF                                            │
//! │                                                                         │
//! │  Free shipping: subtotal >= free_shipping_threshold → cost = 0          │
//! │  Weight cap:    weight > max_weight → order refused                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The rate comes from the shipping zone matching the address region, or the
//! configured default when no zone matches.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

/// Grams per billable kilogram.
const GRAMS_PER_KG: i64 = 1_000;

// =============================================================================
// Shipping Rate
// =============================================================================

/// A rate table: flat base plus a per started kilogram charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ShippingRate {
    pub base_rate: Money,
    pub per_kg_rate: Money,
    /// Subtotal from which shipping is free.
    pub free_shipping_threshold: Option<Money>,
    /// Heaviest parcel the zone accepts.
    pub max_weight_grams: Option<i64>,
}

impl ShippingRate {
    /// A rate without free-shipping threshold or weight limit.
    pub const fn flat(base_rate: Money, per_kg_rate: Money) -> Self {
        ShippingRate {
            base_rate,
            per_kg_rate,
            free_shipping_threshold: None,
            max_weight_grams: None,
        }
    }

    /// Rejects parcels above the zone's weight limit.
    pub fn check_weight(&self, zone: &str, weight_grams: i64) -> CoreResult<()> {
        match self.max_weight_grams {
            Some(max) if weight_grams > max => Err(CoreError::WeightLimitExceeded {
                zone: zone.to_string(),
                weight_grams,
                max_grams: max,
            }),
            _ => Ok(()),
        }
    }

    /// Computes the shipping cost for a parcel.
    ///
    /// ## Example
    /// ```rust
    /// use promoweb_core::{Money, ShippingRate};
    ///
    /// let rate = ShippingRate::flat(Money::from_xaf(2_000), Money::from_xaf(500));
    /// let quote = rate.quote(2_400, Money::from_xaf(10_000));
    ///
    /// assert_eq!(quote.billable_kg, 3);
    /// assert_eq!(quote.cost.xaf(), 3_500);
    /// ```
    pub fn quote(&self, weight_grams: i64, subtotal: Money) -> ShippingQuote {
        let billable_kg = billable_kg(weight_grams);
        // Saturates so an operator-configured rate can never wrap the charge
        let weight_charge =
            Money::from_xaf(self.per_kg_rate.xaf().saturating_mul(billable_kg));

        let free_shipping = self
            .free_shipping_threshold
            .is_some_and(|threshold| subtotal >= threshold);

        let cost = if free_shipping {
            Money::zero()
        } else {
            Money::from_xaf(self.base_rate.xaf().saturating_add(weight_charge.xaf()))
        };

        ShippingQuote {
            weight_grams,
            billable_kg,
            base_rate: self.base_rate,
            weight_charge,
            free_shipping,
            cost,
        }
    }
}

/// Kilograms charged for a weight: every started kilogram counts.
pub fn billable_kg(weight_grams: i64) -> i64 {
    if weight_grams <= 0 {
        return 0;
    }
    weight_grams / GRAMS_PER_KG + i64::from(weight_grams % GRAMS_PER_KG != 0)
}

// =============================================================================
// Shipping Quote
// =============================================================================

/// Breakdown of a computed shipping cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ShippingQuote {
    pub weight_grams: i64,
    pub billable_kg: i64,
    pub base_rate: Money,
    pub weight_charge: Money,
    pub free_shipping: bool,
    /// What the customer pays for shipping.
    pub cost: Money,
}

// =============================================================================
// Unit Tests
// =============================================================================
