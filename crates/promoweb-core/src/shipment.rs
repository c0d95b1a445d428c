//! # Shipment Tracker
//!
//! Physical fulfilment of an order as an append-only event log.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  pending → processing → shipped → in_transit → out_for_delivery         │
//! │                            ★                          │                 │
//! │                            │                          ▼                 │
//! │                            │                      delivered ★           │
//! │                            │                                            │
//! │  failed_delivery, returned: reachable from any non-delivered state      │
//! │  delivered: only accepts further `delivered` updates                    │
//! │                                                                         │
//! │  ★ one-time edges, fired the first time the status is reached:         │
//! │     shipped   → stamp shipped_at,   order → shipped (stock committed)   │
//! │     delivered → stamp delivered_at, order → delivered                   │
//! │                 (the shipped edge fires first if it never fired)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The edges are keyed on the timestamps, so repeating a status appends an
//! event but never re-stamps or re-advances the order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::types::Address;

// =============================================================================
// Enums
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    InTransit,
    OutForDelivery,
    Delivered,
    FailedDelivery,
    Returned,
}

impl ShipmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentStatus::Pending => "pending",
            ShipmentStatus::Processing => "processing",
            ShipmentStatus::Shipped => "shipped",
            ShipmentStatus::InTransit => "in_transit",
            ShipmentStatus::OutForDelivery => "out_for_delivery",
            ShipmentStatus::Delivered => "delivered",
            ShipmentStatus::FailedDelivery => "failed_delivery",
            ShipmentStatus::Returned => "returned",
        }
    }

    /// Event text used when the caller gives none.
    pub fn default_description(&self) -> &'static str {
        match self {
            ShipmentStatus::Pending => "Shipment created",
            ShipmentStatus::Processing => "Parcel being prepared at the warehouse",
            ShipmentStatus::Shipped => "Parcel handed over to the carrier",
            ShipmentStatus::InTransit => "Parcel in transit",
            ShipmentStatus::OutForDelivery => "Out for delivery",
            ShipmentStatus::Delivered => "Delivered to the customer",
            ShipmentStatus::FailedDelivery => "Delivery attempt failed",
            ShipmentStatus::Returned => "Parcel returned to sender",
        }
    }
}

impl fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ShippingMethod {
    #[default]
    Standard,
    Express,
    /// Customer collects at a relay point.
    Pickup,
}

// =============================================================================
// Shipment
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    pub id: String,
    /// `PWA` + `YYYYMMDD` + daily counter.
    pub tracking_number: String,
    pub order_id: String,
    pub status: ShipmentStatus,
    pub method: ShippingMethod,
    pub carrier: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    pub from_address: Address,
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    pub to_address: Address,
    #[ts(as = "Option<String>")]
    pub shipped_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub delivered_at: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    /// Filled by the repository, not a column.
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    #[serde(default)]
    pub tracking_events: Vec<TrackingEvent>,
}

/// Order-side work triggered by a shipment status update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShipmentEffects {
    /// Advance the order to `shipped` and commit its stock.
    pub order_shipped: bool,
    /// Advance the order to `delivered`.
    pub order_delivered: bool,
}

impl Shipment {
    /// A fresh `pending` shipment with its seed event.
    pub fn new(
        order_id: &str,
        tracking_number: String,
        method: ShippingMethod,
        carrier: Option<String>,
        from_address: Address,
        to_address: Address,
        now: DateTime<Utc>,
    ) -> Shipment {
        let id = Uuid::new_v4().to_string();
        let seed = TrackingEvent::new(
            &id,
            ShipmentStatus::Pending,
            ShipmentStatus::Pending.default_description().to_string(),
            None,
            now,
        );

        Shipment {
            id,
            tracking_number,
            order_id: order_id.to_string(),
            status: ShipmentStatus::Pending,
            method,
            carrier,
            from_address,
            to_address,
            shipped_at: None,
            delivered_at: None,
            created_at: now,
            updated_at: now,
            tracking_events: vec![seed],
        }
    }

    /// Moves the shipment to `to` and reports which order edges fired.
    ///
    /// The caller appends the tracking event; this only decides state.
    pub fn apply_status(
        &mut self,
        to: ShipmentStatus,
        now: DateTime<Utc>,
    ) -> CoreResult<ShipmentEffects> {
        if self.status == ShipmentStatus::Delivered && to != ShipmentStatus::Delivered {
            return Err(CoreError::InvalidShipmentTransition {
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }

        let mut effects = ShipmentEffects::default();

        match to {
            ShipmentStatus::Shipped if self.shipped_at.is_none() => {
                self.shipped_at = Some(now);
                effects.order_shipped = true;
            }
            ShipmentStatus::Delivered if self.delivered_at.is_none() => {
                if self.shipped_at.is_none() {
                    self.shipped_at = Some(now);
                    effects.order_shipped = true;
                }
                self.delivered_at = Some(now);
                effects.order_delivered = true;
            }
            _ => {}
        }

        self.status = to;
        self.updated_at = now;
        Ok(effects)
    }
}

// =============================================================================
// Tracking Event
// =============================================================================

/// One entry of the append-only tracking log.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TrackingEvent {
    pub id: String,
    pub shipment_id: String,
    pub status: ShipmentStatus,
    pub description: String,
    pub location: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl TrackingEvent {
    pub fn new(
        shipment_id: &str,
        status: ShipmentStatus,
        description: String,
        location: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        TrackingEvent {
            id: Uuid::new_v4().to_string(),
            shipment_id: shipment_id.to_string(),
            status,
            description,
            location,
            created_at: now,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
