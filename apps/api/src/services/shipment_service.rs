//! # Shipment Service
//!
//! Creates shipments for confirmed orders and drives their tracking log.
//! Order-side effects run inside the same transaction as the shipment write.
//!
//! ```text
//! create          order confirmed ──► processing         + seed `pending` event
//! update_status   shipment shipped   (first time) ──► order shipped   (stock committed)
//!                 shipment delivered (first time) ──► order delivered
//! add_event       event only, status unchanged
//! ```

use std::sync::Arc;

use chrono::Utc;
use promoweb_core::numbering::Sequence;
use promoweb_core::validation::validate_address;
use promoweb_core::{
    Address, CoreError, OrderStatus, Shipment, ShipmentStatus, ShippingMethod, TrackingEvent,
};
use promoweb_db::repository::{sequence, shipment};
use serde::Deserialize;
use sqlx::SqliteConnection;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::services::notifier::Notification;
use crate::services::order_service::{lock_order, transition_order};
use crate::AppState;

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShipmentRequest {
    pub order_id: String,
    #[serde(default)]
    pub method: ShippingMethod,
    pub carrier: Option<String>,
    pub from_address: Option<Address>,
    pub to_address: Option<Address>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateShipmentStatusRequest {
    pub status: ShipmentStatus,
    pub description: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingEventRequest {
    pub description: String,
    pub location: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

async fn lock_shipment(conn: &mut SqliteConnection, shipment_id: &str) -> ApiResult<Shipment> {
    if !shipment::lock(conn, shipment_id).await? {
        return Err(CoreError::ShipmentNotFound(shipment_id.to_string()).into());
    }
    shipment::find_by_id(conn, shipment_id)
        .await?
        .ok_or_else(|| CoreError::ShipmentNotFound(shipment_id.to_string()).into())
}

// =============================================================================
// Service
// =============================================================================

pub struct ShipmentService {
    state: Arc<AppState>,
}

impl ShipmentService {
    pub fn new(state: Arc<AppState>) -> Self {
        ShipmentService { state }
    }

    /// Opens a shipment for a confirmed order and moves the order to `processing`.
    pub async fn create(&self, req: CreateShipmentRequest) -> ApiResult<Shipment> {
        if let Some(from) = &req.from_address {
            validate_address(from)?;
        }
        if let Some(to) = &req.to_address {
            validate_address(to)?;
        }

        let now = Utc::now();
        let mut tx = self.state.db.begin().await?;
        let tracking_number = sequence::next_number(&mut tx, Sequence::Tracking, now).await?;

        let mut target = lock_order(&mut tx, &req.order_id).await?;
        if target.status != OrderStatus::Confirmed {
            return Err(CoreError::ShipmentRequiresConfirmedOrder {
                order_number: target.order_number.clone(),
                status: target.status.to_string(),
            }
            .into());
        }

        let created = Shipment::new(
            &target.id,
            tracking_number,
            req.method,
            non_blank(req.carrier),
            req.from_address
                .unwrap_or_else(|| self.state.config.warehouse_address.clone()),
            req.to_address
                .unwrap_or_else(|| target.shipping_address.clone()),
            now,
        );
        shipment::insert(&mut tx, &created).await?;

        transition_order(
            &mut tx,
            &mut target,
            OrderStatus::Processing,
            Some(format!("Shipment {} created", created.tracking_number)),
            now,
        )
        .await?;

        tx.commit().await?;

        info!(
            tracking_number = %created.tracking_number,
            order_number = %target.order_number,
            "Shipment created"
        );
        Ok(created)
    }

    /// Records a status change and fires the one-time order edges.
    pub async fn update_status(
        &self,
        shipment_id: &str,
        req: UpdateShipmentStatusRequest,
    ) -> ApiResult<Shipment> {
        let now = Utc::now();
        let mut tx = self.state.db.begin().await?;

        let mut current = lock_shipment(&mut tx, shipment_id).await?;
        let from = current.status;
        let effects = current.apply_status(req.status, now)?;
        shipment::update_state(&mut tx, &current).await?;

        let description = non_blank(req.description)
            .unwrap_or_else(|| req.status.default_description().to_string());
        let event = TrackingEvent::new(
            &current.id,
            req.status,
            description,
            non_blank(req.location),
            now,
        );
        shipment::insert_event(&mut tx, &event).await?;
        current.tracking_events.push(event);

        let mut shipped_order = None;
        if effects.order_shipped || effects.order_delivered {
            let mut target = lock_order(&mut tx, &current.order_id).await?;
            let note = Some(format!("Shipment {} {}", current.tracking_number, req.status));

            // A sibling shipment may already have moved the order along
            if effects.order_shipped
                && !matches!(target.status, OrderStatus::Shipped | OrderStatus::Delivered)
            {
                transition_order(&mut tx, &mut target, OrderStatus::Shipped, note.clone(), now)
                    .await?;
                shipped_order = Some(target.clone());
            }
            if effects.order_delivered && target.status != OrderStatus::Delivered {
                transition_order(&mut tx, &mut target, OrderStatus::Delivered, note, now).await?;
            }
        }

        tx.commit().await?;

        info!(
            tracking_number = %current.tracking_number,
            from = %from,
            to = %current.status,
            "Shipment status changed"
        );
        if let Some(shipped) = shipped_order {
            self.state
                .notifier
                .notify(Notification::order_shipped(&shipped, &current))
                .await;
        }
        Ok(current)
    }

    /// Appends a free-form event carrying the current status.
    pub async fn add_tracking_event(
        &self,
        shipment_id: &str,
        req: TrackingEventRequest,
    ) -> ApiResult<Shipment> {
        let description = non_blank(Some(req.description))
            .ok_or_else(|| ApiError::validation("description is required"))?;

        let now = Utc::now();
        let mut tx = self.state.db.begin().await?;

        let mut current = lock_shipment(&mut tx, shipment_id).await?;
        let event = TrackingEvent::new(
            &current.id,
            current.status,
            description,
            non_blank(req.location),
            now,
        );
        shipment::insert_event(&mut tx, &event).await?;
        current.tracking_events.push(event);

        tx.commit().await?;
        Ok(current)
    }

    pub async fn get(&self, shipment_id: &str) -> ApiResult<Shipment> {
        self.state
            .db
            .shipments()
            .get_by_id(shipment_id)
            .await?
            .ok_or_else(|| CoreError::ShipmentNotFound(shipment_id.to_string()).into())
    }

    /// Public lookup by tracking number.
    pub async fn track(&self, tracking_number: &str) -> ApiResult<Shipment> {
        self.state
            .db
            .shipments()
            .track(tracking_number)
            .await?
            .ok_or_else(|| CoreError::ShipmentNotFound(tracking_number.to_string()).into())
    }
}
