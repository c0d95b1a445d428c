//! # Order Service
//!
//! Checkout and the order lifecycle.
//!
//! ## Checkout Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validate customer, address, lines          (no database work yet)      │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    order number  ← sequence bump            takes the writer lock       │
//! │    for each line:                                                       │
//! │      load product → snapshot item                                       │
//! │      reserve_stock ── false ──► InsufficientStock, ROLLBACK             │
//! │    resolve zone → totals → deposit split                                │
//! │    insert order, items, history row                                     │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failed checkout leaves nothing behind: no order, no reservation, no
//! consumed order number.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use promoweb_core::numbering::Sequence;
use promoweb_core::order::normalize_lines;
use promoweb_core::validation::{
    validate_address, validate_customer_name, validate_email, validate_phone,
};
use promoweb_core::{
    Address, CoreError, Customer, InventoryEffect, Order, OrderDetails, OrderItem, OrderLine,
    OrderPaymentStatus, OrderStatus, OrderStatusChange, OrderTotals,
};
use promoweb_db::repository::{inventory, order, product, sequence};
use promoweb_db::OrderFilter;
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::services::notifier::Notification;
use crate::services::shipping_service::resolve_rate;
use crate::AppState;

/// Largest page the order listing returns.
const MAX_PAGE_SIZE: u32 = 100;

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub shipping_address: Address,
    pub notes: Option<String>,
    pub items: Vec<OrderLine>,
    pub deposit_percentage: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePaymentStatusRequest {
    pub payment_status: OrderPaymentStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelOrderRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListOrdersQuery {
    pub status: Option<OrderStatus>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPage {
    pub orders: Vec<Order>,
    pub total: i64,
    pub limit: u32,
    pub offset: u32,
}

// =============================================================================
// Transition helper (shared with the shipment service)
// =============================================================================

/// Moves a locked order to `to` inside the caller's transaction.
///
/// Applies the transition table, performs the inventory effect on every
/// line, persists the lifecycle fields and appends the history row.
pub(crate) async fn transition_order(
    conn: &mut SqliteConnection,
    current: &mut Order,
    to: OrderStatus,
    note: Option<String>,
    now: DateTime<Utc>,
) -> ApiResult<()> {
    let from = current.status;
    let effect = current.apply_transition(to, now)?;
    persist_transition(conn, current, from, effect, note, now).await
}

async fn persist_transition(
    conn: &mut SqliteConnection,
    current: &Order,
    from: OrderStatus,
    effect: InventoryEffect,
    note: Option<String>,
    now: DateTime<Utc>,
) -> ApiResult<()> {
    apply_inventory_effect(conn, &current.id, effect).await?;
    order::update_lifecycle(conn, current).await?;

    let change = OrderStatusChange::new(&current.id, Some(from), current.status, note, now);
    order::insert_status_change(conn, &change).await?;

    info!(
        order_number = %current.order_number,
        from = %from,
        to = %current.status,
        "Order status changed"
    );
    Ok(())
}

async fn apply_inventory_effect(
    conn: &mut SqliteConnection,
    order_id: &str,
    effect: InventoryEffect,
) -> ApiResult<()> {
    if effect == InventoryEffect::None {
        return Ok(());
    }

    let items = order::items(conn, order_id).await?;
    for item in &items {
        match effect {
            InventoryEffect::Release => {
                inventory::release_stock(conn, &item.product_id, item.quantity).await?
            }
            InventoryEffect::Commit => {
                inventory::commit_shipment(conn, &item.product_id, item.quantity).await?
            }
            InventoryEffect::None => {}
        }
    }
    Ok(())
}

/// Takes the writer lock on an order and loads it.
pub(crate) async fn lock_order(conn: &mut SqliteConnection, order_id: &str) -> ApiResult<Order> {
    if !order::lock(conn, order_id).await? {
        return Err(CoreError::OrderNotFound(order_id.to_string()).into());
    }
    order::find_by_id(conn, order_id)
        .await?
        .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()).into())
}

// =============================================================================
// Service
// =============================================================================

/// Order workflow operations.
pub struct OrderService {
    state: Arc<AppState>,
}

impl OrderService {
    pub fn new(state: Arc<AppState>) -> Self {
        OrderService { state }
    }

    /// Places an order: snapshots, reservations and totals in one transaction.
    pub async fn create(&self, req: CreateOrderRequest) -> ApiResult<OrderDetails> {
        validate_customer_name(&req.customer_name)?;
        validate_email(&req.customer_email)?;
        validate_phone(&req.customer_phone)?;
        validate_address(&req.shipping_address)?;
        let lines = normalize_lines(&req.items)?;
        let deposit_percentage = req
            .deposit_percentage
            .unwrap_or(self.state.config.default_deposit_percentage);

        let now = Utc::now();
        let order_id = Uuid::new_v4().to_string();

        let mut tx = self.state.db.begin().await?;
        let order_number = sequence::next_number(&mut tx, Sequence::Order, now).await?;

        let mut items: Vec<OrderItem> = Vec::with_capacity(lines.len());
        for line in &lines {
            // An unknown product in the cart is bad input, not a missing resource
            let found = product::find_by_id(&mut tx, &line.product_id)
                .await?
                .ok_or_else(|| {
                    ApiError::validation(CoreError::ProductNotFound(line.product_id.clone()).to_string())
                })?;

            let item = OrderItem::snapshot(&order_id, &found, line.quantity, now)?;

            if !inventory::reserve_stock(&mut tx, &found.id, line.quantity).await? {
                warn!(
                    sku = %found.sku,
                    available = found.available_quantity(),
                    requested = line.quantity,
                    "Checkout refused, insufficient stock"
                );
                return Err(CoreError::InsufficientStock {
                    sku: found.sku.clone(),
                    available: found.available_quantity(),
                    requested: line.quantity,
                }
                .into());
            }
            items.push(item);
        }

        let resolved = resolve_rate(
            &mut tx,
            &self.state.config,
            req.shipping_address.zone_key(),
        )
        .await?;
        let totals = OrderTotals::compute(&items, &resolved.rate, deposit_percentage)?;
        resolved
            .rate
            .check_weight(resolved.label(), totals.total_weight_grams)?;

        let customer = Customer {
            name: req.customer_name.trim().to_string(),
            email: req.customer_email.trim().to_lowercase(),
            phone: req.customer_phone.trim().to_string(),
        };
        let placed = Order::new(
            order_id,
            order_number,
            customer,
            req.shipping_address,
            req.notes.filter(|n| !n.trim().is_empty()),
            &totals,
            now,
        );

        order::insert(&mut tx, &placed).await?;
        for item in &items {
            order::insert_item(&mut tx, item).await?;
        }
        let created = OrderStatusChange::new(
            &placed.id,
            None,
            OrderStatus::Pending,
            Some("Order placed".to_string()),
            now,
        );
        order::insert_status_change(&mut tx, &created).await?;

        tx.commit().await?;

        info!(
            order_number = %placed.order_number,
            total_xaf = placed.total_xaf,
            deposit_xaf = placed.deposit_amount_xaf,
            lines = items.len(),
            zone = resolved.label(),
            "Order created"
        );
        self.state
            .notifier
            .notify(Notification::order_placed(&placed))
            .await;

        Ok(OrderDetails {
            order: placed,
            items,
            payments: Vec::new(),
            shipments: Vec::new(),
            status_history: vec![created],
        })
    }

    pub async fn get(&self, order_id: &str) -> ApiResult<OrderDetails> {
        self.state
            .db
            .orders()
            .get_details(order_id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()).into())
    }

    pub async fn get_by_number(&self, order_number: &str) -> ApiResult<OrderDetails> {
        self.state
            .db
            .orders()
            .get_details_by_number(order_number)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_number.to_string()).into())
    }

    /// Newest first, optionally filtered by status.
    pub async fn list(&self, query: ListOrdersQuery) -> ApiResult<OrderPage> {
        let filter = OrderFilter {
            status: query.status,
            limit: query.limit.unwrap_or(20).clamp(1, MAX_PAGE_SIZE),
            offset: query.offset.unwrap_or(0),
        };

        let repo = self.state.db.orders();
        let orders = repo.list(filter).await?;
        let total = repo.count(filter.status).await?;

        Ok(OrderPage {
            orders,
            total,
            limit: filter.limit,
            offset: filter.offset,
        })
    }

    /// Admin status change, validated against the transition table.
    pub async fn update_status(&self, order_id: &str, req: UpdateStatusRequest) -> ApiResult<Order> {
        let now = Utc::now();
        let mut tx = self.state.db.begin().await?;

        let mut current = lock_order(&mut tx, order_id).await?;
        transition_order(&mut tx, &mut current, req.status, req.note, now).await?;

        tx.commit().await?;
        Ok(current)
    }

    /// Admin override of the payment status. Not validated.
    pub async fn update_payment_status(
        &self,
        order_id: &str,
        req: UpdatePaymentStatusRequest,
    ) -> ApiResult<Order> {
        let mut tx = self.state.db.begin().await?;

        if !order::update_payment_status(&mut tx, order_id, req.payment_status, Utc::now()).await? {
            return Err(CoreError::OrderNotFound(order_id.to_string()).into());
        }
        let updated = order::find_by_id(&mut tx, order_id)
            .await?
            .ok_or_else(|| ApiError::from(CoreError::OrderNotFound(order_id.to_string())))?;

        tx.commit().await?;

        info!(
            order_number = %updated.order_number,
            payment_status = %updated.payment_status,
            "Payment status overridden"
        );
        Ok(updated)
    }

    /// Customer cancellation from `pending | confirmed`; releases every reservation.
    pub async fn cancel(&self, order_id: &str, req: CancelOrderRequest) -> ApiResult<Order> {
        let now = Utc::now();
        let reason = req.reason.filter(|r| !r.trim().is_empty());
        let mut tx = self.state.db.begin().await?;

        let mut current = lock_order(&mut tx, order_id).await?;
        let from = current.status;
        let effect = current.cancel(reason.clone(), now).map_err(|e| {
            warn!(order_number = %current.order_number, status = %from, "Cancellation refused");
            e
        })?;
        persist_transition(&mut tx, &current, from, effect, reason, now).await?;

        tx.commit().await?;
        Ok(current)
    }
}
