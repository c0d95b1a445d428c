//! # Order Aggregate
//!
//! Line-item snapshots, totals, the deposit split and the order lifecycle.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Order Status Transitions                         │
//! │                                                                         │
//! │   pending ──► confirmed ──► processing ──► shipped ──► delivered        │
//! │      │            │              │                         │            │
//! │      │            │              │ (admin only)            │            │
//! │      ▼            ▼              ▼                         ▼            │
//! │   ┌──────────────────────────────────┐              ┌────────────┐      │
//! │   │            cancelled             │─────────────►│  refunded  │      │
//! │   └──────────────────────────────────┘              └────────────┘      │
//! │                                                                         │
//! │   Inventory side effects:                                               │
//! │     → cancelled : release every line's reservation                      │
//! │     → shipped   : commit (stock -= qty, reserved -= qty)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Financial Identities
//! - `subtotal = Σ unit_price × quantity`
//! - `total = subtotal + shipping_cost`
//! - `deposit = round_half_up(total × pct / 100)`, `remaining = total - deposit`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::payment::Payment;
use crate::shipment::Shipment;
use crate::shipping::ShippingRate;
use crate::types::{Address, Product, ProductStatus};
use crate::validation::{
    validate_deposit_percentage, validate_price_xaf, validate_quantity, validate_weight_grams,
};
use crate::MAX_ORDER_LINES;

// =============================================================================
// Order Status
// =============================================================================

/// Fulfilment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        }
    }

    /// Statuses reachable in one step.
    pub fn next_statuses(&self) -> &'static [OrderStatus] {
        use OrderStatus::*;
        match self {
            Pending => &[Confirmed, Cancelled],
            Confirmed => &[Processing, Cancelled],
            Processing => &[Shipped, Cancelled],
            Shipped => &[Delivered],
            Delivered | Cancelled => &[Refunded],
            Refunded => &[],
        }
    }

    #[inline]
    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        self.next_statuses().contains(&to)
    }

    /// Customers may cancel only before fulfilment starts.
    #[inline]
    pub fn is_customer_cancellable(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Confirmed)
    }

    /// Cancelled and refunded orders accept no new payments.
    #[inline]
    pub fn accepts_payments(&self) -> bool {
        !matches!(self, OrderStatus::Cancelled | OrderStatus::Refunded)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Order Payment Status
// =============================================================================

/// How much of the order has been paid, derived from completed payments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderPaymentStatus {
    #[default]
    Pending,
    DepositPaid,
    FullyPaid,
    Refunded,
}

impl OrderPaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderPaymentStatus::Pending => "pending",
            OrderPaymentStatus::DepositPaid => "deposit_paid",
            OrderPaymentStatus::FullyPaid => "fully_paid",
            OrderPaymentStatus::Refunded => "refunded",
        }
    }
}

impl fmt::Display for OrderPaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Order Lines (checkout input)
// =============================================================================

/// One requested line at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: String,
    pub quantity: i64,
}

/// Validates checkout lines and merges duplicates of the same product.
///
/// First-seen order is preserved so item positions follow the cart.
///
/// ## Rules
/// - at least one line, at most `MAX_ORDER_LINES` distinct products
/// - every quantity (and every merged quantity) within `1..=MAX_ITEM_QUANTITY`
pub fn normalize_lines(lines: &[OrderLine]) -> CoreResult<Vec<OrderLine>> {
    if lines.is_empty() {
        return Err(CoreError::EmptyOrder);
    }

    let mut merged: Vec<OrderLine> = Vec::with_capacity(lines.len());
    for line in lines {
        validate_quantity(line.quantity)?;
        match merged.iter_mut().find(|l| l.product_id == line.product_id) {
            Some(existing) => existing.quantity += line.quantity,
            None => merged.push(line.clone()),
        }
    }

    if merged.len() > MAX_ORDER_LINES {
        return Err(CoreError::TooManyLines {
            max: MAX_ORDER_LINES,
        });
    }

    for line in &merged {
        validate_quantity(line.quantity)?;
    }

    Ok(merged)
}

// =============================================================================
// Order Item
// =============================================================================

/// A line of a placed order.
///
/// Uses the snapshot pattern: product name, brand, sku, image, price and
/// weight are frozen at order time. Later catalogue edits never change it.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    /// Reference only, the product may be deleted later.
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub brand: Option<String>,
    pub image_url: Option<String>,
    pub unit_price_xaf: i64,
    pub weight_grams: i64,
    pub quantity: i64,
    pub line_total_xaf: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    /// Freezes a product into an order line.
    ///
    /// Fails when the product is not `active` or its price or weight is out of
    /// bounds. Stock is checked by the ledger.
    pub fn snapshot(
        order_id: &str,
        product: &Product,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> CoreResult<OrderItem> {
        if product.status != ProductStatus::Active {
            return Err(CoreError::ProductUnavailable {
                sku: product.sku.clone(),
                status: product.status.to_string(),
            });
        }
        validate_quantity(quantity)?;
        validate_price_xaf(product.price_xaf)?;
        validate_weight_grams(product.weight_grams)?;

        Ok(OrderItem {
            id: Uuid::new_v4().to_string(),
            order_id: order_id.to_string(),
            product_id: product.id.clone(),
            sku: product.sku.clone(),
            name: product.name.clone(),
            brand: product.brand.clone(),
            image_url: product.image_url.clone(),
            unit_price_xaf: product.price_xaf,
            weight_grams: product.weight_grams,
            quantity,
            line_total_xaf: product.price().multiply_quantity(quantity).xaf(),
            created_at: now,
        })
    }

    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_xaf(self.unit_price_xaf)
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_xaf(self.line_total_xaf)
    }

    #[inline]
    pub fn line_weight_grams(&self) -> i64 {
        self.weight_grams.saturating_mul(self.quantity)
    }
}

// =============================================================================
// Order Totals
// =============================================================================

/// The financial figures of an order, computed once at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotals {
    pub subtotal: Money,
    pub shipping_cost: Money,
    pub total: Money,
    pub deposit_percentage: i64,
    pub deposit_amount: Money,
    pub remaining_amount: Money,
    pub total_weight_grams: i64,
}

impl OrderTotals {
    /// Computes totals from snapshotted items and the zone's rate.
    ///
    /// ## Example
    /// ```text
    /// 1 × 10 000 XAF, 1 kg, default rate (2000 + 500/kg)
    ///   subtotal  10 000
    ///   shipping   2 500
    ///   total     12 500
    ///   deposit    3 750  (30%)
    ///   remaining  8 750
    /// ```
    pub fn compute(
        items: &[OrderItem],
        rate: &ShippingRate,
        deposit_percentage: i64,
    ) -> CoreResult<OrderTotals> {
        let subtotal: Money = items.iter().map(OrderItem::line_total).sum();
        let total_weight_grams: i64 = items.iter().map(OrderItem::line_weight_grams).sum();
        let shipping_cost = rate.quote(total_weight_grams, subtotal).cost;

        Self::from_parts(subtotal, shipping_cost, deposit_percentage, total_weight_grams)
    }

    /// Applies the deposit split to known subtotal and shipping figures.
    pub fn from_parts(
        subtotal: Money,
        shipping_cost: Money,
        deposit_percentage: i64,
        total_weight_grams: i64,
    ) -> CoreResult<OrderTotals> {
        validate_deposit_percentage(deposit_percentage)?;

        let total = subtotal + shipping_cost;
        let deposit_amount = total.percentage(deposit_percentage);

        Ok(OrderTotals {
            subtotal,
            shipping_cost,
            total,
            deposit_percentage,
            deposit_amount,
            remaining_amount: total - deposit_amount,
            total_weight_grams,
        })
    }
}

// =============================================================================
// Inventory Effect
// =============================================================================

/// What the ledger must do for the items of an order after a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryEffect {
    None,
    /// Give reserved units back (cancellation).
    Release,
    /// Units left the warehouse (shipped).
    Commit,
}

// =============================================================================
// Order
// =============================================================================

/// Contact details captured at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// A placed order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    /// `PMW` + `YYYYMMDD` + daily counter.
    pub order_number: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    pub shipping_address: Address,
    pub notes: Option<String>,
    pub subtotal_xaf: i64,
    pub shipping_cost_xaf: i64,
    pub total_xaf: i64,
    pub deposit_percentage: i64,
    pub deposit_amount_xaf: i64,
    pub remaining_amount_xaf: i64,
    pub total_weight_grams: i64,
    pub status: OrderStatus,
    pub payment_status: OrderPaymentStatus,
    pub cancellation_reason: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub confirmed_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub shipped_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub delivered_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Order {
    /// A new `pending` order carrying the computed totals.
    ///
    /// `id` is allocated by the caller so the item snapshots can point at it
    /// before the order row exists.
    pub fn new(
        id: String,
        order_number: String,
        customer: Customer,
        shipping_address: Address,
        notes: Option<String>,
        totals: &OrderTotals,
        now: DateTime<Utc>,
    ) -> Order {
        Order {
            id,
            order_number,
            customer_name: customer.name,
            customer_email: customer.email,
            customer_phone: customer.phone,
            shipping_address,
            notes,
            subtotal_xaf: totals.subtotal.xaf(),
            shipping_cost_xaf: totals.shipping_cost.xaf(),
            total_xaf: totals.total.xaf(),
            deposit_percentage: totals.deposit_percentage,
            deposit_amount_xaf: totals.deposit_amount.xaf(),
            remaining_amount_xaf: totals.remaining_amount.xaf(),
            total_weight_grams: totals.total_weight_grams,
            status: OrderStatus::Pending,
            payment_status: OrderPaymentStatus::Pending,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
            confirmed_at: None,
            shipped_at: None,
            delivered_at: None,
            cancelled_at: None,
        }
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_xaf(self.subtotal_xaf)
    }

    #[inline]
    pub fn shipping_cost(&self) -> Money {
        Money::from_xaf(self.shipping_cost_xaf)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_xaf(self.total_xaf)
    }

    #[inline]
    pub fn deposit_amount(&self) -> Money {
        Money::from_xaf(self.deposit_amount_xaf)
    }

    #[inline]
    pub fn remaining_amount(&self) -> Money {
        Money::from_xaf(self.remaining_amount_xaf)
    }

    /// Moves the order along the transition table and stamps the timestamp
    /// belonging to the target status.
    ///
    /// Returns the inventory work the caller must perform in the same
    /// transaction.
    pub fn apply_transition(
        &mut self,
        to: OrderStatus,
        now: DateTime<Utc>,
    ) -> CoreResult<InventoryEffect> {
        if !self.status.can_transition_to(to) {
            return Err(CoreError::InvalidOrderTransition {
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }

        let effect = match to {
            OrderStatus::Confirmed => {
                self.confirmed_at = Some(now);
                InventoryEffect::None
            }
            OrderStatus::Shipped => {
                self.shipped_at.get_or_insert(now);
                InventoryEffect::Commit
            }
            OrderStatus::Delivered => {
                self.delivered_at.get_or_insert(now);
                InventoryEffect::None
            }
            OrderStatus::Cancelled => {
                self.cancelled_at = Some(now);
                InventoryEffect::Release
            }
            OrderStatus::Pending | OrderStatus::Processing | OrderStatus::Refunded => {
                InventoryEffect::None
            }
        };

        self.status = to;
        self.updated_at = now;
        Ok(effect)
    }

    /// Customer cancellation: only from `pending | confirmed`.
    ///
    /// A second cancel fails here, so reservations are never released twice.
    pub fn cancel(
        &mut self,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> CoreResult<InventoryEffect> {
        if !self.status.is_customer_cancellable() {
            return Err(CoreError::OrderNotCancellable {
                order_number: self.order_number.clone(),
                status: self.status.to_string(),
            });
        }

        let effect = self.apply_transition(OrderStatus::Cancelled, now)?;
        self.cancellation_reason = reason;
        Ok(effect)
    }
}

// =============================================================================
// Status History
// =============================================================================

/// Audit row written on every order status change.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusChange {
    pub id: String,
    pub order_id: String,
    /// `None` for the creation row.
    pub from_status: Option<OrderStatus>,
    pub to_status: OrderStatus,
    pub note: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl OrderStatusChange {
    pub fn new(
        order_id: &str,
        from_status: Option<OrderStatus>,
        to_status: OrderStatus,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        OrderStatusChange {
            id: Uuid::new_v4().to_string(),
            order_id: order_id.to_string(),
            from_status,
            to_status,
            note,
            created_at: now,
        }
    }
}

// =============================================================================
// Order Details
// =============================================================================

/// An order with everything hanging off it.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub payments: Vec<Payment>,
    pub shipments: Vec<Shipment>,
    pub status_history: Vec<OrderStatusChange>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;

    fn product(price: i64, weight: i64) -> Product {
        Product {
            id: Uuid::new_v4().to_string(),
            sku: "PHN-TEC-01".to_string(),
            name: "Tecno Spark".to_string(),
            brand: Some("Tecno".to_string()),
            image_url: None,
            price_xaf: price,
            weight_grams: weight,
            stock_quantity: 10,
            reserved_quantity: 0,
            status: ProductStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn order(status: OrderStatus) -> Order {
        let now = Utc::now();
        Order {
            id: "o-1".to_string(),
            order_number: "PMW202610190001".to_string(),
            customer_name: "Awa Ndiaye".to_string(),
            customer_email: "awa@example.cm".to_string(),
            customer_phone: "+237670000000".to_string(),
            shipping_address: Address {
                street_address: "Akwa".to_string(),
                city: "Douala".to_string(),
                region: Some("Littoral".to_string()),
                postal_code: None,
                country: "CM".to_string(),
            },
            notes: None,
            subtotal_xaf: 10_000,
            shipping_cost_xaf: 2_500,
            total_xaf: 12_500,
            deposit_percentage: 30,
            deposit_amount_xaf: 3_750,
            remaining_amount_xaf: 8_750,
            total_weight_grams: 1_000,
            status,
            payment_status: OrderPaymentStatus::Pending,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
            confirmed_at: None,
            shipped_at: None,
            delivered_at: None,
            cancelled_at: None,
        }
    }

    fn default_rate() -> ShippingRate {
        ShippingRate::flat(Money::from_xaf(2_000), Money::from_xaf(500))
    }

    #[test]
    fn test_reference_scenario_totals() {
        let item = OrderItem::snapshot("o-1", &product(10_000, 1_000), 1, Utc::now()).unwrap();
        let totals = OrderTotals::compute(&[item], &default_rate(), 30).unwrap();

        assert_eq!(totals.subtotal.xaf(), 10_000);
        assert_eq!(totals.shipping_cost.xaf(), 2_500);
        assert_eq!(totals.total.xaf(), 12_500);
        assert_eq!(totals.deposit_amount.xaf(), 3_750);
        assert_eq!(totals.remaining_amount.xaf(), 8_750);
    }

    #[test]
    fn test_new_order_carries_totals() {
        let totals =
            OrderTotals::from_parts(Money::from_xaf(10_000), Money::from_xaf(2_500), 30, 1_000)
                .unwrap();
        let template = order(OrderStatus::Pending);
        let customer = Customer {
            name: "Awa Ndiaye".to_string(),
            email: "awa@example.cm".to_string(),
            phone: "+237670000000".to_string(),
        };
        let placed = Order::new(
            "o-2".to_string(),
            "PMW202610190002".to_string(),
            customer,
            template.shipping_address.clone(),
            None,
            &totals,
            Utc::now(),
        );

        assert_eq!(placed.status, OrderStatus::Pending);
        assert_eq!(placed.payment_status, OrderPaymentStatus::Pending);
        assert_eq!(placed.total_xaf, 12_500);
        assert_eq!(placed.deposit_amount_xaf, 3_750);
        assert_eq!(placed.remaining_amount_xaf, 8_750);
        assert!(placed.confirmed_at.is_none());
    }

    #[test]
    fn test_totals_identities_hold() {
        let items = vec![
            OrderItem::snapshot("o-1", &product(3_333, 450), 3, Utc::now()).unwrap(),
            OrderItem::snapshot("o-1", &product(1_999, 1_200), 2, Utc::now()).unwrap(),
        ];
        for pct in [1, 25, 30, 33, 100] {
            let t = OrderTotals::compute(&items, &default_rate(), pct).unwrap();
            assert_eq!(t.subtotal.xaf(), 3_333 * 3 + 1_999 * 2);
            assert_eq!(t.total, t.subtotal + t.shipping_cost);
            assert_eq!(t.deposit_amount + t.remaining_amount, t.total);
            assert_eq!(t.total_weight_grams, 450 * 3 + 1_200 * 2);
        }
    }

    #[test]
    fn test_invalid_deposit_percentage() {
        assert!(OrderTotals::from_parts(Money::from_xaf(100), Money::zero(), 0, 0).is_err());
        assert!(OrderTotals::from_parts(Money::from_xaf(100), Money::zero(), 101, 0).is_err());
    }

    #[test]
    fn test_snapshot_refuses_out_of_range_price() {
        let p = product(i64::MAX / 2 + 1, 100);
        let err = OrderItem::snapshot("o-1", &p, 2, Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_snapshot_refuses_out_of_range_weight() {
        let p = product(1_000, i64::MAX / 3);
        let err = OrderItem::snapshot("o-1", &p, 3, Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { .. })
        ));

        let mut item = OrderItem::snapshot("o-1", &product(1_000, 1_000_000), 999, Utc::now()).unwrap();
        assert_eq!(item.line_weight_grams(), 999_000_000);
        item.weight_grams = i64::MAX;
        assert_eq!(item.line_weight_grams(), i64::MAX);
    }

    #[test]
    fn test_snapshot_refuses_inactive_product() {
        let mut p = product(1_000, 100);
        p.status = ProductStatus::Inactive;
        let err = OrderItem::snapshot("o-1", &p, 1, Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::ProductUnavailable { .. }));
    }

    #[test]
    fn test_normalize_lines_merges_duplicates() {
        let lines = vec![
            OrderLine { product_id: "a".into(), quantity: 1 },
            OrderLine { product_id: "b".into(), quantity: 2 },
            OrderLine { product_id: "a".into(), quantity: 3 },
        ];
        let merged = normalize_lines(&lines).unwrap();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0], OrderLine { product_id: "a".into(), quantity: 4 });
        assert_eq!(merged[1].product_id, "b");
    }

    #[test]
    fn test_normalize_lines_rejects_bad_input() {
        assert!(matches!(normalize_lines(&[]), Err(CoreError::EmptyOrder)));

        let zero = vec![OrderLine { product_id: "a".into(), quantity: 0 }];
        assert!(normalize_lines(&zero).is_err());

        let merged_too_big = vec![
            OrderLine { product_id: "a".into(), quantity: 600 },
            OrderLine { product_id: "a".into(), quantity: 600 },
        ];
        assert!(normalize_lines(&merged_too_big).is_err());

        let too_many: Vec<_> = (0..=MAX_ORDER_LINES)
            .map(|i| OrderLine { product_id: i.to_string(), quantity: 1 })
            .collect();
        assert!(matches!(
            normalize_lines(&too_many),
            Err(CoreError::TooManyLines { .. })
        ));
    }

    #[test]
    fn test_transition_table() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Processing.can_transition_to(Cancelled));
        assert!(Delivered.can_transition_to(Refunded));
        assert!(Cancelled.can_transition_to(Refunded));

        assert!(!Pending.can_transition_to(Shipped));
        assert!(!Shipped.can_transition_to(Cancelled));
        assert!(!Delivered.can_transition_to(Pending));
        assert!(!Refunded.can_transition_to(Pending));
    }

    #[test]
    fn test_apply_transition_effects_and_stamps() {
        let now = Utc::now();
        let mut o = order(OrderStatus::Pending);

        assert_eq!(o.apply_transition(OrderStatus::Confirmed, now).unwrap(), InventoryEffect::None);
        assert_eq!(o.confirmed_at, Some(now));

        o.apply_transition(OrderStatus::Processing, now).unwrap();
        assert_eq!(o.apply_transition(OrderStatus::Shipped, now).unwrap(), InventoryEffect::Commit);
        assert_eq!(o.shipped_at, Some(now));

        o.apply_transition(OrderStatus::Delivered, now).unwrap();
        assert_eq!(o.delivered_at, Some(now));
        assert_eq!(o.status, OrderStatus::Delivered);
    }

    #[test]
    fn test_invalid_transition_leaves_order_untouched() {
        let mut o = order(OrderStatus::Pending);
        let err = o.apply_transition(OrderStatus::Delivered, Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidOrderTransition { .. }));
        assert_eq!(o.status, OrderStatus::Pending);
        assert!(o.delivered_at.is_none());
    }

    #[test]
    fn test_cancel_only_once() {
        let mut o = order(OrderStatus::Confirmed);
        let effect = o.cancel(Some("changed my mind".into()), Utc::now()).unwrap();
        assert_eq!(effect, InventoryEffect::Release);
        assert_eq!(o.cancellation_reason.as_deref(), Some("changed my mind"));
        assert!(o.cancelled_at.is_some());

        let err = o.cancel(None, Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::OrderNotCancellable { .. }));
    }

    #[test]
    fn test_customer_cannot_cancel_processing_order() {
        let mut o = order(OrderStatus::Processing);
        assert!(o.cancel(None, Utc::now()).is_err());

        // Admin path through the transition table still may.
        assert_eq!(
            o.apply_transition(OrderStatus::Cancelled, Utc::now()).unwrap(),
            InventoryEffect::Release
        );
    }
}
