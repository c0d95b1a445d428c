//! # Order Repository
//!
//! Orders, their item snapshots and their status history.
//!
//! ## Write Path (inside the checkout transaction)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    sequence::next_number(Order)     ← first statement, takes the lock   │
//! │    product::find_by_id × N          ← snapshot source                   │
//! │    inventory::reserve_stock × N     ← conditional UPDATE                │
//! │    order::insert                                                        │
//! │    order::insert_item × N                                               │
//! │    order::insert_status_change      ← (none) → pending                  │
//! │  COMMIT                             (any failure: ROLLBACK, no trace)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use promoweb_core::{
    Order, OrderDetails, OrderItem, OrderPaymentStatus, OrderStatus, OrderStatusChange,
};
use sqlx::types::Json;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use crate::repository::{payment, shipment};

const ORDER_COLUMNS: &str = "id, order_number, customer_name, customer_email, customer_phone, \
     shipping_address, notes, subtotal_xaf, shipping_cost_xaf, total_xaf, deposit_percentage, \
     deposit_amount_xaf, remaining_amount_xaf, total_weight_grams, status, payment_status, \
     cancellation_reason, created_at, updated_at, confirmed_at, shipped_at, delivered_at, \
     cancelled_at";

const ITEM_COLUMNS: &str = "id, order_id, product_id, sku, name, brand, image_url, \
     unit_price_xaf, weight_grams, quantity, line_total_xaf, created_at";

/// Paging and filtering for order listings.
#[derive(Debug, Clone, Copy)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub limit: u32,
    pub offset: u32,
}

impl Default for OrderFilter {
    fn default() -> Self {
        OrderFilter {
            status: None,
            limit: 20,
            offset: 0,
        }
    }
}

// =============================================================================
// Connection-level writes
// =============================================================================

pub async fn insert(conn: &mut SqliteConnection, order: &Order) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO orders (
            id, order_number, customer_name, customer_email, customer_phone,
            shipping_address, notes, subtotal_xaf, shipping_cost_xaf, total_xaf,
            deposit_percentage, deposit_amount_xaf, remaining_amount_xaf, total_weight_grams,
            status, payment_status, cancellation_reason, created_at, updated_at,
            confirmed_at, shipped_at, delivered_at, cancelled_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                  ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23)
        "#,
    )
    .bind(&order.id)
    .bind(&order.order_number)
    .bind(&order.customer_name)
    .bind(&order.customer_email)
    .bind(&order.customer_phone)
    .bind(Json(&order.shipping_address))
    .bind(&order.notes)
    .bind(order.subtotal_xaf)
    .bind(order.shipping_cost_xaf)
    .bind(order.total_xaf)
    .bind(order.deposit_percentage)
    .bind(order.deposit_amount_xaf)
    .bind(order.remaining_amount_xaf)
    .bind(order.total_weight_grams)
    .bind(order.status)
    .bind(order.payment_status)
    .bind(&order.cancellation_reason)
    .bind(order.created_at)
    .bind(order.updated_at)
    .bind(order.confirmed_at)
    .bind(order.shipped_at)
    .bind(order.delivered_at)
    .bind(order.cancelled_at)
    .execute(&mut *conn)
    .await?;

    debug!(order_number = %order.order_number, "Inserted order");
    Ok(())
}

pub async fn insert_item(conn: &mut SqliteConnection, item: &OrderItem) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO order_items (
            id, order_id, product_id, sku, name, brand, image_url,
            unit_price_xaf, weight_grams, quantity, line_total_xaf, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
    )
    .bind(&item.id)
    .bind(&item.order_id)
    .bind(&item.product_id)
    .bind(&item.sku)
    .bind(&item.name)
    .bind(&item.brand)
    .bind(&item.image_url)
    .bind(item.unit_price_xaf)
    .bind(item.weight_grams)
    .bind(item.quantity)
    .bind(item.line_total_xaf)
    .bind(item.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn insert_status_change(
    conn: &mut SqliteConnection,
    change: &OrderStatusChange,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO order_status_history (id, order_id, from_status, to_status, note, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&change.id)
    .bind(&change.order_id)
    .bind(change.from_status)
    .bind(change.to_status)
    .bind(&change.note)
    .bind(change.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Takes the writer lock and pins the order row for the transaction.
///
/// A no-op write as the first statement of a status-changing transaction,
/// so the read that follows sees a row nobody else can change until commit.
///
/// ## Returns
/// * `Ok(false)` - unknown order
pub async fn lock(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
    let result = sqlx::query("UPDATE orders SET updated_at = updated_at WHERE id = ?1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() == 1)
}

/// Persists lifecycle fields after `Order::apply_transition` / `cancel`.
pub async fn update_lifecycle(conn: &mut SqliteConnection, order: &Order) -> DbResult<()> {
    sqlx::query(
        r#"
        UPDATE orders
        SET status = ?2,
            cancellation_reason = ?3,
            confirmed_at = ?4,
            shipped_at = ?5,
            delivered_at = ?6,
            cancelled_at = ?7,
            updated_at = ?8
        WHERE id = ?1
        "#,
    )
    .bind(&order.id)
    .bind(order.status)
    .bind(&order.cancellation_reason)
    .bind(order.confirmed_at)
    .bind(order.shipped_at)
    .bind(order.delivered_at)
    .bind(order.cancelled_at)
    .bind(order.updated_at)
    .execute(&mut *conn)
    .await?;

    debug!(order_number = %order.order_number, status = %order.status, "Order status saved");
    Ok(())
}

/// Overwrites the payment status of an order.
///
/// ## Returns
/// * `Ok(false)` - unknown order
pub async fn update_payment_status(
    conn: &mut SqliteConnection,
    id: &str,
    payment_status: OrderPaymentStatus,
    now: DateTime<Utc>,
) -> DbResult<bool> {
    let result = sqlx::query("UPDATE orders SET payment_status = ?2, updated_at = ?3 WHERE id = ?1")
        .bind(id)
        .bind(payment_status)
        .bind(now)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() == 1)
}

// =============================================================================
// Connection-level reads
// =============================================================================

pub async fn find_by_id(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(&format!(
        "SELECT {} FROM orders WHERE id = ?1",
        ORDER_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(order)
}

pub async fn find_by_number(
    conn: &mut SqliteConnection,
    order_number: &str,
) -> DbResult<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(&format!(
        "SELECT {} FROM orders WHERE order_number = ?1",
        ORDER_COLUMNS
    ))
    .bind(order_number)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(order)
}

/// Items of an order, in checkout order.
pub async fn items(conn: &mut SqliteConnection, order_id: &str) -> DbResult<Vec<OrderItem>> {
    let items = sqlx::query_as::<_, OrderItem>(&format!(
        "SELECT {} FROM order_items WHERE order_id = ?1 ORDER BY rowid",
        ITEM_COLUMNS
    ))
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(items)
}

pub async fn status_history(
    conn: &mut SqliteConnection,
    order_id: &str,
) -> DbResult<Vec<OrderStatusChange>> {
    let history = sqlx::query_as::<_, OrderStatusChange>(
        r#"
        SELECT id, order_id, from_status, to_status, note, created_at
        FROM order_status_history
        WHERE order_id = ?1
        ORDER BY created_at, rowid
        "#,
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(history)
}

/// Loads everything hanging off an order.
pub async fn details(conn: &mut SqliteConnection, order: Order) -> DbResult<OrderDetails> {
    let items = items(conn, &order.id).await?;
    let payments = payment::for_order(conn, &order.id).await?;
    let shipments = shipment::for_order(conn, &order.id).await?;
    let status_history = status_history(conn, &order.id).await?;

    Ok(OrderDetails {
        order,
        items,
        payments,
        shipments,
        status_history,
    })
}

// =============================================================================
// Repository
// =============================================================================

/// Read-side repository for orders.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let mut conn = self.pool.acquire().await?;
        find_by_id(&mut conn, id).await
    }

    /// Order with items, payments, shipments and history.
    pub async fn get_details(&self, id: &str) -> DbResult<Option<OrderDetails>> {
        let mut conn = self.pool.acquire().await?;
        match find_by_id(&mut conn, id).await? {
            Some(order) => Ok(Some(details(&mut conn, order).await?)),
            None => Ok(None),
        }
    }

    pub async fn get_details_by_number(&self, order_number: &str) -> DbResult<Option<OrderDetails>> {
        let mut conn = self.pool.acquire().await?;
        match find_by_number(&mut conn, order_number).await? {
            Some(order) => Ok(Some(details(&mut conn, order).await?)),
            None => Ok(None),
        }
    }

    pub async fn get_items(&self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let mut conn = self.pool.acquire().await?;
        items(&mut conn, order_id).await
    }

    /// Newest orders first.
    pub async fn list(&self, filter: OrderFilter) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            r#"
            SELECT {}
            FROM orders
            WHERE (?1 IS NULL OR status = ?1)
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?2 OFFSET ?3
            "#,
            ORDER_COLUMNS
        ))
        .bind(filter.status)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = orders.len(), "Listed orders");
        Ok(orders)
    }

    pub async fn count(&self, status: Option<OrderStatus>) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE (?1 IS NULL OR status = ?1)")
                .bind(status)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use promoweb_core::{Address, Customer, Money, OrderTotals};
    use uuid::Uuid;

    pub(crate) fn sample_order(order_number: &str) -> Order {
        let totals =
            OrderTotals::from_parts(Money::from_xaf(10_000), Money::from_xaf(2_500), 30, 1_000)
                .unwrap();
        Order::new(
            Uuid::new_v4().to_string(),
            order_number.to_string(),
            Customer {
                name: "Jean Mballa".to_string(),
                email: "jean@example.cm".to_string(),
                phone: "+237690000000".to_string(),
            },
            Address {
                street_address: "Rue Joss".to_string(),
                city: "Douala".to_string(),
                region: Some("Littoral".to_string()),
                postal_code: None,
                country: "CM".to_string(),
            },
            None,
            &totals,
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_insert_and_load_details() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let order = sample_order("PMW202610190001");

        let mut tx = db.begin().await.unwrap();
        insert(&mut tx, &order).await.unwrap();
        let change = OrderStatusChange::new(&order.id, None, OrderStatus::Pending, None, Utc::now());
        insert_status_change(&mut tx, &change).await.unwrap();
        tx.commit().await.unwrap();

        let details = db
            .orders()
            .get_details_by_number("PMW202610190001")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(details.order.id, order.id);
        assert_eq!(details.order.total_xaf, 12_500);
        assert_eq!(details.order.shipping_address.region.as_deref(), Some("Littoral"));
        assert_eq!(details.status_history.len(), 1);
        assert!(details.status_history[0].from_status.is_none());
        assert!(details.items.is_empty());
        assert!(details.payments.is_empty());
        assert!(details.shipments.is_empty());
    }

    #[tokio::test]
    async fn test_lifecycle_and_payment_status_updates() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut order = sample_order("PMW202610190002");

        let mut conn = db.pool().acquire().await.unwrap();
        insert(&mut conn, &order).await.unwrap();
        assert!(lock(&mut conn, &order.id).await.unwrap());
        assert!(!lock(&mut conn, "missing").await.unwrap());

        order.apply_transition(OrderStatus::Confirmed, Utc::now()).unwrap();
        update_lifecycle(&mut conn, &order).await.unwrap();
        assert!(update_payment_status(
            &mut conn,
            &order.id,
            OrderPaymentStatus::DepositPaid,
            Utc::now()
        )
        .await
        .unwrap());
        drop(conn);

        let loaded = db.orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, OrderStatus::Confirmed);
        assert!(loaded.confirmed_at.is_some());
        assert_eq!(loaded.payment_status, OrderPaymentStatus::DepositPaid);
    }

    #[tokio::test]
    async fn test_list_filters_by_status() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();
        insert(&mut conn, &sample_order("PMW202610190001")).await.unwrap();
        let mut cancelled = sample_order("PMW202610190002");
        cancelled.cancel(None, Utc::now()).unwrap();
        insert(&mut conn, &cancelled).await.unwrap();
        drop(conn);

        let repo = db.orders();
        assert_eq!(repo.list(OrderFilter::default()).await.unwrap().len(), 2);

        let filter = OrderFilter {
            status: Some(OrderStatus::Cancelled),
            ..OrderFilter::default()
        };
        let only = repo.list(filter).await.unwrap();
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].order_number, "PMW202610190002");
        assert_eq!(repo.count(Some(OrderStatus::Pending)).await.unwrap(), 1);
    }
}
