//! # Inventory Ledger
//!
//! Per-product on-hand and reserved quantities.
//!
//! ## Ledger Movements
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         stock   reserved   available                    │
//! │  initial                  10        0          10                       │
//! │  reserve_stock(3)         10        3           7   order placed        │
//! │  release_stock(3)         10        0          10   order cancelled     │
//! │  reserve_stock(3)         10        3           7                       │
//! │  commit_shipment(3)        7        0           7   order shipped       │
//! │  restock(5)               12        0          12   goods received      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every check-and-mutate is ONE conditional `UPDATE`. There is no read
//! followed by a write, so two checkouts racing for the last unit cannot
//! both win: the second `UPDATE` matches zero rows.
//!
//! All functions take a connection so they run inside the caller's
//! transaction (`&mut *tx`).

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};

/// Reserves `quantity` units if that many are available.
///
/// ## Returns
/// * `Ok(true)` - reserved
/// * `Ok(false)` - not enough available stock (or unknown product), nothing changed
pub async fn reserve_stock(
    conn: &mut SqliteConnection,
    product_id: &str,
    quantity: i64,
) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE products
        SET reserved_quantity = reserved_quantity + ?2,
            updated_at = ?3
        WHERE id = ?1
          AND stock_quantity - reserved_quantity >= ?2
        "#,
    )
    .bind(product_id)
    .bind(quantity)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    let reserved = result.rows_affected() == 1;
    debug!(product_id, quantity, reserved, "Reserve stock");
    Ok(reserved)
}

/// Gives `quantity` reserved units back, floored at zero.
pub async fn release_stock(
    conn: &mut SqliteConnection,
    product_id: &str,
    quantity: i64,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE products
        SET reserved_quantity = MAX(reserved_quantity - ?2, 0),
            updated_at = ?3
        WHERE id = ?1
        "#,
    )
    .bind(product_id)
    .bind(quantity)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        warn!(product_id, quantity, "Release for unknown product ignored");
    } else {
        debug!(product_id, quantity, "Released stock");
    }
    Ok(())
}

/// Units physically leave: stock and reservation both drop by `quantity`.
///
/// Fails when the product no longer holds that reservation, which would
/// mean the ledger and the order disagree.
pub async fn commit_shipment(
    conn: &mut SqliteConnection,
    product_id: &str,
    quantity: i64,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE products
        SET stock_quantity = stock_quantity - ?2,
            reserved_quantity = reserved_quantity - ?2,
            updated_at = ?3
        WHERE id = ?1
          AND reserved_quantity >= ?2
        "#,
    )
    .bind(product_id)
    .bind(quantity)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::CheckViolation {
            message: format!(
                "cannot commit {} units of product {}: reservation missing",
                quantity, product_id
            ),
        });
    }

    debug!(product_id, quantity, "Committed shipment stock");
    Ok(())
}

/// Adds received units to the on-hand stock.
///
/// ## Returns
/// * `Ok(false)` - unknown product
pub async fn restock(
    conn: &mut SqliteConnection,
    product_id: &str,
    quantity: i64,
) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE products
        SET stock_quantity = stock_quantity + ?2,
            updated_at = ?3
        WHERE id = ?1
        "#,
    )
    .bind(product_id)
    .bind(quantity)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::product::tests::sample_product;
    use crate::{Database, DbConfig};

    async fn setup(stock: i64) -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = sample_product("TV-SAM-55", 350_000, stock);
        db.products().insert(&product).await.unwrap();
        (db, product.id)
    }

    async fn quantities(db: &Database, id: &str) -> (i64, i64) {
        let p = db.products().get_by_id(id).await.unwrap().unwrap();
        (p.stock_quantity, p.reserved_quantity)
    }

    #[tokio::test]
    async fn test_reserve_within_available() {
        let (db, id) = setup(5).await;
        let mut conn = db.pool().acquire().await.unwrap();

        assert!(reserve_stock(&mut conn, &id, 3).await.unwrap());
        assert!(reserve_stock(&mut conn, &id, 2).await.unwrap());
        assert!(!reserve_stock(&mut conn, &id, 1).await.unwrap());
        drop(conn);

        assert_eq!(quantities(&db, &id).await, (5, 5));
    }

    #[tokio::test]
    async fn test_refused_reservation_changes_nothing() {
        let (db, id) = setup(2).await;
        let mut conn = db.pool().acquire().await.unwrap();

        assert!(!reserve_stock(&mut conn, &id, 3).await.unwrap());
        assert!(!reserve_stock(&mut conn, "missing", 1).await.unwrap());
        drop(conn);

        assert_eq!(quantities(&db, &id).await, (2, 0));
    }

    #[tokio::test]
    async fn test_release_is_floored_at_zero() {
        let (db, id) = setup(5).await;
        let mut conn = db.pool().acquire().await.unwrap();

        reserve_stock(&mut conn, &id, 2).await.unwrap();
        release_stock(&mut conn, &id, 5).await.unwrap();
        drop(conn);

        assert_eq!(quantities(&db, &id).await, (5, 0));
    }

    #[tokio::test]
    async fn test_commit_consumes_reservation() {
        let (db, id) = setup(10).await;
        let mut conn = db.pool().acquire().await.unwrap();

        reserve_stock(&mut conn, &id, 3).await.unwrap();
        commit_shipment(&mut conn, &id, 3).await.unwrap();
        assert!(commit_shipment(&mut conn, &id, 1).await.is_err());
        drop(conn);

        assert_eq!(quantities(&db, &id).await, (7, 0));
    }

    #[tokio::test]
    async fn test_restock() {
        let (db, id) = setup(0).await;
        let mut conn = db.pool().acquire().await.unwrap();

        assert!(restock(&mut conn, &id, 12).await.unwrap());
        assert!(!restock(&mut conn, "missing", 1).await.unwrap());
        drop(conn);

        assert_eq!(quantities(&db, &id).await, (12, 0));
    }
}
