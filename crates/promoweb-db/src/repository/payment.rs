//! # Payment Repository
//!
//! Payment rows are never deleted. Refunds are separate rows with a negative
//! amount pointing at the payment they reverse (`refund_of`).
//!
//! ## Processing Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  tx 1:  mark_processing(id)   pending → processing (guarded UPDATE)    │
//! │         commit                                                          │
//! │                                                                         │
//! │  gateway delay + decision     (no transaction open)                     │
//! │                                                                         │
//! │  tx 2:  update_outcome(payment)   processing → completed | failed       │
//! │         for_order(order_id)       → derive order payment status         │
//! │         commit                                                          │
//! │                                                                         │
//! │  tx 2 failed:  fail_processing(id, reason)   processing → failed        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cash on delivery rows skip the gateway: `collect_cash` moves them from
//! `pending` straight to `completed`.

use chrono::{DateTime, Utc};
use promoweb_core::Payment;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;

const PAYMENT_COLUMNS: &str = "id, transaction_id, order_id, payment_type, status, method, \
     amount_xaf, phone_number, card_last4, gateway_reference, refund_of, refund_reason, \
     failure_reason, created_at, updated_at, completed_at";

pub async fn insert(conn: &mut SqliteConnection, payment: &Payment) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO payments (
            id, transaction_id, order_id, payment_type, status, method, amount_xaf,
            phone_number, card_last4, gateway_reference, refund_of, refund_reason,
            failure_reason, created_at, updated_at, completed_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
        "#,
    )
    .bind(&payment.id)
    .bind(&payment.transaction_id)
    .bind(&payment.order_id)
    .bind(payment.payment_type)
    .bind(payment.status)
    .bind(payment.method)
    .bind(payment.amount_xaf)
    .bind(&payment.phone_number)
    .bind(&payment.card_last4)
    .bind(&payment.gateway_reference)
    .bind(&payment.refund_of)
    .bind(&payment.refund_reason)
    .bind(&payment.failure_reason)
    .bind(payment.created_at)
    .bind(payment.updated_at)
    .bind(payment.completed_at)
    .execute(&mut *conn)
    .await?;

    debug!(
        transaction_id = %payment.transaction_id,
        payment_type = %payment.payment_type,
        amount_xaf = payment.amount_xaf,
        "Inserted payment"
    );
    Ok(())
}

pub async fn find_by_id(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Payment>> {
    let payment = sqlx::query_as::<_, Payment>(&format!(
        "SELECT {} FROM payments WHERE id = ?1",
        PAYMENT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(payment)
}

/// All payments of an order, refunds included, oldest first.
pub async fn for_order(conn: &mut SqliteConnection, order_id: &str) -> DbResult<Vec<Payment>> {
    let payments = sqlx::query_as::<_, Payment>(&format!(
        "SELECT {} FROM payments WHERE order_id = ?1 ORDER BY created_at, rowid",
        PAYMENT_COLUMNS
    ))
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(payments)
}

/// Refund rows issued against one original payment.
pub async fn refunds_of(conn: &mut SqliteConnection, payment_id: &str) -> DbResult<Vec<Payment>> {
    let refunds = sqlx::query_as::<_, Payment>(&format!(
        "SELECT {} FROM payments WHERE refund_of = ?1 ORDER BY created_at, rowid",
        PAYMENT_COLUMNS
    ))
    .bind(payment_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(refunds)
}

/// Claims a pending gateway payment for processing.
///
/// The status guard makes the claim single-winner: of two concurrent
/// `process` calls only one sees a row change.
///
/// ## Returns
/// * `Ok(true)` - this caller owns the payment now
/// * `Ok(false)` - unknown payment, no longer `pending`, or cash on delivery
pub async fn mark_processing(
    conn: &mut SqliteConnection,
    id: &str,
    now: DateTime<Utc>,
) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE payments
        SET status = 'processing', updated_at = ?2
        WHERE id = ?1 AND status = 'pending' AND method <> 'cash_on_delivery'
        "#,
    )
    .bind(id)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Records cash handed to the courier for a pending cash on delivery payment.
///
/// ## Returns
/// * `Ok(false)` - unknown payment, not cash on delivery, or not `pending`
pub async fn collect_cash(
    conn: &mut SqliteConnection,
    id: &str,
    reference: &str,
    now: DateTime<Utc>,
) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE payments
        SET status = 'completed', gateway_reference = ?2, completed_at = ?3, updated_at = ?3
        WHERE id = ?1 AND status = 'pending' AND method = 'cash_on_delivery'
        "#,
    )
    .bind(id)
    .bind(reference)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Gives up on a payment whose outcome could not be saved.
///
/// Only touches rows still `processing`, so it can never overwrite an
/// outcome that did get through.
pub async fn fail_processing(
    conn: &mut SqliteConnection,
    id: &str,
    reason: &str,
    now: DateTime<Utc>,
) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE payments
        SET status = 'failed', failure_reason = ?2, updated_at = ?3
        WHERE id = ?1 AND status = 'processing'
        "#,
    )
    .bind(id)
    .bind(reason)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Persists the gateway outcome of a payment that is `processing`.
///
/// ## Returns
/// * `Ok(false)` - the row was not `processing` any more
pub async fn update_outcome(conn: &mut SqliteConnection, payment: &Payment) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE payments
        SET status = ?2,
            gateway_reference = ?3,
            failure_reason = ?4,
            completed_at = ?5,
            updated_at = ?6
        WHERE id = ?1 AND status = 'processing'
        "#,
    )
    .bind(&payment.id)
    .bind(payment.status)
    .bind(&payment.gateway_reference)
    .bind(&payment.failure_reason)
    .bind(payment.completed_at)
    .bind(payment.updated_at)
    .execute(&mut *conn)
    .await?;

    debug!(transaction_id = %payment.transaction_id, status = %payment.status, "Payment outcome saved");
    Ok(result.rows_affected() == 1)
}

/// Takes the writer lock on a payment row. See [`super::order::lock`].
pub async fn lock(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
    let result = sqlx::query("UPDATE payments SET updated_at = updated_at WHERE id = ?1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() == 1)
}

/// Read-side repository for payments.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: SqlitePool,
}

impl PaymentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PaymentRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Payment>> {
        let mut conn = self.pool.acquire().await?;
        find_by_id(&mut conn, id).await
    }

    pub async fn get_by_transaction_id(&self, transaction_id: &str) -> DbResult<Option<Payment>> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {} FROM payments WHERE transaction_id = ?1",
            PAYMENT_COLUMNS
        ))
        .bind(transaction_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    pub async fn list_for_order(&self, order_id: &str) -> DbResult<Vec<Payment>> {
        let mut conn = self.pool.acquire().await?;
        for_order(&mut conn, order_id).await
    }
}
