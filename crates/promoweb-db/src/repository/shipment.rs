//! # Shipment Repository
//!
//! Shipments and their append-only tracking log. Events are only ever
//! inserted; a shipment is always loaded together with its events.

use promoweb_core::{Shipment, TrackingEvent};
use sqlx::types::Json;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;

const SHIPMENT_COLUMNS: &str = "id, tracking_number, order_id, status, method, carrier, \
     from_address, to_address, shipped_at, delivered_at, created_at, updated_at";

const EVENT_COLUMNS: &str = "id, shipment_id, status, description, location, created_at";

// =============================================================================
// Writes
// =============================================================================

/// Inserts a shipment and the events it already carries.
pub async fn insert(conn: &mut SqliteConnection, shipment: &Shipment) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO shipments (
            id, tracking_number, order_id, status, method, carrier,
            from_address, to_address, shipped_at, delivered_at, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
    )
    .bind(&shipment.id)
    .bind(&shipment.tracking_number)
    .bind(&shipment.order_id)
    .bind(shipment.status)
    .bind(shipment.method)
    .bind(&shipment.carrier)
    .bind(Json(&shipment.from_address))
    .bind(Json(&shipment.to_address))
    .bind(shipment.shipped_at)
    .bind(shipment.delivered_at)
    .bind(shipment.created_at)
    .bind(shipment.updated_at)
    .execute(&mut *conn)
    .await?;

    for event in &shipment.tracking_events {
        insert_event(conn, event).await?;
    }

    debug!(tracking_number = %shipment.tracking_number, "Inserted shipment");
    Ok(())
}

pub async fn insert_event(conn: &mut SqliteConnection, event: &TrackingEvent) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO shipment_tracking_events (id, shipment_id, status, description, location, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&event.id)
    .bind(&event.shipment_id)
    .bind(event.status)
    .bind(&event.description)
    .bind(&event.location)
    .bind(event.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Persists status and the one-time timestamps after `Shipment::apply_status`.
pub async fn update_state(conn: &mut SqliteConnection, shipment: &Shipment) -> DbResult<()> {
    sqlx::query(
        r#"
        UPDATE shipments
        SET status = ?2, shipped_at = ?3, delivered_at = ?4, updated_at = ?5
        WHERE id = ?1
        "#,
    )
    .bind(&shipment.id)
    .bind(shipment.status)
    .bind(shipment.shipped_at)
    .bind(shipment.delivered_at)
    .bind(shipment.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Takes the writer lock on a shipment row. See [`super::order::lock`].
pub async fn lock(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
    let result = sqlx::query("UPDATE shipments SET updated_at = updated_at WHERE id = ?1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() == 1)
}

// =============================================================================
// Reads
// =============================================================================

async fn events(conn: &mut SqliteConnection, shipment_id: &str) -> DbResult<Vec<TrackingEvent>> {
    let events = sqlx::query_as::<_, TrackingEvent>(&format!(
        "SELECT {} FROM shipment_tracking_events WHERE shipment_id = ?1 ORDER BY created_at, rowid",
        EVENT_COLUMNS
    ))
    .bind(shipment_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(events)
}

async fn with_events(
    conn: &mut SqliteConnection,
    shipment: Option<Shipment>,
) -> DbResult<Option<Shipment>> {
    match shipment {
        Some(mut shipment) => {
            shipment.tracking_events = events(conn, &shipment.id).await?;
            Ok(Some(shipment))
        }
        None => Ok(None),
    }
}

pub async fn find_by_id(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Shipment>> {
    let shipment = sqlx::query_as::<_, Shipment>(&format!(
        "SELECT {} FROM shipments WHERE id = ?1",
        SHIPMENT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    with_events(conn, shipment).await
}

pub async fn find_by_tracking_number(
    conn: &mut SqliteConnection,
    tracking_number: &str,
) -> DbResult<Option<Shipment>> {
    let shipment = sqlx::query_as::<_, Shipment>(&format!(
        "SELECT {} FROM shipments WHERE tracking_number = ?1",
        SHIPMENT_COLUMNS
    ))
    .bind(tracking_number)
    .fetch_optional(&mut *conn)
    .await?;

    with_events(conn, shipment).await
}

pub async fn for_order(conn: &mut SqliteConnection, order_id: &str) -> DbResult<Vec<Shipment>> {
    let mut shipments = sqlx::query_as::<_, Shipment>(&format!(
        "SELECT {} FROM shipments WHERE order_id = ?1 ORDER BY created_at, rowid",
        SHIPMENT_COLUMNS
    ))
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    for shipment in &mut shipments {
        shipment.tracking_events = events(conn, &shipment.id).await?;
    }

    Ok(shipments)
}

// =============================================================================
// Repository
// =============================================================================

/// Read-side repository for shipments.
#[derive(Debug, Clone)]
pub struct ShipmentRepository {
    pool: SqlitePool,
}

impl ShipmentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ShipmentRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Shipment>> {
        let mut conn = self.pool.acquire().await?;
        find_by_id(&mut conn, id).await
    }

    /// Public tracking lookup.
    pub async fn track(&self, tracking_number: &str) -> DbResult<Option<Shipment>> {
        let mut conn = self.pool.acquire().await?;
        find_by_tracking_number(&mut conn, tracking_number.trim()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::order::{self, tests::sample_order};
    use crate::{Database, DbConfig};
    use chrono::Utc;
    use promoweb_core::{ShipmentStatus, ShippingMethod};

    #[tokio::test]
    async fn test_events_are_appended_and_loaded_in_order() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let order = sample_order("PMW202610190001");
        let mut shipment = Shipment::new(
            &order.id,
            "PWA2026101900001".to_string(),
            ShippingMethod::Express,
            Some("DHL".to_string()),
            order.shipping_address.clone(),
            order.shipping_address.clone(),
            Utc::now(),
        );

        let mut conn = db.pool().acquire().await.unwrap();
        order::insert(&mut conn, &order).await.unwrap();
        insert(&mut conn, &shipment).await.unwrap();

        shipment.apply_status(ShipmentStatus::Shipped, Utc::now()).unwrap();
        update_state(&mut conn, &shipment).await.unwrap();
        let event = TrackingEvent::new(
            &shipment.id,
            ShipmentStatus::Shipped,
            "Left the Douala warehouse".to_string(),
            Some("Douala".to_string()),
            Utc::now(),
        );
        insert_event(&mut conn, &event).await.unwrap();
        assert!(lock(&mut conn, &shipment.id).await.unwrap());
        drop(conn);

        let tracked = db.shipments().track("PWA2026101900001").await.unwrap().unwrap();
        assert_eq!(tracked.status, ShipmentStatus::Shipped);
        assert!(tracked.shipped_at.is_some());
        assert_eq!(tracked.tracking_events.len(), 2);
        assert_eq!(tracked.tracking_events[0].status, ShipmentStatus::Pending);
        assert_eq!(tracked.tracking_events[1].location.as_deref(), Some("Douala"));

        let details = db.orders().get_details(&order.id).await.unwrap().unwrap();
        assert_eq!(details.shipments.len(), 1);
        assert_eq!(details.shipments[0].tracking_events.len(), 2);
    }
}
