//! # Shipping Zone Repository
//!
//! Region-keyed rate tables. The zone code is matched case-insensitively
//! (`COLLATE NOCASE` column) against the shipping address region.

use promoweb_core::ShippingZone;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};

const ZONE_COLUMNS: &str = "id, code, name, base_rate_xaf, per_kg_rate_xaf, \
     free_shipping_threshold_xaf, max_weight_grams, min_delivery_days, max_delivery_days, \
     is_active, created_at";

/// Finds the active zone for a region code.
pub async fn find_active_by_code(
    conn: &mut SqliteConnection,
    code: &str,
) -> DbResult<Option<ShippingZone>> {
    let zone = sqlx::query_as::<_, ShippingZone>(&format!(
        "SELECT {} FROM shipping_zones WHERE code = ?1 AND is_active = 1",
        ZONE_COLUMNS
    ))
    .bind(code.trim())
    .fetch_optional(&mut *conn)
    .await?;

    debug!(code, found = zone.is_some(), "Zone lookup");
    Ok(zone)
}

/// Repository for shipping zones.
#[derive(Debug, Clone)]
pub struct ShippingZoneRepository {
    pool: SqlitePool,
}

impl ShippingZoneRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ShippingZoneRepository { pool }
    }

    /// Active zones ordered by name.
    pub async fn list_active(&self) -> DbResult<Vec<ShippingZone>> {
        let zones = sqlx::query_as::<_, ShippingZone>(&format!(
            "SELECT {} FROM shipping_zones WHERE is_active = 1 ORDER BY name",
            ZONE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(zones)
    }

    pub async fn get_active_by_code(&self, code: &str) -> DbResult<Option<ShippingZone>> {
        let mut conn = self.pool.acquire().await?;
        find_active_by_code(&mut conn, code).await
    }

    pub async fn insert(&self, zone: &ShippingZone) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO shipping_zones (
                id, code, name, base_rate_xaf, per_kg_rate_xaf, free_shipping_threshold_xaf,
                max_weight_grams, min_delivery_days, max_delivery_days, is_active, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&zone.id)
        .bind(&zone.code)
        .bind(&zone.name)
        .bind(zone.base_rate_xaf)
        .bind(zone.per_kg_rate_xaf)
        .bind(zone.free_shipping_threshold_xaf)
        .bind(zone.max_weight_grams)
        .bind(zone.min_delivery_days)
        .bind(zone.max_delivery_days)
        .bind(zone.is_active)
        .bind(zone.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("zone code", zone.code.clone()),
            other => other,
        })?;

        debug!(code = %zone.code, "Inserted shipping zone");
        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shipping_zones")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
