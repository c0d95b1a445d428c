//! # Daily Sequences
//!
//! Collision-free counters behind order numbers, transaction ids and
//! tracking numbers.
//!
//! ```text
//! INSERT INTO sequences (name, period, value) VALUES ('order', '20261019', 1)
//! ON CONFLICT (name, period) DO UPDATE SET value = value + 1
//! RETURNING value
//! ```
//!
//! One statement reads and increments, so two concurrent checkouts can never
//! observe the same value. Inside a transaction the bump is also the write
//! that takes SQLite's writer lock.

use chrono::{DateTime, Utc};
use promoweb_core::numbering::{period, Sequence};
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;

/// Allocates the next counter value of `sequence` for the UTC day of `now`.
pub async fn next_value(
    conn: &mut SqliteConnection,
    sequence: Sequence,
    now: DateTime<Utc>,
) -> DbResult<i64> {
    let value: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO sequences (name, period, value) VALUES (?1, ?2, 1)
        ON CONFLICT (name, period) DO UPDATE SET value = value + 1
        RETURNING value
        "#,
    )
    .bind(sequence.name())
    .bind(period(now.date_naive()))
    .fetch_one(&mut *conn)
    .await?;

    Ok(value)
}

/// Allocates and formats the next business number of `sequence`.
pub async fn next_number(
    conn: &mut SqliteConnection,
    sequence: Sequence,
    now: DateTime<Utc>,
) -> DbResult<String> {
    let value = next_value(conn, sequence, now).await?;
    let number = sequence.format(now.date_naive(), value);
    debug!(sequence = sequence.name(), %number, "Allocated number");
    Ok(number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_counters_are_per_sequence_and_per_day() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        let day1 = Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap();
        let day2 = Utc.with_ymd_and_hms(2026, 10, 20, 8, 0, 0).unwrap();

        assert_eq!(
            next_number(&mut conn, Sequence::Order, day1).await.unwrap(),
            "PMW202610190001"
        );
        assert_eq!(
            next_number(&mut conn, Sequence::Order, day1).await.unwrap(),
            "PMW202610190002"
        );
        assert_eq!(
            next_number(&mut conn, Sequence::Transaction, day1).await.unwrap(),
            "TXN20261019000001"
        );
        assert_eq!(
            next_number(&mut conn, Sequence::Order, day2).await.unwrap(),
            "PMW202610200001"
        );
    }

    #[tokio::test]
    async fn test_rolled_back_bump_is_reused() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = Utc::now();

        {
            let mut tx = db.begin().await.unwrap();
            assert_eq!(next_value(&mut tx, Sequence::Tracking, now).await.unwrap(), 1);
            // dropped without commit
        }

        let mut tx = db.begin().await.unwrap();
        assert_eq!(next_value(&mut tx, Sequence::Tracking, now).await.unwrap(), 1);
        tx.commit().await.unwrap();
    }
}
