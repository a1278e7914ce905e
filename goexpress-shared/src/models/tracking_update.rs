/// Tracking update model: the append-only shipment event log
///
/// One row is written when a shipment is created and one per status change,
/// always inside the same transaction as the shipment write. Rows are never
/// updated or deleted; this module exposes no operation that would.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tracking_updates (
///     id BIGSERIAL PRIMARY KEY,
///     shipment_id BIGINT NOT NULL REFERENCES shipments(id) ON DELETE CASCADE,
///     status shipment_status NOT NULL,
///     location VARCHAR(255),
///     timestamp TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

use super::shipment::ShipmentStatus;

/// One immutable event in a shipment's status history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TrackingUpdate {
    pub id: i64,
    pub shipment_id: i64,
    pub status: ShipmentStatus,
    pub location: Option<String>,

    /// When the event happened
    pub timestamp: DateTime<Utc>,

    pub created_at: DateTime<Utc>,
}

impl TrackingUpdate {
    /// Appends an event to a shipment's history
    ///
    /// Call with the transaction that wrote the shipment change so the two
    /// become visible together.
    pub async fn record<'e, E>(
        executor: E,
        shipment_id: i64,
        status: ShipmentStatus,
        location: Option<&str>,
    ) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let update = sqlx::query_as::<_, TrackingUpdate>(
            r#"
            INSERT INTO tracking_updates (shipment_id, status, location, timestamp)
            VALUES ($1, $2, $3, NOW())
            RETURNING id, shipment_id, status, location, timestamp, created_at
            "#,
        )
        .bind(shipment_id)
        .bind(status)
        .bind(location)
        .fetch_one(executor)
        .await?;

        tracing::debug!(
            shipment_id,
            status = %status,
            tracking_update_id = update.id,
            "Tracking update recorded"
        );

        Ok(update)
    }

    /// Lists a shipment's history, newest first
    pub async fn list_for_shipment<'e, E>(
        executor: E,
        shipment_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, TrackingUpdate>(
            r#"
            SELECT id, shipment_id, status, location, timestamp, created_at
            FROM tracking_updates
            WHERE shipment_id = $1
            ORDER BY timestamp DESC, id DESC
            "#,
        )
        .bind(shipment_id)
        .fetch_all(executor)
        .await
    }
}
