/// Shipment model and lifecycle operations
///
/// Shipments move through a closed set of states:
///
/// ```text
/// pending → confirmed → in_transit → delivered
///    │          │            │
///    └──────────┴────────────┴──→ cancelled
/// ```
///
/// Forward moves may skip stages, and a non-terminal status may be reported
/// again (for example a new location while in transit). `delivered` and
/// `cancelled` are terminal. Every accepted change appends a
/// [`TrackingUpdate`] in the same transaction as the shipment write.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE shipment_status AS ENUM ('pending', 'confirmed', 'in_transit', 'delivered', 'cancelled');
///
/// CREATE TABLE shipments (
///     id BIGSERIAL PRIMARY KEY,
///     tracking_number VARCHAR(11) NOT NULL UNIQUE,
///     origin VARCHAR(255) NOT NULL,
///     destination VARCHAR(255) NOT NULL,
///     weight DOUBLE PRECISION NOT NULL CHECK (weight > 0),
///     zone_id BIGINT NOT NULL REFERENCES zones(id) ON DELETE RESTRICT,
///     status shipment_status NOT NULL DEFAULT 'pending',
///     customer_id BIGINT NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
///     driver_id BIGINT REFERENCES users(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use goexpress_shared::auth::authorization::Visibility;
/// use goexpress_shared::models::shipment::{CreateShipment, Shipment, ShipmentStatus};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let shipment = Shipment::create(
///     &pool,
///     3,
///     CreateShipment {
///         origin: "Warehouse A".to_string(),
///         destination: "Main St 1".to_string(),
///         weight: 4.0,
///         zone_id: 1,
///     },
/// )
/// .await?;
///
/// Shipment::update_status(
///     &pool,
///     shipment.id,
///     ShipmentStatus::InTransit,
///     Some("Hub North"),
///     Visibility::All,
/// )
/// .await?;
/// # Ok(())
/// # }
/// ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};

use super::tracking_update::TrackingUpdate;
use super::user::{User, UserRole};
use super::zone::Zone;
use crate::auth::authorization::Visibility;
use crate::error::{DomainError, DomainResult};
use crate::tracking_number;

/// Attempts at allocating an unused tracking number before giving up
const MAX_TRACKING_ATTEMPTS: u32 = 5;

/// Shipment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "shipment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    /// Created, not yet accepted
    Pending,

    /// Accepted for delivery
    Confirmed,

    /// On its way
    InTransit,

    /// Handed over (terminal)
    Delivered,

    /// Abandoned (terminal)
    Cancelled,
}

impl ShipmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentStatus::Pending => "pending",
            ShipmentStatus::Confirmed => "confirmed",
            ShipmentStatus::InTransit => "in_transit",
            ShipmentStatus::Delivered => "delivered",
            ShipmentStatus::Cancelled => "cancelled",
        }
    }

    /// Checks if status is terminal (no further changes)
    pub fn is_terminal(&self) -> bool {
        matches!(self, ShipmentStatus::Delivered | ShipmentStatus::Cancelled)
    }

    /// Position along the delivery path; cancelled is off the path
    fn stage(&self) -> Option<u8> {
        match self {
            ShipmentStatus::Pending => Some(0),
            ShipmentStatus::Confirmed => Some(1),
            ShipmentStatus::InTransit => Some(2),
            ShipmentStatus::Delivered => Some(3),
            ShipmentStatus::Cancelled => None,
        }
    }

    /// Checks if this status can move to `target`
    pub fn can_transition_to(&self, target: ShipmentStatus) -> bool {
        if self.is_terminal() {
            return false;
        }

        match (self.stage(), target.stage()) {
            (_, None) => true,
            (Some(current), Some(next)) => next >= current,
            (None, Some(_)) => false,
        }
    }
}

impl fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolves a requested status change
///
/// # Errors
///
/// `InvalidTransition` if `current` may not move to `requested`
pub fn transition(
    current: ShipmentStatus,
    requested: ShipmentStatus,
) -> DomainResult<ShipmentStatus> {
    if current.can_transition_to(requested) {
        Ok(requested)
    } else {
        Err(DomainError::InvalidTransition {
            from: current,
            to: requested,
        })
    }
}

/// Shipment model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Shipment {
    pub id: i64,

    /// `GEX` + 8 uppercase hex digits, unique and immutable
    pub tracking_number: String,

    pub origin: String,
    pub destination: String,

    /// Kilograms
    pub weight: f64,

    pub zone_id: i64,
    pub status: ShipmentStatus,

    /// User who created the shipment
    pub customer_id: i64,

    /// Assigned driver, if any
    pub driver_id: Option<i64>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a shipment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateShipment {
    pub origin: String,
    pub destination: String,
    pub weight: f64,
    pub zone_id: i64,
}

impl CreateShipment {
    /// Checks required fields and weight
    pub fn validate(&self) -> DomainResult<()> {
        if self.origin.trim().is_empty() {
            return Err(DomainError::InvalidArgument("Origin is required".to_string()));
        }
        if self.destination.trim().is_empty() {
            return Err(DomainError::InvalidArgument("Destination is required".to_string()));
        }
        if !self.weight.is_finite() || self.weight <= 0.0 {
            return Err(DomainError::InvalidArgument(
                "Weight must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// A shipment with its full history and current zone rate card
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentDetail {
    pub shipment: Shipment,

    /// Newest first
    pub tracking_updates: Vec<TrackingUpdate>,

    /// Current rate card (not a snapshot from creation time)
    pub zone: Zone,
}

impl Shipment {
    /// Creates a shipment and its initial `pending` tracking update
    ///
    /// Runs in one transaction: the zone is share-locked, a tracking number
    /// is allocated (regenerated on collision), the shipment is inserted, and
    /// the first event is appended with the origin as location.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for blank origin/destination or non-positive weight
    /// - `NotFound("Zone")` if the zone does not exist
    /// - `NotFound("User")` if the customer account no longer exists
    /// - `Conflict` if no unused tracking number could be allocated
    pub async fn create(
        pool: &PgPool,
        customer_id: i64,
        data: CreateShipment,
    ) -> DomainResult<Self> {
        data.validate()?;

        let mut tx = pool.begin().await?;

        Zone::find_for_share(&mut *tx, data.zone_id)
            .await?
            .ok_or(DomainError::NotFound("Zone"))?;

        let mut inserted = None;
        for attempt in 1..=MAX_TRACKING_ATTEMPTS {
            let tracking_number = tracking_number::generate();

            inserted = sqlx::query_as::<_, Shipment>(
                r#"
                INSERT INTO shipments (tracking_number, origin, destination, weight, zone_id, status, customer_id)
                VALUES ($1, $2, $3, $4, $5, 'pending', $6)
                ON CONFLICT (tracking_number) DO NOTHING
                RETURNING id, tracking_number, origin, destination, weight, zone_id, status,
                          customer_id, driver_id, created_at, updated_at
                "#,
            )
            .bind(&tracking_number)
            .bind(data.origin.trim())
            .bind(data.destination.trim())
            .bind(data.weight)
            .bind(data.zone_id)
            .bind(customer_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(DomainError::from_store)?;

            if inserted.is_some() {
                break;
            }

            tracing::warn!(attempt, %tracking_number, "Tracking number collision, regenerating");
        }

        let shipment = inserted.ok_or_else(|| {
            DomainError::Conflict("Could not allocate a unique tracking number".to_string())
        })?;

        TrackingUpdate::record(
            &mut *tx,
            shipment.id,
            ShipmentStatus::Pending,
            Some(&shipment.origin),
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            shipment_id = shipment.id,
            tracking_number = %shipment.tracking_number,
            customer_id,
            zone_id = shipment.zone_id,
            "Shipment created"
        );

        Ok(shipment)
    }

    /// Changes a shipment's status and appends the matching tracking update
    ///
    /// The shipment row is locked for the duration of the transaction, so
    /// concurrent updates are applied one after the other and each is checked
    /// against the status the previous one left behind.
    ///
    /// # Errors
    ///
    /// - `NotFound("Shipment")` if it does not exist or is hidden by `visibility`
    /// - `InvalidTransition` if the status change is not allowed
    pub async fn update_status(
        pool: &PgPool,
        id: i64,
        requested: ShipmentStatus,
        location: Option<&str>,
        visibility: Visibility,
    ) -> DomainResult<Self> {
        let mut tx = pool.begin().await?;

        let current = Self::lock(&mut *tx, id)
            .await?
            .filter(|s| visibility.permits_shipment(s.customer_id, s.driver_id))
            .ok_or(DomainError::NotFound("Shipment"))?;

        let next = transition(current.status, requested)?;

        let updated = sqlx::query_as::<_, Shipment>(
            r#"
            UPDATE shipments
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, tracking_number, origin, destination, weight, zone_id, status,
                      customer_id, driver_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(next)
        .fetch_one(&mut *tx)
        .await?;

        TrackingUpdate::record(&mut *tx, id, next, location).await?;

        tx.commit().await?;

        tracing::info!(
            shipment_id = id,
            from = %current.status,
            to = %next,
            "Shipment status updated"
        );

        Ok(updated)
    }

    /// Assigns a driver to a shipment
    ///
    /// # Errors
    ///
    /// - `NotFound("Shipment")` if the shipment does not exist
    /// - `NotFound("Driver")` if `driver_id` is not a user with the driver role
    /// - `Conflict` if the shipment is already delivered or cancelled
    pub async fn assign_driver(pool: &PgPool, id: i64, driver_id: i64) -> DomainResult<Self> {
        let mut tx = pool.begin().await?;

        let current = Self::lock(&mut *tx, id)
            .await?
            .ok_or(DomainError::NotFound("Shipment"))?;

        if current.status.is_terminal() {
            return Err(DomainError::Conflict(format!(
                "Cannot assign a driver to a {} shipment",
                current.status
            )));
        }

        User::find_by_id(&mut *tx, driver_id)
            .await?
            .filter(|user| user.role == UserRole::Driver)
            .ok_or(DomainError::NotFound("Driver"))?;

        let updated = sqlx::query_as::<_, Shipment>(
            r#"
            UPDATE shipments
            SET driver_id = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, tracking_number, origin, destination, weight, zone_id, status,
                      customer_id, driver_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(driver_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(shipment_id = id, driver_id, "Driver assigned");

        Ok(updated)
    }

    /// Finds a shipment by ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Shipment>(
            r#"
            SELECT id, tracking_number, origin, destination, weight, zone_id, status,
                   customer_id, driver_id, created_at, updated_at
            FROM shipments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds a shipment by tracking number
    pub async fn find_by_tracking_number(
        pool: &PgPool,
        tracking_number: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Shipment>(
            r#"
            SELECT id, tracking_number, origin, destination, weight, zone_id, status,
                   customer_id, driver_id, created_at, updated_at
            FROM shipments
            WHERE tracking_number = $1
            "#,
        )
        .bind(tracking_number)
        .fetch_optional(pool)
        .await
    }

    async fn lock<'e, E>(executor: E, id: i64) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Shipment>(
            r#"
            SELECT id, tracking_number, origin, destination, weight, zone_id, status,
                   customer_id, driver_id, created_at, updated_at
            FROM shipments
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Loads a visible shipment by ID
    ///
    /// # Errors
    ///
    /// `NotFound("Shipment")` if it does not exist or is hidden by `visibility`
    pub async fn find_visible(pool: &PgPool, id: i64, visibility: Visibility) -> DomainResult<Self> {
        Self::find_by_id(pool, id)
            .await?
            .filter(|s| visibility.permits_shipment(s.customer_id, s.driver_id))
            .ok_or(DomainError::NotFound("Shipment"))
    }

    /// Loads a visible shipment with its history and zone
    pub async fn detail(
        pool: &PgPool,
        id: i64,
        visibility: Visibility,
    ) -> DomainResult<ShipmentDetail> {
        let shipment = Self::find_visible(pool, id, visibility).await?;
        Self::with_history(pool, shipment).await
    }

    /// Public lookup by tracking number
    ///
    /// The format is checked before the store is queried.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if the tracking number is malformed
    /// - `NotFound("Shipment")` if no shipment carries it
    pub async fn detail_by_tracking_number(
        pool: &PgPool,
        tracking_number: &str,
    ) -> DomainResult<ShipmentDetail> {
        if !tracking_number::is_valid(tracking_number) {
            return Err(DomainError::InvalidArgument(
                "Invalid tracking number format".to_string(),
            ));
        }

        let shipment = Self::find_by_tracking_number(pool, tracking_number)
            .await?
            .ok_or(DomainError::NotFound("Shipment"))?;

        Self::with_history(pool, shipment).await
    }

    async fn with_history(pool: &PgPool, shipment: Shipment) -> DomainResult<ShipmentDetail> {
        let tracking_updates = TrackingUpdate::list_for_shipment(pool, shipment.id).await?;
        let zone = Zone::find_by_id(pool, shipment.zone_id)
            .await?
            .ok_or(DomainError::NotFound("Zone"))?;

        Ok(ShipmentDetail {
            shipment,
            tracking_updates,
            zone,
        })
    }

    /// History of a visible shipment, newest first
    pub async fn tracking_history(
        pool: &PgPool,
        id: i64,
        visibility: Visibility,
    ) -> DomainResult<Vec<TrackingUpdate>> {
        let shipment = Self::find_visible(pool, id, visibility).await?;
        Ok(TrackingUpdate::list_for_shipment(pool, shipment.id).await?)
    }

    /// Lists shipments visible under `visibility`, newest first
    pub async fn list(pool: &PgPool, visibility: Visibility) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Shipment>(
            r#"
            SELECT id, tracking_number, origin, destination, weight, zone_id, status,
                   customer_id, driver_id, created_at, updated_at
            FROM shipments
            WHERE ($1::BIGINT IS NULL OR customer_id = $1)
              AND ($2::BIGINT IS NULL OR driver_id = $2)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(visibility.customer_id())
        .bind(visibility.driver_id())
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ShipmentStatus::*;

    const ALL: [ShipmentStatus; 5] = [Pending, Confirmed, InTransit, Delivered, Cancelled];

    #[test]
    fn test_status_serialization() {
        assert_eq!(serde_json::to_string(&InTransit).unwrap(), "\"in_transit\"");
        assert_eq!(
            serde_json::from_str::<ShipmentStatus>("\"cancelled\"").unwrap(),
            Cancelled
        );
        assert!(serde_json::from_str::<ShipmentStatus>("\"lost\"").is_err());
    }

    #[test]
    fn test_forward_transitions() {
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(InTransit));
        assert!(Pending.can_transition_to(Delivered));
        assert!(Confirmed.can_transition_to(InTransit));
        assert!(InTransit.can_transition_to(Delivered));
    }

    #[test]
    fn test_repeat_reports() {
        assert!(Pending.can_transition_to(Pending));
        assert!(InTransit.can_transition_to(InTransit));
        assert!(!Delivered.can_transition_to(Delivered));
    }

    #[test]
    fn test_backward_transitions_rejected() {
        assert!(!Confirmed.can_transition_to(Pending));
        assert!(!InTransit.can_transition_to(Confirmed));
        assert!(!InTransit.can_transition_to(Pending));
    }

    #[test]
    fn test_cancel_from_any_non_terminal() {
        for status in [Pending, Confirmed, InTransit] {
            assert!(status.can_transition_to(Cancelled));
        }
    }

    #[test]
    fn test_terminal_states_reject_everything() {
        for terminal in [Delivered, Cancelled] {
            assert!(terminal.is_terminal());
            for target in ALL {
                assert!(matches!(
                    transition(terminal, target),
                    Err(DomainError::InvalidTransition { .. })
                ));
            }
        }
    }

    #[test]
    fn test_transition_returns_requested_status() {
        assert_eq!(transition(Pending, InTransit).unwrap(), InTransit);
        assert!(matches!(
            transition(Delivered, Pending),
            Err(DomainError::InvalidTransition { from: Delivered, to: Pending })
        ));
    }

    #[test]
    fn test_create_shipment_validation() {
        let valid = CreateShipment {
            origin: "A".to_string(),
            destination: "B".to_string(),
            weight: 4.0,
            zone_id: 1,
        };
        assert!(valid.validate().is_ok());

        let mut invalid = valid.clone();
        invalid.weight = 0.0;
        assert!(matches!(invalid.validate(), Err(DomainError::InvalidArgument(_))));

        let mut invalid = valid.clone();
        invalid.origin = " ".to_string();
        assert!(matches!(invalid.validate(), Err(DomainError::InvalidArgument(_))));

        let mut invalid = valid;
        invalid.destination = String::new();
        assert!(matches!(invalid.validate(), Err(DomainError::InvalidArgument(_))));
    }
}
