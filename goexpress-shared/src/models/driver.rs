/// Driver model and database operations
///
/// A driver is a user with the driver role; the optional `driver_profiles`
/// row adds vehicle and availability details. Drivers are keyed by their
/// user ID. A driver without a profile row is still listed, with default
/// profile values.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};

use super::user::{CreateUser, User, UserRole};
use crate::auth::authorization::Visibility;
use crate::error::{DomainError, DomainResult};

/// Driver availability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "driver_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DriverStatus {
    #[default]
    Available,
    Busy,
    Offline,
}

impl DriverStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriverStatus::Available => "available",
            DriverStatus::Busy => "busy",
            DriverStatus::Offline => "offline",
        }
    }
}

impl fmt::Display for DriverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Driver read view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Driver {
    /// User ID
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub license_number: Option<String>,
    pub vehicle_type: Option<String>,
    pub vehicle_number: Option<String>,
    pub status: DriverStatus,
    pub current_location: Option<String>,
    pub rating: f64,

    /// Delivered shipments assigned to this driver
    pub total_deliveries: i64,

    /// All shipments assigned to this driver
    pub assigned_shipments: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a driver account with its profile
#[derive(Debug, Clone)]
pub struct CreateDriver {
    pub name: String,
    pub email: String,

    /// Argon2id password hash
    pub password_hash: String,

    pub profile: DriverProfile,
}

/// Editable profile fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriverProfile {
    pub phone: Option<String>,
    pub license_number: Option<String>,
    pub vehicle_type: Option<String>,
    pub vehicle_number: Option<String>,
    #[serde(default)]
    pub status: DriverStatus,
    pub current_location: Option<String>,
}

/// Driver statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DriverStats {
    pub total_drivers: i64,
    pub available_drivers: i64,
    pub busy_drivers: i64,
    pub offline_drivers: i64,
    pub total_deliveries: i64,
    pub average_rating: f64,
}

const DRIVER_VIEW: &str = r#"
    SELECT
        u.id, u.name, u.email,
        p.phone, p.license_number, p.vehicle_type, p.vehicle_number,
        COALESCE(p.status, 'available'::driver_status) AS status,
        p.current_location,
        COALESCE(p.rating, 0::DOUBLE PRECISION) AS rating,
        (SELECT COUNT(*) FROM shipments s
          WHERE s.driver_id = u.id AND s.status = 'delivered') AS total_deliveries,
        (SELECT COUNT(*) FROM shipments s WHERE s.driver_id = u.id) AS assigned_shipments,
        u.created_at, u.updated_at
    FROM users u
    LEFT JOIN driver_profiles p ON p.user_id = u.id
    WHERE u.role = 'driver'
"#;

impl Driver {
    /// Creates a driver user and profile in one transaction
    ///
    /// # Errors
    ///
    /// `Conflict` if the email is already registered
    pub async fn create(pool: &PgPool, data: CreateDriver) -> DomainResult<Self> {
        let mut tx = pool.begin().await?;

        let user = User::create(
            &mut *tx,
            CreateUser {
                name: data.name,
                email: data.email,
                password_hash: data.password_hash,
                role: UserRole::Driver,
            },
        )
        .await
        .map_err(DomainError::from_store)?;

        upsert_profile(&mut *tx, user.id, &data.profile).await?;

        tx.commit().await?;

        tracing::info!(driver_id = user.id, "Driver created");

        Self::find_by_id(pool, user.id)
            .await?
            .ok_or(DomainError::NotFound("Driver"))
    }

    /// Finds a driver by user ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Driver>(&format!("{DRIVER_VIEW} AND u.id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Loads a driver the caller may see
    ///
    /// # Errors
    ///
    /// `NotFound("Driver")` if it does not exist or is someone else
    pub async fn find_visible(pool: &PgPool, id: i64, visibility: Visibility) -> DomainResult<Self> {
        Self::find_by_id(pool, id)
            .await?
            .filter(|d| visibility.permits_owner(d.id))
            .ok_or(DomainError::NotFound("Driver"))
    }

    /// Lists drivers, newest first, optionally filtered by status
    pub async fn list(pool: &PgPool, status: Option<DriverStatus>) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Driver>(&format!(
            r#"
            {DRIVER_VIEW}
              AND ($1::driver_status IS NULL OR COALESCE(p.status, 'available'::driver_status) = $1)
            ORDER BY u.created_at DESC, u.id DESC
            "#
        ))
        .bind(status)
        .fetch_all(pool)
        .await
    }

    /// Updates a driver's name, email and profile
    ///
    /// The profile row is created if the driver has none yet.
    ///
    /// # Errors
    ///
    /// - `NotFound("Driver")` if no driver has this ID
    /// - `Conflict` if the email belongs to another user
    pub async fn update(
        pool: &PgPool,
        id: i64,
        name: &str,
        email: &str,
        profile: &DriverProfile,
    ) -> DomainResult<Self> {
        let mut tx = pool.begin().await?;

        User::find_by_id(&mut *tx, id)
            .await?
            .filter(|user| user.role == UserRole::Driver)
            .ok_or(DomainError::NotFound("Driver"))?;

        User::update_details(&mut *tx, id, name, email)
            .await
            .map_err(DomainError::from_store)?;

        upsert_profile(&mut *tx, id, profile).await?;

        tx.commit().await?;

        tracing::info!(driver_id = id, status = %profile.status, "Driver updated");

        Self::find_by_id(pool, id)
            .await?
            .ok_or(DomainError::NotFound("Driver"))
    }

    /// Deletes a driver account; the profile cascades and assigned shipments
    /// become unassigned
    ///
    /// # Errors
    ///
    /// - `NotFound("Driver")` if no driver has this ID
    /// - `Conflict` if the driver still owns shipments as customer
    pub async fn delete(pool: &PgPool, id: i64) -> DomainResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1 AND role = 'driver'")
            .bind(id)
            .execute(pool)
            .await
            .map_err(DomainError::from_store)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound("Driver"));
        }

        tracing::info!(driver_id = id, "Driver deleted");

        Ok(())
    }

    /// Aggregate statistics over all drivers
    pub async fn stats(pool: &PgPool) -> Result<DriverStats, sqlx::Error> {
        sqlx::query_as::<_, DriverStats>(
            r#"
            SELECT
                COUNT(*) AS total_drivers,
                COUNT(*) FILTER (WHERE COALESCE(p.status, 'available') = 'available') AS available_drivers,
                COUNT(*) FILTER (WHERE p.status = 'busy') AS busy_drivers,
                COUNT(*) FILTER (WHERE p.status = 'offline') AS offline_drivers,
                (SELECT COUNT(*) FROM shipments
                  WHERE driver_id IS NOT NULL AND status = 'delivered') AS total_deliveries,
                COALESCE(AVG(p.rating), 0::DOUBLE PRECISION) AS average_rating
            FROM users u
            LEFT JOIN driver_profiles p ON p.user_id = u.id
            WHERE u.role = 'driver'
            "#,
        )
        .fetch_one(pool)
        .await
    }
}

async fn upsert_profile<'e, E>(
    executor: E,
    user_id: i64,
    profile: &DriverProfile,
) -> Result<(), sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO driver_profiles (
            user_id, phone, license_number, vehicle_type, vehicle_number, status, current_location
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (user_id) DO UPDATE
        SET phone = EXCLUDED.phone,
            license_number = EXCLUDED.license_number,
            vehicle_type = EXCLUDED.vehicle_type,
            vehicle_number = EXCLUDED.vehicle_number,
            status = EXCLUDED.status,
            current_location = EXCLUDED.current_location,
            updated_at = NOW()
        "#,
    )
    .bind(user_id)
    .bind(&profile.phone)
    .bind(&profile.license_number)
    .bind(&profile.vehicle_type)
    .bind(&profile.vehicle_number)
    .bind(profile.status)
    .bind(&profile.current_location)
    .execute(executor)
    .await?;

    Ok(())
}
