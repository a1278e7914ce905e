/// Zone model and database operations
///
/// A zone is a named rate card: every shipment belongs to one and is priced
/// at `weight * price_per_kg`.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE zones (
///     id BIGSERIAL PRIMARY KEY,
///     name VARCHAR(255) NOT NULL CHECK (length(trim(name)) > 0),
///     price_per_kg DOUBLE PRECISION NOT NULL CHECK (price_per_kg > 0),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};

use crate::error::{DomainError, DomainResult};

/// Zone rate card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Zone {
    pub id: i64,
    pub name: String,
    pub price_per_kg: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating or replacing a zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneInput {
    pub name: String,
    pub price_per_kg: f64,
}

impl ZoneInput {
    /// Checks the catalog constraints
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the name is blank or the price is not positive
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidArgument("Zone name is required".to_string()));
        }

        if !self.price_per_kg.is_finite() || self.price_per_kg <= 0.0 {
            return Err(DomainError::InvalidArgument(
                "Price per kg must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Zone {
    /// Creates a zone
    pub async fn create(pool: &PgPool, data: ZoneInput) -> DomainResult<Self> {
        data.validate()?;

        let zone = sqlx::query_as::<_, Zone>(
            r#"
            INSERT INTO zones (name, price_per_kg)
            VALUES ($1, $2)
            RETURNING id, name, price_per_kg, created_at, updated_at
            "#,
        )
        .bind(data.name.trim())
        .bind(data.price_per_kg)
        .fetch_one(pool)
        .await?;

        tracing::info!(zone_id = zone.id, name = %zone.name, "Zone created");

        Ok(zone)
    }

    /// Finds a zone by ID
    pub async fn find_by_id<'e, E>(executor: E, id: i64) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Zone>(
            r#"
            SELECT id, name, price_per_kg, created_at, updated_at
            FROM zones
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Finds a zone and holds a share lock on it until the transaction ends
    ///
    /// Prevents the zone from being deleted while a shipment referencing it
    /// is being created.
    pub async fn find_for_share<'e, E>(executor: E, id: i64) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Zone>(
            r#"
            SELECT id, name, price_per_kg, created_at, updated_at
            FROM zones
            WHERE id = $1
            FOR SHARE
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Lists all zones ordered by name
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Zone>(
            r#"
            SELECT id, name, price_per_kg, created_at, updated_at
            FROM zones
            ORDER BY name, id
            "#,
        )
        .fetch_all(pool)
        .await
    }

    /// Replaces a zone's name and price
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if the input violates catalog constraints
    /// - `NotFound("Zone")` if the zone does not exist
    pub async fn update(pool: &PgPool, id: i64, data: ZoneInput) -> DomainResult<Self> {
        data.validate()?;

        sqlx::query_as::<_, Zone>(
            r#"
            UPDATE zones
            SET name = $2, price_per_kg = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, price_per_kg, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.name.trim())
        .bind(data.price_per_kg)
        .fetch_optional(pool)
        .await?
        .ok_or(DomainError::NotFound("Zone"))
    }

    /// Deletes a zone
    ///
    /// # Errors
    ///
    /// - `NotFound("Zone")` if the zone does not exist
    /// - `Conflict` if shipments still reference the zone
    pub async fn delete(pool: &PgPool, id: i64) -> DomainResult<()> {
        let result = sqlx::query("DELETE FROM zones WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .map_err(|err| match DomainError::from_store(err) {
                DomainError::Conflict(_) => {
                    DomainError::Conflict("Zone is referenced by existing shipments".to_string())
                }
                other => other,
            })?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound("Zone"));
        }

        tracing::info!(zone_id = id, "Zone deleted");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_input_validation() {
        let valid = ZoneInput {
            name: "Local".to_string(),
            price_per_kg: 2.5,
        };
        assert!(valid.validate().is_ok());

        let blank = ZoneInput {
            name: "   ".to_string(),
            price_per_kg: 2.5,
        };
        assert!(matches!(blank.validate(), Err(DomainError::InvalidArgument(_))));

        for price in [0.0, -1.0, f64::INFINITY, f64::NAN] {
            let input = ZoneInput {
                name: "Local".to_string(),
                price_per_kg: price,
            };
            assert!(matches!(input.validate(), Err(DomainError::InvalidArgument(_))));
        }
    }
}
