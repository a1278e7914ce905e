/// Shipping quotes
///
/// A quote is `weight * zone.price_per_kg` using native floating-point
/// multiplication. No rounding or currency rules are applied.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::error::{DomainError, DomainResult};
use crate::models::zone::Zone;

/// Price quote for a weight shipped within a zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub weight: f64,
    pub zone_id: i64,
    pub zone_name: String,
    pub price_per_kg: f64,
    pub total_price: f64,
}

impl Quote {
    /// Computes a quote against an already loaded zone
    pub fn compute(weight: f64, zone: &Zone) -> DomainResult<Self> {
        if !weight.is_finite() || weight <= 0.0 {
            return Err(DomainError::InvalidArgument(
                "Weight must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            weight,
            zone_id: zone.id,
            zone_name: zone.name.clone(),
            price_per_kg: zone.price_per_kg,
            total_price: weight * zone.price_per_kg,
        })
    }

    /// Loads the zone and computes a quote
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if weight is not positive
    /// - `NotFound("Zone")` if the zone does not exist
    pub async fn for_zone(pool: &PgPool, weight: f64, zone_id: i64) -> DomainResult<Self> {
        let zone = Zone::find_by_id(pool, zone_id)
            .await?
            .ok_or(DomainError::NotFound("Zone"))?;

        Self::compute(weight, &zone)
    }
}
