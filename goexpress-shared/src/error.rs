/// Domain error taxonomy
///
/// Lifecycle and profile operations that do more than a single query return
/// `DomainError` so callers can distinguish a missing zone from a store
/// failure without inspecting SQL error codes.
///
/// Unique and foreign-key violations raised by PostgreSQL are translated to
/// `Conflict` by [`DomainError::from_store`], except a shipment whose
/// customer account no longer exists, which is `NotFound("User")`.
/// Everything else stays a `Store` error and surfaces as an internal failure.

use crate::models::shipment::ShipmentStatus;

/// PostgreSQL SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL SQLSTATE for foreign_key_violation
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Errors produced by the domain layer
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    /// Malformed input rejected before any store access
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Referenced entity does not exist (or is hidden from the caller)
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Uniqueness or referential conflict
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Requested status change is not allowed from the current status
    #[error("Cannot change shipment status from {from} to {to}")]
    InvalidTransition {
        from: ShipmentStatus,
        to: ShipmentStatus,
    },

    /// Unexpected persistence failure
    #[error("Store error: {0}")]
    Store(#[from] sqlx::Error),
}

impl DomainError {
    /// Translates constraint violations into `Conflict`
    ///
    /// Other errors are wrapped as `Store`.
    pub fn from_store(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.code().as_deref() {
                Some(UNIQUE_VIOLATION) => {
                    let what = db_err.constraint().unwrap_or("unique constraint");
                    return DomainError::Conflict(format!("{} already exists", conflict_subject(what)));
                }
                Some(FOREIGN_KEY_VIOLATION) => {
                    return foreign_key_error(db_err.constraint());
                }
                _ => {}
            }
        }

        DomainError::Store(err)
    }
}

/// Maps a foreign-key violation to the referenced entity when it is the
/// caller's own account, otherwise to `Conflict`
fn foreign_key_error(constraint: Option<&str>) -> DomainError {
    match constraint {
        Some("shipments_customer_id_fkey") => DomainError::NotFound("User"),
        _ => DomainError::Conflict("Resource is still referenced by other records".to_string()),
    }
}

/// Maps a constraint name to the user-facing subject of a conflict
fn conflict_subject(constraint: &str) -> &'static str {
    match constraint {
        "users_email_key" => "Email",
        "shipments_tracking_number_key" => "Tracking number",
        "customers_user_id_key" => "Customer profile",
        "driver_profiles_user_id_key" => "Driver profile",
        _ => "Record",
    }
}

/// Result alias for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
