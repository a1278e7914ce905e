/// API route handlers
///
/// Handlers follow one shape: resolve the caller's [`Identity`], ask the
/// authorization policy for a visibility, then call into the shared models
/// with it. The policy check always happens before any database access.
///
/// - `health`: Welcome and health check
/// - `auth`: Registration, login and token refresh
/// - `zones`: Zone catalog
/// - `quote`: Price quotes
/// - `shipments`: Shipment lifecycle and tracking
/// - `users`: Account and user management
/// - `customers`: Customer profiles and addresses
/// - `drivers`: Driver profiles

pub mod auth;
pub mod customers;
pub mod drivers;
pub mod health;
pub mod quote;
pub mod shipments;
pub mod users;
pub mod zones;

use goexpress_shared::auth::middleware::{AuthContext, Identity};
use goexpress_shared::auth::password;

use crate::error::{ApiError, ApiResult};

/// The authenticated caller
///
/// Only call after a non-public policy check has passed.
pub(crate) fn caller(identity: &Identity) -> ApiResult<&AuthContext> {
    identity
        .context()
        .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))
}

/// Emails are compared case-insensitively
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Hashes a password off the async runtime
pub(crate) async fn hash_password(plain: String) -> ApiResult<String> {
    tokio::task::spawn_blocking(move || password::hash_password(&plain))
        .await
        .map_err(|e| ApiError::InternalError(format!("Password hashing task failed: {}", e)))?
        .map_err(ApiError::from)
}

/// Verifies a password off the async runtime
pub(crate) async fn verify_password(plain: String, hash: String) -> ApiResult<bool> {
    tokio::task::spawn_blocking(move || password::verify_password(&plain, &hash))
        .await
        .map_err(|e| ApiError::InternalError(format!("Password verification task failed: {}", e)))?
        .map_err(ApiError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use goexpress_shared::models::user::UserRole;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ana@Example.COM "), "ana@example.com");
    }

    #[test]
    fn test_caller_requires_identity() {
        assert!(matches!(caller(&Identity(None)), Err(ApiError::Unauthorized(_))));

        let identity = Identity(Some(AuthContext::new(5, "a@example.com", UserRole::Client)));
        assert_eq!(caller(&identity).unwrap().user_id, 5);
    }

    #[tokio::test]
    async fn test_password_helpers_round_trip() {
        let hash = hash_password("secret1".to_string()).await.unwrap();
        assert!(verify_password("secret1".to_string(), hash.clone()).await.unwrap());
        assert!(!verify_password("secret2".to_string(), hash).await.unwrap());
    }
}
