/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: Access/refresh token issuing and verification
/// - [`middleware`]: Request identity extraction for Axum
/// - [`authorization`]: Declarative role × resource × action policy
///
/// # Example
///
/// ```no_run
/// use goexpress_shared::auth::password::{hash_password, verify_password};
/// use goexpress_shared::auth::jwt::issue_access_token;
/// use goexpress_shared::models::user::UserRole;
/// use chrono::Duration;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let token = issue_access_token(1, "a@example.com", UserRole::Client, "secret-key", Duration::hours(24))?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
