/// Session token issuing and verification
///
/// Tokens are HS256-signed JWTs whose claims carry the user id, email and
/// role. Access and refresh tokens share the same claim shape but are signed
/// with different secrets, so a leaked access secret cannot mint refresh
/// tokens and an access token never verifies as a refresh token.
///
/// # Token Types
///
/// - **Access Token**: Short-lived (24h by default), sent as `Authorization: Bearer`
/// - **Refresh Token**: Long-lived (7d by default), exchanged for a new access token
///
/// Tokens are stateless. There is no revocation list; logout is a client-side
/// discard.
///
/// # Example
///
/// ```
/// use goexpress_shared::auth::jwt::{issue_access_token, verify_access_token};
/// use goexpress_shared::models::user::UserRole;
/// use chrono::Duration;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "access-secret-at-least-32-bytes-long!!";
/// let token = issue_access_token(42, "ana@example.com", UserRole::Client, secret, Duration::hours(1))?;
///
/// let claims = verify_access_token(&token, secret)?;
/// assert_eq!(claims.sub, 42);
/// assert_eq!(claims.role, UserRole::Client);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::models::user::UserRole;

/// Issuer written into and required from every token
pub const ISSUER: &str = "goexpress";

/// Error type for token operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Signature, format or issuer check failed
    #[error("Invalid token: {0}")]
    InvalidSignature(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Token verified but is of the wrong kind
    #[error("Expected {expected} token, got {actual} token")]
    WrongTokenType {
        expected: &'static str,
        actual: &'static str,
    },
}

/// Token type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Access token (short-lived)
    Access,

    /// Refresh token (long-lived)
    Refresh,
}

impl TokenType {
    /// Gets default expiration duration for token type
    pub fn default_expiration(&self) -> Duration {
        match self {
            TokenType::Access => Duration::hours(24),
            TokenType::Refresh => Duration::days(7),
        }
    }

    /// Gets token type as string
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

/// JWT claims structure
///
/// # Standard Claims
///
/// - `sub`: Subject (user ID)
/// - `iss`: Issuer (always "goexpress")
/// - `iat`: Issued at timestamp
/// - `exp`: Expiration timestamp
/// - `nbf`: Not before timestamp
///
/// # Custom Claims
///
/// - `email`: Email address at issue time
/// - `role`: Role at issue time
/// - `token_type`: Access or refresh token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - User ID
    pub sub: i64,

    /// Email address of the user
    pub email: String,

    /// Role of the user
    pub role: UserRole,

    /// Issuer - Always "goexpress"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// Token type (custom claim)
    pub token_type: TokenType,
}

impl Claims {
    /// Creates new claims with the default expiration for the token type
    pub fn new(user_id: i64, email: impl Into<String>, role: UserRole, token_type: TokenType) -> Self {
        Self::with_expiration(user_id, email, role, token_type, token_type.default_expiration())
    }

    /// Creates claims with custom expiration
    ///
    /// # Example
    ///
    /// ```
    /// use goexpress_shared::auth::jwt::{Claims, TokenType};
    /// use goexpress_shared::models::user::UserRole;
    /// use chrono::Duration;
    ///
    /// let claims = Claims::with_expiration(
    ///     1,
    ///     "driver@example.com",
    ///     UserRole::Driver,
    ///     TokenType::Access,
    ///     Duration::minutes(15),
    /// );
    /// assert_eq!(claims.exp - claims.iat, 15 * 60);
    /// ```
    pub fn with_expiration(
        user_id: i64,
        email: impl Into<String>,
        role: UserRole,
        token_type: TokenType,
        expires_in: Duration,
    ) -> Self {
        let now = Utc::now();
        let expiration = now + expires_in;

        Self {
            sub: user_id,
            email: email.into(),
            role,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            nbf: now.timestamp(),
            token_type,
        }
    }
}

/// Creates a signed JWT from claims
///
/// # Errors
///
/// Returns `JwtError::CreateError` if token creation fails
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Verifies a JWT and extracts its claims
///
/// Verifies:
/// - Signature is valid for `secret`
/// - Token hasn't expired
/// - Issuer is "goexpress"
/// - Token is not used before nbf time
///
/// # Errors
///
/// - `JwtError::Expired` if the expiration has passed
/// - `JwtError::InvalidSignature` for any other failure
pub fn verify(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        _ => JwtError::InvalidSignature(e.to_string()),
    })?;

    Ok(token_data.claims)
}

/// Verifies a token and checks it's an access token
pub fn verify_access_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    verify_kind(token, secret, TokenType::Access)
}

/// Verifies a token and checks it's a refresh token
pub fn verify_refresh_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    verify_kind(token, secret, TokenType::Refresh)
}

fn verify_kind(token: &str, secret: &str, expected: TokenType) -> Result<Claims, JwtError> {
    let claims = verify(token, secret)?;

    if claims.token_type != expected {
        return Err(JwtError::WrongTokenType {
            expected: expected.as_str(),
            actual: claims.token_type.as_str(),
        });
    }

    Ok(claims)
}

/// Issues a short-lived access token
pub fn issue_access_token(
    user_id: i64,
    email: &str,
    role: UserRole,
    secret: &str,
    ttl: Duration,
) -> Result<String, JwtError> {
    let claims = Claims::with_expiration(user_id, email, role, TokenType::Access, ttl);
    create_token(&claims, secret)
}

/// Issues a long-lived refresh token
///
/// `secret` must be the refresh secret, not the access secret.
pub fn issue_refresh_token(
    user_id: i64,
    email: &str,
    role: UserRole,
    secret: &str,
    ttl: Duration,
) -> Result<String, JwtError> {
    let claims = Claims::with_expiration(user_id, email, role, TokenType::Refresh, ttl);
    create_token(&claims, secret)
}

/// Exchanges a refresh token for a new access token
///
/// The new access token carries the same identity claims as the refresh
/// token.
///
/// # Errors
///
/// Returns error if the refresh token is invalid, expired, or is not a
/// refresh token
pub fn refresh_access_token(
    refresh_token: &str,
    refresh_secret: &str,
    access_secret: &str,
    access_ttl: Duration,
) -> Result<String, JwtError> {
    let refresh_claims = verify_refresh_token(refresh_token, refresh_secret)?;

    issue_access_token(
        refresh_claims.sub,
        &refresh_claims.email,
        refresh_claims.role,
        access_secret,
        access_ttl,
    )
}
