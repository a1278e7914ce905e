/// Request identity for Axum handlers
///
/// Identity is optional on every route: public operations (login, zone
/// listing, tracking lookups) are served to anonymous callers, and the
/// authorization policy decides what an anonymous caller may do. The router
/// runs [`authenticate`] once per request and stores the resulting
/// [`AuthContext`] in the request extensions; handlers read it back with the
/// [`Identity`] extractor.
///
/// [`authenticate`] reports a malformed or expired token as an error; the
/// router treats such a request as anonymous, so only protected operations
/// answer it with 401.
///
/// # Example
///
/// ```no_run
/// use goexpress_shared::auth::middleware::Identity;
///
/// async fn handler(Identity(auth): Identity) -> String {
///     match auth {
///         Some(auth) => format!("Hello, user {}!", auth.user_id),
///         None => "Hello, stranger!".to_string(),
///     }
/// }
/// ```

use std::convert::Infallible;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use serde::{Deserialize, Serialize};

use super::jwt::{verify_access_token, Claims, JwtError};
use crate::models::user::UserRole;

/// Authenticated caller, decoded from access token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: i64,

    /// Email at token issue time
    pub email: String,

    /// Role at token issue time
    pub role: UserRole,
}

impl AuthContext {
    pub fn new(user_id: i64, email: impl Into<String>, role: UserRole) -> Self {
        Self {
            user_id,
            email: email.into(),
            role,
        }
    }

    /// Creates auth context from verified claims
    pub fn from_claims(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            role: claims.role,
        }
    }
}

/// Error type for request authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Authorization header is not `Bearer <token>`
    #[error("Expected Bearer token")]
    InvalidFormat,

    /// Token has expired
    #[error("Token expired")]
    Expired,

    /// Token failed verification
    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::Expired,
            other => AuthError::InvalidToken(other.to_string()),
        }
    }
}

/// Extracts the bearer token from request headers
///
/// Returns `Ok(None)` when there is no `Authorization` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, AuthError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let value = value.to_str().map_err(|_| AuthError::InvalidFormat)?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(Some)
        .ok_or(AuthError::InvalidFormat)
}

/// Authenticates a request from its headers
///
/// # Returns
///
/// - `Ok(None)` for anonymous requests
/// - `Ok(Some(context))` for requests with a valid access token
///
/// # Errors
///
/// Returns `AuthError` if a token is present but unusable
pub fn authenticate(headers: &HeaderMap, secret: &str) -> Result<Option<AuthContext>, AuthError> {
    let Some(token) = bearer_token(headers)? else {
        return Ok(None);
    };

    let claims = verify_access_token(token, secret)?;
    Ok(Some(AuthContext::from_claims(claims)))
}

/// Optional caller identity, as stored by the authentication layer
#[derive(Debug, Clone)]
pub struct Identity(pub Option<AuthContext>);

impl Identity {
    pub fn context(&self) -> Option<&AuthContext> {
        self.0.as_ref()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Identity(parts.extensions.get::<AuthContext>().cloned()))
    }
}
