/// Authentication endpoints
///
/// - `POST /api/auth/register` - Create a client or driver account
/// - `POST /api/auth/login` - Exchange credentials for tokens
/// - `POST /api/auth/refresh` - Exchange a refresh token for a new access token
///
/// Sessions are stateless: logging out is discarding the tokens client-side.

use axum::{extract::State, http::StatusCode, Json};
use goexpress_shared::{
    auth::{
        authorization::{authorize, Action, Resource},
        jwt,
        middleware::Identity,
    },
    models::user::{CreateUser, User, UserRole},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{hash_password, normalize_email, verify_password};
use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
    extract::ValidJson,
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,

    /// `client` (default) or `driver`
    #[serde(default = "default_role")]
    pub role: UserRole,
}

fn default_role() -> UserRole {
    UserRole::Client
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Token pair and the account it belongs to
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// Access token
    pub token: String,

    pub refresh_token: String,

    pub user: User,
}

/// Refresh token request
#[derive(Debug, Deserialize, Validate)]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Refresh token response
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// New access token
    pub token: String,
}

fn issue_tokens(state: &AppState, user: User) -> ApiResult<AuthResponse> {
    let token = jwt::issue_access_token(
        user.id,
        &user.email,
        user.role,
        state.access_secret(),
        state.access_ttl(),
    )?;
    let refresh_token = jwt::issue_refresh_token(
        user.id,
        &user.email,
        user.role,
        state.refresh_secret(),
        state.refresh_ttl(),
    )?;

    Ok(AuthResponse {
        token,
        refresh_token,
        user,
    })
}

/// Register a new account
///
/// Public registration creates clients and drivers only; administrators are
/// created by other administrators or by the `create-admin` tool.
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed (including `role: "admin"`)
/// - `409 Conflict`: Email already exists
pub async fn register(
    State(state): State<AppState>,
    identity: Identity,
    ValidJson(req): ValidJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    authorize(identity.context(), Resource::Session, Action::Create)?;

    if req.role == UserRole::Admin {
        return Err(ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "role".to_string(),
            message: "Role must be client or driver".to_string(),
        }]));
    }

    let password_hash = hash_password(req.password).await?;

    let user = User::create(
        &state.db,
        CreateUser {
            name: req.name.trim().to_string(),
            email: normalize_email(&req.email),
            password_hash,
            role: req.role,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, role = %user.role, "User registered");

    Ok((StatusCode::CREATED, Json(issue_tokens(&state, user)?)))
}

/// Login with email and password
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `401 Unauthorized`: Unknown email or wrong password (same message for both)
pub async fn login(
    State(state): State<AppState>,
    identity: Identity,
    ValidJson(req): ValidJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    authorize(identity.context(), Resource::Session, Action::Read)?;

    let user = User::find_by_email(&state.db, &normalize_email(&req.email))
        .await?
        .ok_or_else(|| ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

    if !verify_password(req.password, user.password_hash.clone()).await? {
        tracing::debug!(user_id = user.id, "Login rejected: wrong password");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    tracing::info!(user_id = user.id, "User logged in");

    Ok(Json(issue_tokens(&state, user)?))
}

/// Exchange a refresh token for a new access token
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid, expired, or non-refresh token
pub async fn refresh(
    State(state): State<AppState>,
    identity: Identity,
    ValidJson(req): ValidJson<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    authorize(identity.context(), Resource::Session, Action::Update)?;

    let token = jwt::refresh_access_token(
        &req.refresh_token,
        state.refresh_secret(),
        state.access_secret(),
        state.access_ttl(),
    )?;

    Ok(Json(RefreshResponse { token }))
}
