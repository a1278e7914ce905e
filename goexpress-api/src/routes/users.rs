/// User management and self-service account endpoints
///
/// Administrators manage every account under `/api/users`; any signed-in
/// user may read and edit their own profile and change their password.
/// Roles never change after creation.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use goexpress_shared::{
    auth::{
        authorization::{authorize, Action, Resource},
        middleware::Identity,
    },
    models::user::{CreateUser, User, UserRole, UserStats},
};
use serde::Deserialize;
use serde_json::{json, Value};
use validator::Validate;

use super::{caller, hash_password, normalize_email, verify_password};
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ValidJson,
};

/// Query parameters for listing users
#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    pub role: Option<UserRole>,
}

/// Admin-created account of any role
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,

    pub role: UserRole,
}

/// Name and email update, for profiles and admin edits alike
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub new_password: String,

    #[validate(must_match(other = "new_password", message = "Passwords do not match"))]
    pub confirm_password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub new_password: String,
}

fn user_not_found() -> ApiError {
    ApiError::NotFound("User not found".to_string())
}

pub async fn list_users(
    State(state): State<AppState>,
    identity: Identity,
    Query(query): Query<ListUsersQuery>,
) -> ApiResult<Json<Vec<User>>> {
    authorize(identity.context(), Resource::User { target: None }, Action::List)?;
    Ok(Json(User::list(&state.db, query.role).await?))
}

/// Create a user with any role
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `409 Conflict`: Email already exists
pub async fn create_user(
    State(state): State<AppState>,
    identity: Identity,
    ValidJson(req): ValidJson<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    authorize(identity.context(), Resource::User { target: None }, Action::Create)?;

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

    tracing::info!(user_id = user.id, role = %user.role, "User created by admin");

    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn user_stats(
    State(state): State<AppState>,
    identity: Identity,
) -> ApiResult<Json<UserStats>> {
    authorize(identity.context(), Resource::Statistics, Action::Read)?;
    Ok(Json(User::stats(&state.db).await?))
}

pub async fn get_profile(
    State(state): State<AppState>,
    identity: Identity,
) -> ApiResult<Json<User>> {
    authorize(identity.context(), Resource::Account, Action::Read)?;
    let me = caller(&identity)?;

    User::find_by_id(&state.db, me.user_id)
        .await?
        .map(Json)
        .ok_or_else(user_not_found)
}

/// Update the caller's name and email
///
/// # Errors
///
/// - `409 Conflict`: Email belongs to another account
pub async fn update_profile(
    State(state): State<AppState>,
    identity: Identity,
    ValidJson(req): ValidJson<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    authorize(identity.context(), Resource::Account, Action::Update)?;
    let me = caller(&identity)?;

    User::update_details(&state.db, me.user_id, req.name.trim(), &normalize_email(&req.email))
        .await?
        .map(Json)
        .ok_or_else(user_not_found)
}

/// Change the caller's password
///
/// # Errors
///
/// - `400 Bad Request`: New password too short or confirmation mismatch
/// - `401 Unauthorized`: Current password is wrong
pub async fn change_password(
    State(state): State<AppState>,
    identity: Identity,
    ValidJson(req): ValidJson<ChangePasswordRequest>,
) -> ApiResult<Json<Value>> {
    authorize(identity.context(), Resource::Account, Action::Update)?;
    let me = caller(&identity)?;

    let user = User::find_by_id(&state.db, me.user_id)
        .await?
        .ok_or_else(user_not_found)?;

    if !verify_password(req.current_password, user.password_hash).await? {
        return Err(ApiError::Unauthorized("Current password is incorrect".to_string()));
    }

    let password_hash = hash_password(req.new_password).await?;
    if !User::update_password(&state.db, user.id, &password_hash).await? {
        return Err(user_not_found());
    }

    tracing::info!(user_id = user.id, "Password changed");

    Ok(Json(json!({ "message": "Password changed successfully" })))
}

pub async fn update_user(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i64>,
    ValidJson(req): ValidJson<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    authorize(identity.context(), Resource::User { target: Some(id) }, Action::Update)?;

    User::update_details(&state.db, id, req.name.trim(), &normalize_email(&req.email))
        .await?
        .map(Json)
        .ok_or_else(user_not_found)
}

/// Delete a user
///
/// # Errors
///
/// - `403 Forbidden`: Caller targets their own account
/// - `404 Not Found`: No such user
/// - `409 Conflict`: The user still owns shipments
pub async fn delete_user(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    authorize(identity.context(), Resource::User { target: Some(id) }, Action::Delete)?;

    if !User::delete(&state.db, id).await? {
        return Err(user_not_found());
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn reset_password(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i64>,
    ValidJson(req): ValidJson<ResetPasswordRequest>,
) -> ApiResult<Json<Value>> {
    authorize(identity.context(), Resource::User { target: Some(id) }, Action::Update)?;

    let password_hash = hash_password(req.new_password).await?;
    if !User::update_password(&state.db, id, &password_hash).await? {
        return Err(user_not_found());
    }

    tracing::info!(user_id = id, "Password reset by admin");

    Ok(Json(json!({ "message": "Password reset successfully" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_password_requires_matching_confirmation() {
        let req = ChangePasswordRequest {
            current_password: "secret1".to_string(),
            new_password: "secret2".to_string(),
            confirm_password: "secret3".to_string(),
        };

        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("confirm_password"));
    }

    #[test]
    fn test_change_password_rejects_short_password() {
        let req = ChangePasswordRequest {
            current_password: "secret1".to_string(),
            new_password: "abc".to_string(),
            confirm_password: "abc".to_string(),
        };

        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("new_password"));
        assert!(!errors.field_errors().contains_key("confirm_password"));
    }

    #[test]
    fn test_list_query_role_filter() {
        let query: ListUsersQuery = serde_json::from_str(r#"{"role": "driver"}"#).unwrap();
        assert_eq!(query.role, Some(UserRole::Driver));
        assert_eq!(ListUsersQuery::default().role, None);
    }
}
