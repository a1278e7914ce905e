/// Driver endpoints, keyed by the driver's user ID

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use goexpress_shared::{
    auth::{
        authorization::{authorize, Action, Resource, Visibility},
        middleware::Identity,
    },
    models::{
        driver::{CreateDriver, Driver, DriverProfile, DriverStats, DriverStatus},
        shipment::Shipment,
    },
};
use serde::Deserialize;
use validator::Validate;

use super::{hash_password, normalize_email};
use crate::{app::AppState, error::ApiResult, extract::ValidJson};

#[derive(Debug, Default, Deserialize)]
pub struct ListDriversQuery {
    pub status: Option<DriverStatus>,
}

/// Profile fields shared by create and update
#[derive(Debug, Default, Deserialize, Validate)]
pub struct DriverProfileRequest {
    #[validate(length(max = 50))]
    pub phone: Option<String>,

    #[validate(length(max = 100))]
    pub license_number: Option<String>,

    #[validate(length(max = 50))]
    pub vehicle_type: Option<String>,

    #[validate(length(max = 50))]
    pub vehicle_number: Option<String>,

    #[serde(default)]
    pub status: DriverStatus,

    #[validate(length(max = 255))]
    pub current_location: Option<String>,
}

impl From<DriverProfileRequest> for DriverProfile {
    fn from(req: DriverProfileRequest) -> Self {
        DriverProfile {
            phone: req.phone,
            license_number: req.license_number,
            vehicle_type: req.vehicle_type,
            vehicle_number: req.vehicle_number,
            status: req.status,
            current_location: req.current_location,
        }
    }
}

/// New driver account with its profile
#[derive(Debug, Deserialize, Validate)]
pub struct CreateDriverRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,

    #[serde(flatten)]
    #[validate(nested)]
    pub profile: DriverProfileRequest,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateDriverRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[serde(flatten)]
    #[validate(nested)]
    pub profile: DriverProfileRequest,
}

pub async fn list_drivers(
    State(state): State<AppState>,
    identity: Identity,
    Query(query): Query<ListDriversQuery>,
) -> ApiResult<Json<Vec<Driver>>> {
    authorize(identity.context(), Resource::Driver, Action::List)?;
    Ok(Json(Driver::list(&state.db, query.status).await?))
}

/// Create a driver account and profile together
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `409 Conflict`: Email already exists
pub async fn create_driver(
    State(state): State<AppState>,
    identity: Identity,
    ValidJson(req): ValidJson<CreateDriverRequest>,
) -> ApiResult<(StatusCode, Json<Driver>)> {
    authorize(identity.context(), Resource::Driver, Action::Create)?;

    let password_hash = hash_password(req.password).await?;

    let driver = Driver::create(
        &state.db,
        CreateDriver {
            name: req.name.trim().to_string(),
            email: normalize_email(&req.email),
            password_hash,
            profile: req.profile.into(),
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(driver)))
}

pub async fn driver_stats(
    State(state): State<AppState>,
    identity: Identity,
) -> ApiResult<Json<DriverStats>> {
    authorize(identity.context(), Resource::Statistics, Action::Read)?;
    Ok(Json(Driver::stats(&state.db).await?))
}

pub async fn get_driver(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i64>,
) -> ApiResult<Json<Driver>> {
    let visibility = authorize(identity.context(), Resource::Driver, Action::Read)?;
    Ok(Json(Driver::find_visible(&state.db, id, visibility).await?))
}

/// Update a driver's name, email and profile
///
/// A driver created before profiles existed gets one on first update.
pub async fn update_driver(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i64>,
    ValidJson(req): ValidJson<UpdateDriverRequest>,
) -> ApiResult<Json<Driver>> {
    authorize(identity.context(), Resource::Driver, Action::Update)?;

    let profile: DriverProfile = req.profile.into();
    let driver = Driver::update(
        &state.db,
        id,
        req.name.trim(),
        &normalize_email(&req.email),
        &profile,
    )
    .await?;

    Ok(Json(driver))
}

/// Delete a driver; assigned shipments become unassigned
pub async fn delete_driver(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    authorize(identity.context(), Resource::Driver, Action::Delete)?;

    Driver::delete(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Shipments assigned to the driver
pub async fn driver_shipments(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<Shipment>>> {
    let visibility = authorize(identity.context(), Resource::Driver, Action::Read)?;
    let driver = Driver::find_visible(&state.db, id, visibility).await?;

    let shipments = Shipment::list(&state.db, Visibility::Driver(driver.id)).await?;
    Ok(Json(shipments))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_flattens_profile() {
        let req: CreateDriverRequest = serde_json::from_str(
            r#"{
                "name": "Luis",
                "email": "luis@example.com",
                "password": "secret1",
                "license_number": "LIC-42",
                "vehicle_type": "van"
            }"#,
        )
        .unwrap();

        assert!(req.validate().is_ok());
        assert_eq!(req.profile.status, DriverStatus::Available);

        let profile: DriverProfile = req.profile.into();
        assert_eq!(profile.license_number.as_deref(), Some("LIC-42"));
        assert_eq!(profile.phone, None);
    }

    #[test]
    fn test_update_request_reads_status() {
        let req: UpdateDriverRequest = serde_json::from_str(
            r#"{"name": "Luis", "email": "luis@example.com", "status": "offline"}"#,
        )
        .unwrap();
        assert_eq!(req.profile.status, DriverStatus::Offline);
    }

    #[test]
    fn test_nested_profile_rules_apply() {
        let req = UpdateDriverRequest {
            name: "Luis".to_string(),
            email: "luis@example.com".to_string(),
            profile: DriverProfileRequest {
                current_location: Some("x".repeat(300)),
                ..Default::default()
            },
        };
        assert!(req.validate().is_err());
    }
}
