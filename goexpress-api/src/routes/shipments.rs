/// Shipment endpoints
///
/// - `GET /api/shipments` - Shipments visible to the caller
/// - `POST /api/shipments` - Create a shipment owned by the caller
/// - `GET /api/shipments/:id` - Detail by numeric ID, or public lookup by tracking number
/// - `PUT /api/shipments/:id/status` - Advance or cancel a shipment
/// - `PUT /api/shipments/:id/driver` - Assign a driver (admin)
/// - `GET /api/shipments/:id/tracking-history` - Tracking updates, newest first

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use goexpress_shared::{
    auth::{
        authorization::{authorize, Action, Resource},
        middleware::Identity,
    },
    models::{
        shipment::{CreateShipment, Shipment, ShipmentDetail, ShipmentStatus},
        tracking_update::TrackingUpdate,
    },
};
use serde::Deserialize;
use validator::Validate;

use super::caller;
use crate::{app::AppState, error::ApiResult, extract::ValidJson};

/// Create shipment request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateShipmentRequest {
    #[validate(length(min = 1, max = 255, message = "Origin is required"))]
    pub origin: String,

    #[validate(length(min = 1, max = 255, message = "Destination is required"))]
    pub destination: String,

    /// Kilograms
    #[validate(range(exclusive_min = 0.0, message = "Weight must be greater than 0"))]
    pub weight: f64,

    pub zone_id: i64,
}

impl From<CreateShipmentRequest> for CreateShipment {
    fn from(req: CreateShipmentRequest) -> Self {
        CreateShipment {
            origin: req.origin.trim().to_string(),
            destination: req.destination.trim().to_string(),
            weight: req.weight,
            zone_id: req.zone_id,
        }
    }
}

/// Status update request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStatusRequest {
    pub status: ShipmentStatus,

    /// Where the parcel is now
    #[validate(length(max = 255))]
    pub location: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AssignDriverRequest {
    pub driver_id: i64,
}

pub async fn list_shipments(
    State(state): State<AppState>,
    identity: Identity,
) -> ApiResult<Json<Vec<Shipment>>> {
    let visibility = authorize(identity.context(), Resource::Shipment, Action::List)?;
    Ok(Json(Shipment::list(&state.db, visibility).await?))
}

/// Create a shipment
///
/// The caller becomes the shipment's customer. The response carries the
/// generated tracking number; the first tracking update is `pending` at the
/// origin.
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `404 Not Found`: Zone does not exist
pub async fn create_shipment(
    State(state): State<AppState>,
    identity: Identity,
    ValidJson(req): ValidJson<CreateShipmentRequest>,
) -> ApiResult<(StatusCode, Json<Shipment>)> {
    authorize(identity.context(), Resource::Shipment, Action::Create)?;
    let customer = caller(&identity)?;

    let shipment = Shipment::create(&state.db, customer.user_id, req.into()).await?;
    Ok((StatusCode::CREATED, Json(shipment)))
}

/// Shipment detail
///
/// A numeric key is a shipment ID and requires a caller who can see the
/// shipment. Anything else is treated as a tracking number and answered
/// publicly.
///
/// # Errors
///
/// - `400 Bad Request`: Malformed tracking number
/// - `401 Unauthorized`: Numeric key without a token
/// - `404 Not Found`: Unknown or hidden shipment
pub async fn get_shipment(
    State(state): State<AppState>,
    identity: Identity,
    Path(key): Path<String>,
) -> ApiResult<Json<ShipmentDetail>> {
    let detail = match key.parse::<i64>() {
        Ok(id) => {
            let visibility = authorize(identity.context(), Resource::Shipment, Action::Read)?;
            Shipment::detail(&state.db, id, visibility).await?
        }
        Err(_) => {
            authorize(identity.context(), Resource::Tracking, Action::Read)?;
            Shipment::detail_by_tracking_number(&state.db, &key).await?
        }
    };

    Ok(Json(detail))
}

/// Update a shipment's status
///
/// Drivers may only update shipments assigned to them; clients only their
/// own.
///
/// # Errors
///
/// - `404 Not Found`: Unknown or hidden shipment
/// - `409 Conflict`: Transition not allowed from the current status
pub async fn update_status(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i64>,
    ValidJson(req): ValidJson<UpdateStatusRequest>,
) -> ApiResult<Json<Shipment>> {
    let visibility = authorize(identity.context(), Resource::Shipment, Action::UpdateStatus)?;

    let location = req
        .location
        .as_deref()
        .map(str::trim)
        .filter(|location| !location.is_empty());

    let shipment = Shipment::update_status(&state.db, id, req.status, location, visibility).await?;
    Ok(Json(shipment))
}

/// Assign a driver to a shipment
///
/// # Errors
///
/// - `404 Not Found`: Unknown shipment, or the user is not a driver
/// - `409 Conflict`: Shipment already delivered or cancelled
pub async fn assign_driver(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i64>,
    ValidJson(req): ValidJson<AssignDriverRequest>,
) -> ApiResult<Json<Shipment>> {
    authorize(identity.context(), Resource::Shipment, Action::AssignDriver)?;

    let shipment = Shipment::assign_driver(&state.db, id, req.driver_id).await?;
    Ok(Json(shipment))
}

pub async fn tracking_history(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<TrackingUpdate>>> {
    let visibility = authorize(identity.context(), Resource::Shipment, Action::Read)?;
    Ok(Json(Shipment::tracking_history(&state.db, id, visibility).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_trims_into_input() {
        let req = CreateShipmentRequest {
            origin: "  Bogota ".to_string(),
            destination: "Medellin".to_string(),
            weight: 2.5,
            zone_id: 1,
        };
        assert!(req.validate().is_ok());

        let input: CreateShipment = req.into();
        assert_eq!(input.origin, "Bogota");
        assert_eq!(input.zone_id, 1);
    }

    #[test]
    fn test_create_request_rejects_non_positive_weight() {
        let req = CreateShipmentRequest {
            origin: "A".to_string(),
            destination: "B".to_string(),
            weight: 0.0,
            zone_id: 1,
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("weight"));
    }

    #[test]
    fn test_status_request_parses_snake_case() {
        let req: UpdateStatusRequest =
            serde_json::from_str(r#"{"status": "in_transit", "location": "Hub 3"}"#).unwrap();
        assert_eq!(req.status, ShipmentStatus::InTransit);
        assert_eq!(req.location.as_deref(), Some("Hub 3"));

        assert!(serde_json::from_str::<UpdateStatusRequest>(r#"{"status": "lost"}"#).is_err());
    }
}
