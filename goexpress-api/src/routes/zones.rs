/// Zone catalog endpoints
///
/// Anyone may read the catalog; only administrators change it.

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
    models::zone::{Zone, ZoneInput},
};
use serde::Deserialize;
use validator::Validate;

use crate::{app::AppState, error::{ApiError, ApiResult}, extract::ValidJson};

/// Create or replace request
#[derive(Debug, Deserialize, Validate)]
pub struct ZoneRequest {
    #[validate(length(min = 1, max = 255, message = "Zone name is required"))]
    pub name: String,

    #[validate(range(exclusive_min = 0.0, message = "Price per kg must be greater than 0"))]
    pub price_per_kg: f64,
}

impl From<ZoneRequest> for ZoneInput {
    fn from(req: ZoneRequest) -> Self {
        ZoneInput {
            name: req.name,
            price_per_kg: req.price_per_kg,
        }
    }
}

pub async fn list_zones(
    State(state): State<AppState>,
    identity: Identity,
) -> ApiResult<Json<Vec<Zone>>> {
    authorize(identity.context(), Resource::Zone, Action::List)?;
    Ok(Json(Zone::list(&state.db).await?))
}

pub async fn get_zone(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i64>,
) -> ApiResult<Json<Zone>> {
    authorize(identity.context(), Resource::Zone, Action::Read)?;

    Zone::find_by_id(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Zone not found".to_string()))
}

pub async fn create_zone(
    State(state): State<AppState>,
    identity: Identity,
    ValidJson(req): ValidJson<ZoneRequest>,
) -> ApiResult<(StatusCode, Json<Zone>)> {
    authorize(identity.context(), Resource::Zone, Action::Create)?;

    let zone = Zone::create(&state.db, req.into()).await?;
    Ok((StatusCode::CREATED, Json(zone)))
}

pub async fn update_zone(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i64>,
    ValidJson(req): ValidJson<ZoneRequest>,
) -> ApiResult<Json<Zone>> {
    authorize(identity.context(), Resource::Zone, Action::Update)?;

    let zone = Zone::update(&state.db, id, req.into()).await?;
    tracing::info!(zone_id = zone.id, price_per_kg = zone.price_per_kg, "Zone updated");

    Ok(Json(zone))
}

/// Delete a zone
///
/// # Errors
///
/// - `404 Not Found`: No such zone
/// - `409 Conflict`: Shipments still reference the zone
pub async fn delete_zone(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    authorize(identity.context(), Resource::Zone, Action::Delete)?;

    Zone::delete(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
