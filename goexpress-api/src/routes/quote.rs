/// `POST /api/quote` - public price quote for a weight in a zone

use axum::{extract::State, Json};
use goexpress_shared::{
    auth::{
        authorization::{authorize, Action, Resource},
        middleware::Identity,
    },
    pricing::Quote,
};
use serde::Deserialize;
use validator::Validate;

use crate::{app::AppState, error::ApiResult, extract::ValidJson};

#[derive(Debug, Deserialize, Validate)]
pub struct QuoteRequest {
    #[validate(range(exclusive_min = 0.0, message = "Weight must be greater than 0"))]
    pub weight: f64,

    pub zone_id: i64,
}

pub async fn quote(
    State(state): State<AppState>,
    identity: Identity,
    ValidJson(req): ValidJson<QuoteRequest>,
) -> ApiResult<Json<Quote>> {
    authorize(identity.context(), Resource::Quote, Action::Read)?;

    let quote = Quote::for_zone(&state.db, req.weight, req.zone_id).await?;
    Ok(Json(quote))
}
