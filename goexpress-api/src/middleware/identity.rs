/// Request identity layer
///
/// Runs before every handler. A request with a valid access token gets its
/// [`AuthContext`] inserted into the request extensions, where the
/// [`Identity`](goexpress_shared::auth::middleware::Identity) extractor
/// picks it up. Anything else, including a malformed or expired token,
/// continues as anonymous: public routes still answer, and protected routes
/// reject it through the authorization policy with 401.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use goexpress_shared::auth::middleware::authenticate;

use crate::app::AppState;

pub async fn identity_layer(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    match authenticate(req.headers(), state.access_secret()) {
        Ok(Some(context)) => {
            tracing::debug!(user_id = context.user_id, role = %context.role, "Authenticated request");
            req.extensions_mut().insert(context);
        }
        Ok(None) => {}
        Err(err) => {
            tracing::debug!(error = %err, "Ignoring unusable bearer token");
        }
    }

    next.run(req).await
}
