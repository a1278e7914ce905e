/// Request extractors
///
/// [`ValidJson`] deserializes a JSON body and runs its `validator` rules, so
/// handlers only ever see well-formed input. Both failure modes answer 400
/// with the standard error body.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::ApiError;

/// JSON body that passed validation
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| ApiError::BadRequest(rejection.body_text()))?;

        value.validate()?;

        Ok(ValidJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, StatusCode},
        routing::post,
        Router,
    };
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Deserialize, Validate)]
    struct Counter {
        #[validate(range(min = 1))]
        count: i64,
    }

    async fn handler(ValidJson(counter): ValidJson<Counter>) -> String {
        counter.count.to_string()
    }

    async fn post_json(body: &'static str) -> StatusCode {
        Router::new()
            .route("/", post(handler))
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_valid_body_reaches_handler() {
        assert_eq!(post_json(r#"{"count": 3}"#).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        assert_eq!(post_json(r#"{"count": "#).await, StatusCode::BAD_REQUEST);
        assert_eq!(post_json(r#"{"total": 3}"#).await, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_rule_violation_is_bad_request() {
        assert_eq!(post_json(r#"{"count": 0}"#).await, StatusCode::BAD_REQUEST);
    }
}
