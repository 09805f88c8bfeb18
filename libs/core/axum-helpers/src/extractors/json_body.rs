//! `Json` wrapper whose rejection is an [`AppError`].

use crate::errors::AppError;
use axum::extract::{FromRequest, Json, Request, rejection::JsonRejection};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// JSON body extractor.
///
/// Unparsable bodies become `400 {"error": "Invalid JSON payload"}`, bodies
/// of the wrong shape become 400 with the deserializer's message, and a
/// missing `Content-Type` keeps axum's 415.
///
/// # Example
/// ```ignore
/// use axum::{Router, routing::post};
/// use axum_helpers::JsonBody;
///
/// async fn create(JsonBody(payload): JsonBody<serde_json::Value>) -> String {
///     payload.to_string()
/// }
///
/// let app: Router = Router::new().route("/", post(create));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(JsonBody(value))
    }
}

impl<T: DeserializeOwned> JsonBody<T> {
    /// Deserialize an already-parsed value, failing the same way the
    /// extractor does so the message still names the offending field.
    pub fn from_value(value: &Value) -> Result<Self, JsonRejection> {
        let Json(inner) = Json::<T>::from_bytes(value.to_string().as_bytes())?;
        Ok(JsonBody(inner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, response::IntoResponse};
    use http_body_util::BodyExt;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Payload {
        age: i64,
    }

    fn json_request(body: &'static str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    async fn rejection_of(req: Request) -> (StatusCode, serde_json::Value) {
        let err = JsonBody::<Payload>::from_request(req, &()).await.unwrap_err();
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_extracts_valid_body() {
        let JsonBody(payload) = JsonBody::<Payload>::from_request(json_request(r#"{"age": 3}"#), &())
            .await
            .unwrap();
        assert_eq!(payload.age, 3);
    }

    #[tokio::test]
    async fn test_malformed_json_is_invalid_payload() {
        let (status, body) = rejection_of(json_request(r#"{"age": "#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, serde_json::json!({ "error": "Invalid JSON payload" }));
    }

    #[tokio::test]
    async fn test_wrong_shape_is_bad_request_with_detail() {
        let (status, body) = rejection_of(json_request(r#"{"age": "abc"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let message = body["error"].as_str().unwrap();
        assert!(message.contains("age"), "unexpected message: {message}");
    }

    #[test]
    fn test_from_value_names_the_field() {
        let value = serde_json::json!({ "age": "abc" });
        let rejection = JsonBody::<Payload>::from_value(&value).unwrap_err();

        assert!(matches!(rejection, JsonRejection::JsonDataError(_)));
        assert!(rejection.body_text().contains("age"));
    }

    #[test]
    fn test_from_value_accepts_matching_value() {
        let JsonBody(payload) =
            JsonBody::<Payload>::from_value(&serde_json::json!({ "age": 7 })).unwrap();
        assert_eq!(payload.age, 7);
    }

    #[tokio::test]
    async fn test_missing_content_type_keeps_status() {
        let req = Request::builder()
            .method("POST")
            .uri("/")
            .body(Body::from(r#"{"age": 3}"#))
            .unwrap();
        let (status, body) = rejection_of(req).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert!(body["error"].is_string());
    }
}
