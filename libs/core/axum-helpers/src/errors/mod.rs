pub mod codes;
pub mod handlers;
pub mod messages;
pub mod responses;

pub use codes::ErrorCode;

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidationErrors;

/// Body of every error response.
///
/// ```json
/// { "error": "Email đã tồn tại" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message
    #[schema(example = "Invalid JSON payload")]
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Build a `{"error": message}` response with the given status.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse::new(message))).into_response()
}

/// Flatten validation errors into `Validation failed: field: msg, field: msg`.
///
/// Fields are sorted so the message is stable across runs. A rule without a
/// message falls back to its code.
pub fn validation_summary(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    let parts: Vec<String> = fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                let msg = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                format!("{field}: {msg}")
            })
        })
        .collect();

    format!("{}: {}", messages::VALIDATION_FAILED, parts.join(", "))
}

/// HTTP-facing error type.
///
/// Domain crates convert their own errors into this; the response body is
/// always [`ErrorResponse`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    #[error("JSON extraction error: {0}")]
    JsonExtractorRejection(#[from] JsonRejection),

    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationErrors),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Internal Server Error: {0}")]
    InternalServerError(String),
}

impl AppError {
    /// Status code this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::JsonExtractorRejection(JsonRejection::JsonSyntaxError(_))
            | AppError::JsonExtractorRejection(JsonRejection::JsonDataError(_)) => {
                StatusCode::BAD_REQUEST
            }
            AppError::JsonExtractorRejection(e) => e.status(),
            AppError::ValidationError(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AppError::JsonExtractorRejection(JsonRejection::JsonSyntaxError(e)) => {
                tracing::info!(
                    error_code = ErrorCode::InvalidJson.code(),
                    "Malformed JSON body: {}",
                    e.body_text()
                );
                messages::INVALID_JSON.to_string()
            }
            AppError::JsonExtractorRejection(e) => {
                tracing::info!(
                    error_code = ErrorCode::JsonExtraction.code(),
                    "JSON extraction error: {:?}",
                    e
                );
                e.body_text()
            }
            AppError::ValidationError(e) => {
                let summary = validation_summary(&e);
                tracing::info!(
                    error_code = ErrorCode::ValidationError.code(),
                    "{}",
                    summary
                );
                summary
            }
            AppError::BadRequest(msg) => {
                tracing::info!(error_code = ErrorCode::BadRequest.code(), "Bad request: {}", msg);
                msg
            }
            AppError::NotFound(msg) => {
                tracing::info!(error_code = ErrorCode::NotFound.code(), "Not found: {}", msg);
                msg
            }
            AppError::InternalServerError(msg) => {
                tracing::error!(
                    error_code = ErrorCode::InternalError.code(),
                    "Internal server error: {}",
                    msg
                );
                msg
            }
        };

        error_response(status, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use validator::ValidationError;

    async fn body_of(response: Response) -> ErrorResponse {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn errors_with(entries: &[(&'static str, &'static str)]) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        for (field, message) in entries {
            errors.add(
                *field,
                ValidationError::new("rule").with_message((*message).into()),
            );
        }
        errors
    }

    #[test]
    fn test_validation_summary_sorts_fields() {
        let errors = errors_with(&[
            ("name", "Tên phải có ít nhất 2 ký tự"),
            ("email", "Email không hợp lệ"),
        ]);

        assert_eq!(
            validation_summary(&errors),
            "Validation failed: email: Email không hợp lệ, name: Tên phải có ít nhất 2 ký tự"
        );
    }

    #[test]
    fn test_validation_summary_falls_back_to_code() {
        let mut errors = ValidationErrors::new();
        errors.add("age", ValidationError::new("range"));

        assert_eq!(validation_summary(&errors), "Validation failed: age: range");
    }

    #[tokio::test]
    async fn test_bad_request_body_is_error_only() {
        let response = AppError::BadRequest("Email đã tồn tại".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_of(response).await, ErrorResponse::new("Email đã tồn tại"));
    }

    #[tokio::test]
    async fn test_not_found_status() {
        let response = AppError::NotFound("missing".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_of(response).await.error, "missing");
    }

    #[tokio::test]
    async fn test_internal_error_keeps_message() {
        let response = AppError::InternalServerError("boom".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(response).await.error, "boom");
    }

    #[tokio::test]
    async fn test_validation_error_maps_to_400_summary() {
        let errors = errors_with(&[("age", "Tuổi phải >= 0")]);
        let response = AppError::from(errors).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_of(response).await.error,
            "Validation failed: age: Tuổi phải >= 0"
        );
    }
}
