use axum::extract::rejection::JsonRejection;
use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use mongodb::error::{ErrorKind, WriteFailure};
use thiserror::Error;
use validator::ValidationErrors;

use crate::messages;

/// Server error code for a unique index violation.
pub(crate) const DUPLICATE_KEY: i32 = 11000;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found: {0}")]
    NotFound(String),

    #[error("Email already exists")]
    DuplicateEmail,

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationErrors),

    /// JSON that parsed but does not fit a user record
    #[error("{0}")]
    InvalidBody(String),

    #[error("Invalid user id: {0}")]
    InvalidId(String),

    #[error("Database error: {0}")]
    Database(String),
}

pub type UserResult<T> = Result<T, UserError>;

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(_) => AppError::NotFound(messages::USER_NOT_FOUND.to_string()),
            UserError::DuplicateEmail => AppError::BadRequest(messages::EMAIL_EXISTS.to_string()),
            UserError::Validation(errors) => AppError::ValidationError(errors),
            UserError::InvalidBody(msg) => AppError::BadRequest(msg),
            UserError::InvalidId(id) => AppError::BadRequest(format!("Invalid user id: {id}")),
            UserError::Database(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<JsonRejection> for UserError {
    fn from(rejection: JsonRejection) -> Self {
        UserError::InvalidBody(rejection.body_text())
    }
}

impl From<mongodb::error::Error> for UserError {
    fn from(err: mongodb::error::Error) -> Self {
        if is_duplicate_key(&err) {
            return UserError::DuplicateEmail;
        }
        UserError::Database(err.to_string())
    }
}

/// `true` when a single-document write or command failed on the unique index.
pub(crate) fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn status_of(err: UserError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_of(UserError::NotFound("abc".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(status_of(UserError::DuplicateEmail), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(UserError::Validation(ValidationErrors::new())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(UserError::InvalidId("xyz".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(UserError::InvalidBody("age: invalid type".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(UserError::Database("down".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_app_error_messages() {
        assert!(matches!(
            AppError::from(UserError::DuplicateEmail),
            AppError::BadRequest(msg) if msg == messages::EMAIL_EXISTS
        ));
        assert!(matches!(
            AppError::from(UserError::NotFound("abc".into())),
            AppError::NotFound(msg) if msg == messages::USER_NOT_FOUND
        ));
        assert!(matches!(
            AppError::from(UserError::InvalidId("xyz".into())),
            AppError::BadRequest(msg) if msg == "Invalid user id: xyz"
        ));
    }

    #[tokio::test]
    async fn test_non_write_driver_error_is_database() {
        let err = mongodb::options::ClientOptions::parse("not-a-mongodb-url")
            .await
            .unwrap_err();
        assert!(!is_duplicate_key(&err));
        assert!(matches!(UserError::from(err), UserError::Database(_)));
    }
}
