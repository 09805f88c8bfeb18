use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
};
use axum_helpers::{
    JsonBody,
    errors::responses::{BadRequestResponse, InternalServerErrorResponse, NotFoundResponse},
};
use serde_json::Value;
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::UserResult;
use crate::messages;
use crate::models::{
    CreateUsers, ListQuery, MessageResponse, User, UserFilter, UserInput, UserPage, UserResponse,
    UsersCreatedResponse,
};
use crate::repository::UserRepository;
use crate::service::UserService;

/// OpenAPI documentation for Users API
#[derive(OpenApi)]
#[openapi(
    paths(list_users, create_users, update_user, delete_user),
    components(
        schemas(
            User,
            UserInput,
            UserPage,
            UserResponse,
            UsersCreatedResponse,
            MessageResponse
        ),
        responses(BadRequestResponse, NotFoundResponse, InternalServerErrorResponse)
    ),
    tags(
        (name = "Users", description = "User management endpoints (MongoDB)")
    )
)]
pub struct ApiDoc;

/// Create the users router with all HTTP endpoints
pub fn router<R: UserRepository + 'static>(service: UserService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(list_users).post(create_users))
        .route("/{id}", put(update_user).delete(delete_user))
        .with_state(shared_service)
}

/// List users with paging and search
///
/// Unparsable or non-positive `page`/`limit` fall back to their defaults.
#[utoipa::path(
    get,
    path = "",
    tag = "Users",
    params(ListQuery),
    responses(
        (status = 200, description = "One page of users", body = UserPage),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_users<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> UserResult<Json<UserPage>> {
    let query = query.map(|Query(q)| q).unwrap_or_else(|rejection| {
        tracing::debug!("Ignoring unparsable query string: {}", rejection);
        ListQuery::default()
    });

    let page = service.list_users(UserFilter::from(query)).await?;
    Ok(Json(page))
}

/// Create one user, or many from an array
///
/// In an array, records that do not fit the user shape or fail validation
/// are skipped; the batch fails only when none of them is usable.
#[utoipa::path(
    post,
    path = "",
    tag = "Users",
    request_body(
        content = UserInput,
        description = "A user object, or an array of user objects for bulk create"
    ),
    responses(
        (status = 201, description = "User created; an array body returns UsersCreatedResponse", body = UserResponse),
        (status = 400, response = BadRequestResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_users<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    JsonBody(body): JsonBody<Value>,
) -> UserResult<Response> {
    let response = match CreateUsers::try_from(body)? {
        CreateUsers::One(input) => {
            let user = service.create_user(input).await?;
            let body = UserResponse {
                message: messages::USER_CREATED.to_string(),
                data: user,
            };
            (StatusCode::CREATED, Json(body)).into_response()
        }
        CreateUsers::Many(records) => {
            let users = service.create_users(records).await?;
            let body = UsersCreatedResponse {
                message: messages::USERS_CREATED.to_string(),
                count: users.len(),
                data: users,
            };
            (StatusCode::CREATED, Json(body)).into_response()
        }
    };

    Ok(response)
}

/// Replace every field of a user
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Users",
    params(
        ("id" = String, Path, description = "User ID (24-char hex)")
    ),
    request_body = UserInput,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, response = BadRequestResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<UserInput>,
) -> UserResult<Json<UserResponse>> {
    let user = service.update_user(&id, input).await?;
    Ok(Json(UserResponse {
        message: messages::USER_UPDATED.to_string(),
        data: user,
    }))
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Users",
    params(
        ("id" = String, Path, description = "User ID (24-char hex)")
    ),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 400, response = BadRequestResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    Path(id): Path<String>,
) -> UserResult<Json<MessageResponse>> {
    service.delete_user(&id).await?;
    Ok(Json(MessageResponse {
        message: messages::USER_DELETED.to_string(),
    }))
}
