//! Wires the users domain to the shared MongoDB database.

use axum::Router;
use domain_users::{MongoUserRepository, UserResult, UserService, handlers};
use mongodb::Database;

use crate::state::AppState;

pub fn router(state: &AppState) -> Router {
    let repository = MongoUserRepository::new(state.db.clone());
    handlers::router(UserService::new(repository))
}

/// Create the collection's indexes; safe to run on every start.
pub async fn init_indexes(db: &Database) -> UserResult<()> {
    MongoUserRepository::new(db.clone()).init_indexes().await
}
