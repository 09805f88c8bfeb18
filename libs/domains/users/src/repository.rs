use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

use crate::error::UserResult;
use crate::models::{NewUser, User, UserFilter};

/// Repository trait for User persistence
///
/// Implementations enforce email uniqueness themselves; the service's
/// pre-checks only exist to produce the friendly error early.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert one user
    async fn create(&self, input: NewUser) -> UserResult<User>;

    /// Unordered batch insert; returns only the records that were written
    async fn insert_many(&self, inputs: Vec<NewUser>) -> UserResult<Vec<User>>;

    /// One page of users matching `filter`, ascending by id
    async fn list(&self, filter: &UserFilter) -> UserResult<Vec<User>>;

    /// Number of users matching `filter`, ignoring paging
    async fn count(&self, filter: &UserFilter) -> UserResult<u64>;

    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>>;

    /// The subset of `emails` already taken
    async fn existing_emails(&self, emails: Vec<String>) -> UserResult<Vec<String>>;

    /// Replace every field of `id`; `NotFound` when it does not exist
    async fn update(&self, id: ObjectId, input: NewUser) -> UserResult<User>;

    /// `NotFound` when nothing was removed
    async fn delete(&self, id: ObjectId) -> UserResult<()>;
}
