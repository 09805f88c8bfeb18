//! User Service - Business logic layer

use mongodb::bson::oid::ObjectId;
use std::sync::Arc;
use tracing::instrument;

use crate::error::{UserError, UserResult};
use crate::models::{NewUser, User, UserFilter, UserInput, UserPage};
use crate::repository::UserRepository;

/// User service providing business logic operations
///
/// Runs the duplicate-email pre-checks and validation before anything is
/// written; the repository's unique constraint covers the race between the
/// check and the write.
pub struct UserService<R: UserRepository> {
    repository: Arc<R>,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// One page of users plus the total match count
    #[instrument(skip(self))]
    pub async fn list_users(&self, filter: UserFilter) -> UserResult<UserPage> {
        let (data, total) = tokio::try_join!(
            self.repository.list(&filter),
            self.repository.count(&filter)
        )?;

        Ok(UserPage::new(&filter, total, data))
    }

    /// Create a single user
    #[instrument(skip(self, input), fields(email = ?input.email))]
    pub async fn create_user(&self, input: UserInput) -> UserResult<User> {
        if let Some(email) = input.email.as_deref() {
            if self.repository.find_by_email(email).await?.is_some() {
                return Err(UserError::DuplicateEmail);
            }
        }

        let new_user = NewUser::try_from(input)?;
        self.repository.create(new_user).await
    }

    /// Bulk create.
    ///
    /// Any email already in the store rejects the whole batch. Otherwise
    /// records that failed to decode or validate are skipped and the rest are
    /// inserted unordered; a batch with no usable record fails with the first
    /// record's error.
    #[instrument(skip(self, records), fields(batch_size = records.len()))]
    pub async fn create_users(
        &self,
        records: Vec<UserResult<UserInput>>,
    ) -> UserResult<Vec<User>> {
        let emails: Vec<String> = records
            .iter()
            .filter_map(|record| record.as_ref().ok())
            .filter_map(|u| u.email.clone())
            .collect();
        if !emails.is_empty() && !self.repository.existing_emails(emails).await?.is_empty() {
            return Err(UserError::DuplicateEmail);
        }

        if records.is_empty() {
            return Ok(Vec::new());
        }

        let mut valid = Vec::with_capacity(records.len());
        let mut first_error = None;
        for (index, record) in records.into_iter().enumerate() {
            match record.and_then(|input| Ok(NewUser::try_from(input)?)) {
                Ok(new_user) => valid.push(new_user),
                Err(err) => {
                    tracing::warn!(index, error = %err, "Skipping invalid user in bulk create");
                    first_error.get_or_insert(err);
                }
            }
        }

        if valid.is_empty() {
            if let Some(err) = first_error {
                return Err(err);
            }
        }

        self.repository.insert_many(valid).await
    }

    /// Replace every field of a user
    #[instrument(skip(self, input))]
    pub async fn update_user(&self, id: &str, input: UserInput) -> UserResult<User> {
        let oid = parse_id(id)?;
        let new_user = NewUser::try_from(input)?;

        let holder = self.repository.find_by_email(&new_user.email).await?;
        if holder.is_some_and(|user| user.id != oid.to_hex()) {
            return Err(UserError::DuplicateEmail);
        }

        self.repository.update(oid, new_user).await
    }

    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: &str) -> UserResult<()> {
        let oid = parse_id(id)?;
        self.repository.delete(oid).await
    }
}

impl<R: UserRepository> Clone for UserService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

fn parse_id(id: &str) -> UserResult<ObjectId> {
    ObjectId::parse_str(id).map_err(|_| UserError::InvalidId(id.to_string()))
}
