//! In-memory implementation of UserRepository (for development/testing)

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{UserError, UserResult};
use crate::models::{NewUser, User, UserFilter};
use crate::repository::UserRepository;

/// Users keyed by hex ObjectId, so iteration order is creation order.
///
/// Email uniqueness is enforced on every write, like the unique index in
/// MongoDB.
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<BTreeMap<String, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn matches(user: &User, filter: &UserFilter) -> bool {
        let Some(search) = filter.search.as_deref() else {
            return true;
        };
        let needle = search.to_lowercase();

        [Some(&user.name), Some(&user.email), user.address.as_ref()]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&needle))
    }

    fn email_taken(users: &BTreeMap<String, User>, email: &str, except: Option<&str>) -> bool {
        users
            .values()
            .any(|u| u.email == email && Some(u.id.as_str()) != except)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, input: NewUser) -> UserResult<User> {
        let mut users = self.users.write().await;

        if Self::email_taken(&users, &input.email, None) {
            return Err(UserError::DuplicateEmail);
        }

        let user = User::new(ObjectId::new().to_hex(), input);
        users.insert(user.id.clone(), user.clone());

        tracing::info!(user_id = %user.id, "Created user");
        Ok(user)
    }

    async fn insert_many(&self, inputs: Vec<NewUser>) -> UserResult<Vec<User>> {
        let mut users = self.users.write().await;
        let mut inserted = Vec::with_capacity(inputs.len());

        for (index, input) in inputs.into_iter().enumerate() {
            if Self::email_taken(&users, &input.email, None) {
                tracing::warn!(index, email = %input.email, "Skipping user with duplicate email");
                continue;
            }
            let user = User::new(ObjectId::new().to_hex(), input);
            users.insert(user.id.clone(), user.clone());
            inserted.push(user);
        }

        tracing::info!(inserted = inserted.len(), "Users inserted");
        Ok(inserted)
    }

    async fn list(&self, filter: &UserFilter) -> UserResult<Vec<User>> {
        let users = self.users.read().await;
        let skip = usize::try_from(filter.skip()).unwrap_or(usize::MAX);
        let limit = usize::try_from(filter.limit).unwrap_or(usize::MAX);

        Ok(users
            .values()
            .filter(|u| Self::matches(u, filter))
            .skip(skip)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count(&self, filter: &UserFilter) -> UserResult<u64> {
        let users = self.users.read().await;
        Ok(users.values().filter(|u| Self::matches(u, filter)).count() as u64)
    }

    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn existing_emails(&self, emails: Vec<String>) -> UserResult<Vec<String>> {
        let users = self.users.read().await;
        let mut taken: Vec<String> = emails
            .into_iter()
            .filter(|email| Self::email_taken(&users, email, None))
            .collect();
        taken.sort();
        taken.dedup();
        Ok(taken)
    }

    async fn update(&self, id: ObjectId, input: NewUser) -> UserResult<User> {
        let key = id.to_hex();
        let mut users = self.users.write().await;

        if !users.contains_key(&key) {
            return Err(UserError::NotFound(key));
        }
        if Self::email_taken(&users, &input.email, Some(&key)) {
            return Err(UserError::DuplicateEmail);
        }

        let user = User::new(key.clone(), input);
        users.insert(key, user.clone());

        tracing::info!(user_id = %user.id, "Updated user");
        Ok(user)
    }

    async fn delete(&self, id: ObjectId) -> UserResult<()> {
        let key = id.to_hex();
        let mut users = self.users.write().await;

        if users.remove(&key).is_none() {
            return Err(UserError::NotFound(key));
        }

        tracing::info!(user_id = %key, "Deleted user");
        Ok(())
    }
}
