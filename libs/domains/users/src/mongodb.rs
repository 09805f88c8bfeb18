//! MongoDB implementation of UserRepository

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::{
    Collection, Database, IndexModel,
    bson::{Bson, Document, doc, oid::ObjectId},
    error::ErrorKind,
    options::{FindOptions, IndexOptions, ReturnDocument},
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::instrument;

use crate::error::{UserError, UserResult};
use crate::models::{NewUser, User, UserFilter};
use crate::repository::UserRepository;

pub const COLLECTION: &str = "users";
pub const EMAIL_INDEX: &str = "idx_email_unique";

/// Stored shape of a user; `_id` stays a native ObjectId.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    name: String,
    age: i64,
    email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    address: Option<String>,
}

impl UserDocument {
    fn new(input: NewUser) -> Self {
        Self {
            id: ObjectId::new(),
            name: input.name,
            age: input.age,
            email: input.email,
            address: input.address,
        }
    }
}

impl From<UserDocument> for User {
    fn from(doc: UserDocument) -> Self {
        Self {
            id: doc.id.to_hex(),
            name: doc.name,
            age: doc.age,
            email: doc.email,
            address: doc.address,
        }
    }
}

/// MongoDB implementation of the UserRepository
pub struct MongoUserRepository {
    collection: Collection<UserDocument>,
}

impl MongoUserRepository {
    /// Repository over the `users` collection of `db`
    ///
    /// # Example
    /// ```ignore
    /// let client = Client::with_uri_str("mongodb://localhost:27017").await?;
    /// let repo = MongoUserRepository::new(client.database("users_api"));
    /// repo.init_indexes().await?;
    /// ```
    pub fn new(db: Database) -> Self {
        Self::with_collection(db, COLLECTION)
    }

    pub fn with_collection(db: Database, collection_name: &str) -> Self {
        Self {
            collection: db.collection::<UserDocument>(collection_name),
        }
    }

    /// Create the unique email index. Idempotent.
    pub async fn init_indexes(&self) -> UserResult<()> {
        let index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name(EMAIL_INDEX.to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(index).await?;
        tracing::info!(index = EMAIL_INDEX, "User indexes initialized");
        Ok(())
    }

    /// Case-insensitive literal match on name, email or address
    fn build_filter(filter: &UserFilter) -> Document {
        let Some(search) = filter.search.as_deref() else {
            return doc! {};
        };

        let pattern = regex::escape(search);
        doc! {
            "$or": [
                { "name": { "$regex": pattern.as_str(), "$options": "i" } },
                { "email": { "$regex": pattern.as_str(), "$options": "i" } },
                { "address": { "$regex": pattern.as_str(), "$options": "i" } },
            ]
        }
    }

    fn id_filter(id: ObjectId) -> Document {
        doc! { "_id": id }
    }
}

/// Positions in an unordered batch the server refused.
///
/// `None` when the error is not a per-document batch failure, or when a
/// write concern error leaves the outcome of the batch unknown.
fn failed_indexes(err: &mongodb::error::Error) -> Option<HashSet<usize>> {
    let ErrorKind::InsertMany(failure) = err.kind.as_ref() else {
        return None;
    };
    if failure.write_concern_error.is_some() {
        return None;
    }

    let mut failed = HashSet::new();
    for write_error in failure.write_errors.iter().flatten() {
        tracing::warn!(
            index = write_error.index,
            code = write_error.code,
            "Skipping user rejected by store: {}",
            write_error.message
        );
        failed.insert(write_error.index);
    }
    Some(failed)
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    #[instrument(skip(self, input), fields(email = %input.email))]
    async fn create(&self, input: NewUser) -> UserResult<User> {
        let document = UserDocument::new(input);

        self.collection.insert_one(&document).await?;

        tracing::info!(user_id = %document.id, "User created successfully");
        Ok(document.into())
    }

    #[instrument(skip(self, inputs), fields(batch_size = inputs.len()))]
    async fn insert_many(&self, inputs: Vec<NewUser>) -> UserResult<Vec<User>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let documents: Vec<UserDocument> = inputs.into_iter().map(UserDocument::new).collect();

        let failed = match self.collection.insert_many(&documents).ordered(false).await {
            Ok(_) => HashSet::new(),
            Err(err) => failed_indexes(&err).ok_or_else(|| UserError::from(err))?,
        };

        let inserted: Vec<User> = documents
            .into_iter()
            .enumerate()
            .filter(|(index, _)| !failed.contains(index))
            .map(|(_, doc)| doc.into())
            .collect();

        tracing::info!(
            inserted = inserted.len(),
            skipped = failed.len(),
            "Users inserted"
        );
        Ok(inserted)
    }

    #[instrument(skip(self))]
    async fn list(&self, filter: &UserFilter) -> UserResult<Vec<User>> {
        let options = FindOptions::builder()
            .sort(doc! { "_id": 1 })
            .skip(filter.skip())
            .limit(i64::try_from(filter.limit).unwrap_or(i64::MAX))
            .build();

        let cursor = self
            .collection
            .find(Self::build_filter(filter))
            .with_options(options)
            .await?;
        let documents: Vec<UserDocument> = cursor.try_collect().await?;

        Ok(documents.into_iter().map(User::from).collect())
    }

    #[instrument(skip(self))]
    async fn count(&self, filter: &UserFilter) -> UserResult<u64> {
        let count = self
            .collection
            .count_documents(Self::build_filter(filter))
            .await?;
        Ok(count)
    }

    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let document = self.collection.find_one(doc! { "email": email }).await?;
        Ok(document.map(User::from))
    }

    #[instrument(skip(self))]
    async fn existing_emails(&self, emails: Vec<String>) -> UserResult<Vec<String>> {
        if emails.is_empty() {
            return Ok(Vec::new());
        }

        let values = self
            .collection
            .distinct("email", doc! { "email": { "$in": emails } })
            .await?;

        Ok(values
            .into_iter()
            .filter_map(|value| match value {
                Bson::String(email) => Some(email),
                _ => None,
            })
            .collect())
    }

    #[instrument(skip(self, input))]
    async fn update(&self, id: ObjectId, input: NewUser) -> UserResult<User> {
        let mut set = doc! {
            "name": input.name.as_str(),
            "age": input.age,
            "email": input.email.as_str(),
        };
        let mut update = doc! {};
        match input.address.as_deref() {
            Some(address) => {
                set.insert("address", address);
            }
            None => {
                update.insert("$unset", doc! { "address": "" });
            }
        }
        update.insert("$set", set);

        let updated = self
            .collection
            .find_one_and_update(Self::id_filter(id), update)
            .return_document(ReturnDocument::After)
            .await?
            .ok_or_else(|| UserError::NotFound(id.to_hex()))?;

        tracing::info!(user_id = %id, "User updated successfully");
        Ok(updated.into())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: ObjectId) -> UserResult<()> {
        let result = self.collection.delete_one(Self::id_filter(id)).await?;

        if result.deleted_count == 0 {
            return Err(UserError::NotFound(id.to_hex()));
        }

        tracing::info!(user_id = %id, "User deleted successfully");
        Ok(())
    }
}
