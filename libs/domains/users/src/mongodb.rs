//! MongoDB implementation of UserRepository

use async_trait::async_trait;
use futures_util::TryStreamExt;
use database::mongodb::{is_duplicate_key, uuid_bson};
use mongodb::bson::{Bson, Document, doc};
use mongodb::options::IndexOptions;
use mongodb::{Collection, Database, IndexModel};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{UserError, UserResult};
use crate::models::User;
use crate::repository::UserRepository;

pub const USERS_COLLECTION: &str = "users";

/// MongoDB-based user repository
#[derive(Clone)]
pub struct MongoUserRepository {
    collection: Collection<User>,
}

impl MongoUserRepository {
    pub fn new(database: &Database) -> Self {
        Self {
            collection: database.collection(USERS_COLLECTION),
        }
    }

    /// Unique index on email, plus name for search
    pub async fn create_indexes(&self) -> UserResult<()> {
        let indexes = vec![
            IndexModel::builder()
                .keys(doc! { "email": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
            IndexModel::builder().keys(doc! { "name": 1 }).build(),
        ];

        self.collection.create_indexes(indexes).await?;
        Ok(())
    }

    /// Name or email contains `term`, any case, caller excluded.
    fn search_filter(term: &str, exclude: Uuid) -> Document {
        let pattern = format!("(?i){}", regex::escape(term));
        doc! {
            "_id": { "$ne": uuid_bson(exclude) },
            "$or": [
                { "name": { "$regex": pattern.as_str() } },
                { "email": { "$regex": pattern.as_str() } },
            ],
        }
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn create(&self, user: User) -> UserResult<User> {
        match self.collection.insert_one(&user).await {
            Ok(_) => Ok(user),
            Err(e) if is_duplicate_key(&e) => Err(UserError::DuplicateEmail(user.email)),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: Uuid) -> UserResult<Option<User>> {
        Ok(self.collection.find_one(doc! { "_id": uuid_bson(id) }).await?)
    }

    #[instrument(skip(self))]
    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>> {
        Ok(self.collection.find_one(doc! { "email": email }).await?)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn get_many(&self, ids: &[Uuid]) -> UserResult<Vec<User>> {
        let ids: Vec<Bson> = ids.iter().copied().map(uuid_bson).collect();

        let cursor = self
            .collection
            .find(doc! { "_id": { "$in": ids } })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    #[instrument(skip(self))]
    async fn search(&self, term: &str, exclude: Uuid, limit: usize) -> UserResult<Vec<User>> {
        let cursor = self
            .collection
            .find(Self::search_filter(term, exclude))
            .sort(doc! { "name": 1, "_id": 1 })
            .limit(limit as i64)
            .await?;
        Ok(cursor.try_collect().await?)
    }
}
