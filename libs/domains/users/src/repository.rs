use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{UserError, UserResult};
use crate::models::User;

/// Maximum number of users a search returns
pub const SEARCH_LIMIT: usize = 20;

/// Repository trait for User persistence
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Store a new user; a taken email is [`UserError::DuplicateEmail`]
    async fn create(&self, user: User) -> UserResult<User>;

    async fn get_by_id(&self, id: Uuid) -> UserResult<Option<User>>;

    /// Lookup by lower-cased email
    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>>;

    /// Users among `ids`; unknown IDs are skipped
    async fn get_many(&self, ids: &[Uuid]) -> UserResult<Vec<User>>;

    /// Case-insensitive substring match on name or email, excluding one user
    async fn search(&self, term: &str, exclude: Uuid, limit: usize) -> UserResult<Vec<User>>;
}

/// In-memory implementation of UserRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> UserResult<User> {
        let mut users = self.users.write().await;

        if users.values().any(|u| u.email == user.email) {
            return Err(UserError::DuplicateEmail(user.email));
        }

        users.insert(user.id, user.clone());

        tracing::info!(user_id = %user.id, "Created user");
        Ok(user)
    }

    async fn get_by_id(&self, id: Uuid) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn get_many(&self, ids: &[Uuid]) -> UserResult<Vec<User>> {
        let users = self.users.read().await;
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    async fn search(&self, term: &str, exclude: Uuid, limit: usize) -> UserResult<Vec<User>> {
        let users = self.users.read().await;
        let term = term.to_lowercase();

        let mut result: Vec<User> = users
            .values()
            .filter(|u| u.id != exclude)
            .filter(|u| u.name.to_lowercase().contains(&term) || u.email.contains(&term))
            .cloned()
            .collect();

        result.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        result.truncate(limit);
        Ok(result)
    }
}
