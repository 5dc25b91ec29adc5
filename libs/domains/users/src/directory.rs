//! Profile lookups for the events domain

use async_trait::async_trait;
use domain_events::{EventError, EventResult, UserDirectory, UserProfile};
use uuid::Uuid;

use crate::error::UserError;
use crate::repository::UserRepository;
use crate::service::UserService;

#[async_trait]
impl<R: UserRepository + 'static> UserDirectory for UserService<R> {
    async fn profiles(&self, ids: &[Uuid]) -> EventResult<Vec<UserProfile>> {
        let users = self.get_many(ids).await.map_err(|e| match e {
            UserError::Database(msg) => EventError::Database(msg),
            other => EventError::Internal(other.to_string()),
        })?;

        Ok(users
            .into_iter()
            .map(|user| UserProfile {
                id: user.id,
                name: user.name,
                email: user.email,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::tests::{register_input, service};

    #[tokio::test]
    async fn test_profiles_resolve_known_users() {
        let svc = service();
        let ada = svc
            .register(register_input("Ada", "ada@example.com"))
            .await
            .unwrap();

        let profiles = svc.profiles(&[ada.user.id, Uuid::now_v7()]).await.unwrap();

        assert_eq!(
            profiles,
            vec![UserProfile {
                id: ada.user.id,
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
            }]
        );
    }
}
