//! Lookup of display profiles for user IDs, implemented by the users domain.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::EventResult;
use crate::models::UserProfile;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Profiles for the IDs that resolve; unknown IDs are simply absent.
    async fn profiles(&self, ids: &[Uuid]) -> EventResult<Vec<UserProfile>>;
}
