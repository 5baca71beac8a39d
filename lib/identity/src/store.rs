//! Persistence seam for user records.

use async_trait::async_trait;
use signin_core::{Result, UserId};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::user::User;

/// Storage for user records.
///
/// Implementations own the uniqueness of `(provider, provider_id)`: a
/// `create` that would duplicate an existing provider identity must fail
/// with [`StoreError::Conflict`], even under concurrent first logins.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Finds the user bound to a provider identity.
    async fn find_by_provider_id(
        &self,
        provider: &str,
        provider_id: &str,
    ) -> Result<Option<User>, StoreError>;

    /// Finds a user by their local ID.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Persists a new user.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] if the provider identity is taken.
    async fn create(&self, user: &User) -> Result<(), StoreError>;
}

#[derive(Default)]
struct Records {
    users: HashMap<UserId, User>,
    by_provider: HashMap<(String, String), UserId>,
}

/// Process-local user store.
///
/// Records live only as long as the process.
#[derive(Default)]
pub struct InMemoryUserStore {
    records: RwLock<Records>,
}

impl InMemoryUserStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored users.
    pub async fn len(&self) -> usize {
        self.records.read().await.users.len()
    }

    /// Returns true if no users are stored.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.users.is_empty()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_provider_id(
        &self,
        provider: &str,
        provider_id: &str,
    ) -> Result<Option<User>, StoreError> {
        let records = self.records.read().await;
        let user = records
            .by_provider
            .get(&(provider.to_string(), provider_id.to_string()))
            .and_then(|id| records.users.get(id))
            .cloned();
        Ok(user)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.records.read().await.users.get(&id).cloned())
    }

    async fn create(&self, user: &User) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let key = (user.provider().to_string(), user.provider_id().to_string());
        if records.by_provider.contains_key(&key) {
            return Err(StoreError::Conflict {
                provider: key.0,
                provider_id: key.1,
            }
            .into());
        }
        records.by_provider.insert(key, user.id());
        records.users.insert(user.id(), user.clone());
        Ok(())
    }
}
