//! In-memory [`UserStore`] backed by a `tokio::sync::RwLock`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use newsfeed_core::User;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::StorageError;
use crate::repository::UserStore;

/// Process-local user store. Records live as long as the process.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<BTreeMap<String, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `users`.
    pub fn with_users<I>(users: I) -> Self
    where
        I: IntoIterator<Item = User>,
    {
        let users = users
            .into_iter()
            .map(|user| (user.chat_id.clone(), user))
            .collect();
        Self {
            users: RwLock::new(users),
        }
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn get(&self, chat_id: &str) -> Result<User, StorageError> {
        self.users
            .read()
            .await
            .get(chat_id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(chat_id.to_string()))
    }

    async fn put(&self, user: &User) -> Result<(), StorageError> {
        if user.chat_id.is_empty() {
            return Err(StorageError::Backend("empty chat id".to_string()));
        }
        debug!(
            chat_id = %user.chat_id,
            authorized = user.authorized,
            subscribed = user.subscribed,
            "user stored"
        );
        self.users
            .write()
            .await
            .insert(user.chat_id.clone(), user.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<User>, StorageError> {
        Ok(self.users.read().await.values().cloned().collect())
    }

    async fn delete(&self, chat_id: &str) -> Result<(), StorageError> {
        let removed = self.users.write().await.remove(chat_id).is_some();
        debug!(chat_id = %chat_id, removed, "user deleted");
        Ok(())
    }
}
