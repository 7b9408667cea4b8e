//! User store interface.

use async_trait::async_trait;
use newsfeed_core::User;

use crate::error::StorageError;

/// Keyed store of [`User`] records. Implementations must be safe for concurrent use by every
/// dispatcher worker. Each call is atomic on its own; a `get` followed by a `put` is not.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Returns the record for `chat_id`, or [`StorageError::NotFound`].
    async fn get(&self, chat_id: &str) -> Result<User, StorageError>;

    /// Inserts or replaces the record keyed by `user.chat_id`.
    async fn put(&self, user: &User) -> Result<(), StorageError>;

    /// All records, ordered by chat id.
    async fn list(&self) -> Result<Vec<User>, StorageError>;

    /// Removes the record for `chat_id`. Removing a missing record is not an error.
    async fn delete(&self, chat_id: &str) -> Result<(), StorageError>;
}
