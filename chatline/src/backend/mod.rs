//! Contracts of the external collaborators: the user directory, the message
//! store, the profile store and the session source.
//!
//! Every call is asynchronous and may fail; callers decide the fallback.

use async_trait::async_trait;

use crate::models::{ChatId, Message, MessageId, Session, User, UserId};
use crate::profile::ProfileField;

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn list_users(&self) -> Result<Vec<User>, anyhow::Error>;
}

#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Newest message of a chat by timestamp, if the chat has any.
    async fn latest_message(&self, chat_id: &ChatId) -> Result<Option<Message>, anyhow::Error>;

    /// All messages of a chat, oldest first.
    async fn list_messages(&self, chat_id: &ChatId) -> Result<Vec<Message>, anyhow::Error>;

    /// Store a message. The store assigns the id when it is empty and the
    /// timestamp when it is missing, and returns the stored record.
    async fn append_message(
        &self,
        chat_id: &ChatId,
        message: Message,
    ) -> Result<Message, anyhow::Error>;

    async fn delete_message(
        &self,
        chat_id: &ChatId,
        message_id: &MessageId,
    ) -> Result<(), anyhow::Error>;

    /// Newest message of every chat `user_id` takes part in, answered by a
    /// single query. Stores that cannot do this return `Ok(None)` and callers
    /// fall back to one [`MessageStore::latest_message`] call per chat.
    async fn latest_per_conversation(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Vec<Message>>, anyhow::Error> {
        _ = user_id;
        Ok(None)
    }
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, user_id: &UserId) -> Result<Option<User>, anyhow::Error>;

    /// Update a single field, leaving every other field of the profile as is.
    async fn merge_profile_field(
        &self,
        user_id: &UserId,
        field: ProfileField,
        value: &str,
    ) -> Result<(), anyhow::Error>;
}

#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn current_session(&self) -> Result<Option<Session>, anyhow::Error>;
}
