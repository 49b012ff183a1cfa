use async_trait::async_trait;

use crate::models::{ChatId, MessageId};

#[async_trait]
pub trait ChatListener: Send + Sync {
    async fn on_message_deleted(&self, chat_id: ChatId, message_id: MessageId);

    /// Deletion failed and the thread is unchanged. The UI shows a blocking
    /// alert with `reason`.
    async fn on_delete_failed(&self, chat_id: ChatId, message_id: MessageId, reason: String);
}

pub(super) struct StubListener;

#[async_trait]
impl ChatListener for StubListener {
    async fn on_message_deleted(&self, chat_id: ChatId, message_id: MessageId) {
        _ = chat_id;
        _ = message_id;
    }

    async fn on_delete_failed(&self, chat_id: ChatId, message_id: MessageId, reason: String) {
        _ = chat_id;
        _ = message_id;
        _ = reason;
    }
}
