use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::JoinSet;

use crate::backend::MessageStore;
use crate::chat::MessageRenderer;
use crate::models::{ChatId, ContactSummary, Message, Session, Timestamp, User};

/// Builds the contact list: one summary per user sharing a non-empty chat
/// with the session user, newest chat first.
pub struct Summarizer {
    messages: Arc<dyn MessageStore>,
    renderer: MessageRenderer,
}

impl Summarizer {
    pub fn new(messages: Arc<dyn MessageStore>, renderer: MessageRenderer) -> Self {
        Self { messages, renderer }
    }

    /// Pair every other user with the newest message of the shared chat.
    ///
    /// Users without messages are left out. A failed fetch is logged and only
    /// drops that user. The result is sorted by message time, newest first;
    /// ties keep the order of `users`, and messages without a time go last.
    pub async fn build_contact_list(
        &self,
        session: &Session,
        users: Vec<User>,
    ) -> Vec<ContactSummary> {
        let peers: Vec<(User, ChatId)> = users
            .into_iter()
            .filter(|user| user.id != session.user_id)
            .map(|user| {
                let chat_id = ChatId::resolve(&session.user_id, &user.id);
                (user, chat_id)
            })
            .collect();
        let latest = match self.messages.latest_per_conversation(&session.user_id).await {
            Ok(Some(messages)) => {
                tracing::debug!(count = messages.len(), "Loaded latest messages in one query");
                Self::match_latest(&peers, messages)
            }
            Ok(None) => self.fetch_latest(&peers).await,
            Err(err) => {
                tracing::warn!(?err, "Failed to load latest messages, fetching per chat");
                self.fetch_latest(&peers).await
            }
        };
        let mut entries: Vec<(Option<Timestamp>, ContactSummary)> = peers
            .into_iter()
            .zip(latest)
            .filter_map(|((user, chat_id), message)| {
                let message = message?;
                Some((message.time, self.summarize(user, chat_id, &message)))
            })
            .collect();
        // Vec::sort_by is stable, so equal times keep encounter order.
        entries.sort_by(|a, b| b.0.cmp(&a.0));
        entries.into_iter().map(|(_, summary)| summary).collect()
    }

    pub fn summarize(&self, user: User, chat_id: ChatId, message: &Message) -> ContactSummary {
        ContactSummary {
            last_message: self.renderer.preview(message),
            last_message_time: self.renderer.local_time(message.time),
            streak: message.streak.unwrap_or(0),
            user_id: user.id,
            chat_id,
            display_name: user.display_name,
            photo_url: user.photo_url,
            username: user.username,
        }
    }

    fn match_latest(peers: &[(User, ChatId)], messages: Vec<Message>) -> Vec<Option<Message>> {
        let mut by_chat: HashMap<ChatId, Message> = HashMap::new();
        for message in messages {
            let newer = by_chat
                .get(&message.chat_id)
                .map(|current| message.time > current.time)
                .unwrap_or(true);
            if newer {
                by_chat.insert(message.chat_id.clone(), message);
            }
        }
        peers
            .iter()
            .map(|(_, chat_id)| by_chat.remove(chat_id))
            .collect()
    }

    /// Fetch the newest message of every chat concurrently. Slot `i` of the
    /// result belongs to `peers[i]` and is `None` for empty chats and failed
    /// fetches.
    async fn fetch_latest(&self, peers: &[(User, ChatId)]) -> Vec<Option<Message>> {
        let mut tasks = JoinSet::new();
        for (index, (user, chat_id)) in peers.iter().enumerate() {
            let messages = self.messages.clone();
            let chat_id = chat_id.clone();
            let user_id = user.id.clone();
            tasks.spawn(async move {
                let result = messages.latest_message(&chat_id).await;
                (index, user_id, chat_id, result)
            });
        }
        let mut latest = vec![None; peers.len()];
        while let Some(joined) = tasks.join_next().await {
            let (index, user_id, chat_id, result) = match joined {
                Ok(v) => v,
                Err(err) => {
                    tracing::error!(?err, "Latest message task failed");
                    continue;
                }
            };
            match result {
                Ok(Some(message)) => latest[index] = Some(message),
                Ok(None) => {
                    tracing::trace!(%user_id, %chat_id, "Chat has no messages");
                }
                Err(err) => {
                    tracing::warn!(?err, %user_id, %chat_id, "Failed to fetch latest message");
                }
            }
        }
        latest
    }
}
