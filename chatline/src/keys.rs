use chatline_crypto::{ChatKey, MasterSecret};

use crate::models::ChatId;

/// Source of conversation keys.
///
/// Keys held by the client only keep message text away from readers of the
/// backing store. Confidentiality against the store operator or other
/// devices requires keys negotiated between the participants or managed
/// server-side.
pub trait KeyRing: Send + Sync {
    fn key_for(&self, chat_id: &ChatId) -> Option<ChatKey>;
}

impl KeyRing for MasterSecret {
    fn key_for(&self, chat_id: &ChatId) -> Option<ChatKey> {
        Some(self.chat_key(chat_id.as_str()))
    }
}
