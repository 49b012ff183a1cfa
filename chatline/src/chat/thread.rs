use std::sync::Arc;

use crate::backend::MessageStore;
use crate::error::{Error, Result};
use crate::models::{Attachment, ChatId, Message, MessageId, Session, UserId};

use super::{ChatListener, DisplayMessage, MessageBody, MessageRenderer, StubListener};

/// Message list of one conversation as shown by the thread view.
///
/// The thread owns its display records exclusively. Loading replaces the
/// whole list; deletion removes a record only after the store confirmed it.
pub struct ChatThread {
    session: Session,
    peer: UserId,
    chat_id: ChatId,
    store: Arc<dyn MessageStore>,
    renderer: MessageRenderer,
    messages: Vec<DisplayMessage>,
    listener: Arc<dyn ChatListener>,
}

impl ChatThread {
    pub async fn open(
        session: Session,
        peer: UserId,
        store: Arc<dyn MessageStore>,
        renderer: MessageRenderer,
    ) -> Result<Self, anyhow::Error> {
        Self::with_listener(session, peer, store, renderer, Arc::new(StubListener)).await
    }

    pub async fn with_listener<L>(
        session: Session,
        peer: UserId,
        store: Arc<dyn MessageStore>,
        renderer: MessageRenderer,
        listener: Arc<L>,
    ) -> Result<Self, anyhow::Error>
    where
        L: ChatListener + 'static,
    {
        let chat_id = ChatId::resolve(&session.user_id, &peer);
        let mut thread = Self {
            session,
            peer,
            chat_id,
            store,
            renderer,
            messages: Vec::new(),
            listener,
        };
        thread.reload().await?;
        Ok(thread)
    }

    pub fn chat_id(&self) -> &ChatId {
        &self.chat_id
    }

    pub fn peer(&self) -> &UserId {
        &self.peer
    }

    pub fn messages(&self) -> &[DisplayMessage] {
        &self.messages
    }

    pub fn get(&self, message_id: &MessageId) -> Option<&DisplayMessage> {
        self.messages.iter().find(|m| &m.id == message_id)
    }

    /// Fetch the chat again and replace every display record.
    pub async fn reload(&mut self) -> Result<(), anyhow::Error> {
        let raw = self.store.list_messages(&self.chat_id).await?;
        tracing::debug!(chat_id = %self.chat_id, count = raw.len(), "Loaded chat history");
        self.messages = raw
            .iter()
            .map(|m| self.renderer.format_message(&self.session, m))
            .collect();
        Ok(())
    }

    /// Seal and send a text message, then append it to the thread.
    pub async fn send_text(&mut self, text: &str) -> Result<DisplayMessage> {
        if text.trim().is_empty() {
            return Err(Error::EmptyMessage);
        }
        let content = self.renderer.seal(&self.chat_id, text)?;
        self.send(Some(content), None).await
    }

    pub async fn send_attachment(&mut self, attachment: Attachment) -> Result<DisplayMessage> {
        self.send(None, Some(attachment)).await
    }

    async fn send(
        &mut self,
        content: Option<String>,
        attachment: Option<Attachment>,
    ) -> Result<DisplayMessage> {
        let message = Message {
            id: MessageId::generate(),
            chat_id: self.chat_id.clone(),
            sender_id: Some(self.session.user_id.clone()),
            from: self.session.display_name.clone(),
            content,
            attachment,
            time: None,
            streak: None,
            profile_pic: None,
        };
        let stored = match self.store.append_message(&self.chat_id, message).await {
            Ok(v) => v,
            Err(err) => {
                tracing::error!(?err, chat_id = %self.chat_id, "Failed to send message");
                return Err(err.into());
            }
        };
        let display = self.renderer.format_message(&self.session, &stored);
        self.messages.push(display.clone());
        Ok(display)
    }

    /// Reveal the full text of a collapsed message.
    pub fn expand(&mut self, message_id: &MessageId) -> bool {
        self.find_mut(message_id)
            .map(|m| m.expand())
            .unwrap_or(false)
    }

    pub fn toggle_image_preview(&mut self, message_id: &MessageId) -> bool {
        match self.find_mut(message_id).map(|m| &mut m.body) {
            Some(MessageBody::Image { preview, .. }) => {
                preview.toggle();
                true
            }
            _ => false,
        }
    }

    /// Open or close the action menu. Only messages sent by the session user
    /// have one.
    pub fn toggle_menu(&mut self, message_id: &MessageId) -> bool {
        match self.find_mut(message_id) {
            Some(m) if m.sent_by_me => m.menu.toggle(),
            _ => false,
        }
    }

    pub fn pointer_left(&mut self, message_id: &MessageId) -> bool {
        self.find_mut(message_id)
            .map(|m| m.menu.pointer_left())
            .unwrap_or(false)
    }

    pub fn request_delete(&mut self, message_id: &MessageId) -> bool {
        self.find_mut(message_id)
            .map(|m| m.menu.request_delete())
            .unwrap_or(false)
    }

    pub fn cancel_delete(&mut self, message_id: &MessageId) -> bool {
        self.find_mut(message_id)
            .map(|m| m.menu.cancel())
            .unwrap_or(false)
    }

    /// Confirm a pending deletion. Returns `Ok(false)` when no confirmation
    /// was pending. The menu closes whatever the outcome.
    pub async fn confirm_delete(&mut self, message_id: &MessageId) -> Result<bool> {
        match self.get(message_id) {
            Some(m) if m.menu.is_confirm_pending() => {}
            Some(_) => return Ok(false),
            None => return Err(Error::UnknownMessage),
        }
        let result = self.delete_message(message_id).await;
        if result.is_err() {
            if let Some(m) = self.find_mut(message_id) {
                m.menu.cancel();
            }
        }
        result.map(|_| true)
    }

    /// Delete a message sent by the session user.
    ///
    /// Ownership is checked before the store is called. The record leaves the
    /// thread only when the store reports success.
    pub async fn delete_message(&mut self, message_id: &MessageId) -> Result<()> {
        let Some(position) = self.messages.iter().position(|m| &m.id == message_id) else {
            return Err(Error::UnknownMessage);
        };
        if message_id.is_empty() {
            tracing::error!("Message does not have a valid id");
            return Err(Error::MissingMessageId);
        }
        if !self.messages[position].sent_by_me {
            tracing::warn!(%message_id, "Refusing to delete a message sent by someone else");
            return Err(Error::NotOwner);
        }
        if let Err(err) = self.store.delete_message(&self.chat_id, message_id).await {
            tracing::error!(?err, %message_id, "Error deleting message");
            self.listener
                .on_delete_failed(
                    self.chat_id.clone(),
                    message_id.clone(),
                    "Failed to delete the message. Please try again.".to_string(),
                )
                .await;
            return Err(err.into());
        }
        tracing::info!(%message_id, "Message successfully deleted");
        self.messages.remove(position);
        self.listener
            .on_message_deleted(self.chat_id.clone(), message_id.clone())
            .await;
        Ok(())
    }

    fn find_mut(&mut self, message_id: &MessageId) -> Option<&mut DisplayMessage> {
        self.messages.iter_mut().find(|m| &m.id == message_id)
    }
}
