#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use anyhow::anyhow;
use async_trait::async_trait;
use chatline::backend::{MessageStore, ProfileStore, UserDirectory};
use chatline::models::{ChatId, Message, MessageId, Timestamp, User, UserId};
use chatline::profile::ProfileField;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("chatline=trace")
        .try_init();
}

pub fn user_id(raw: &str) -> UserId {
    UserId::parse(raw).unwrap()
}

pub fn user(raw: &str, name: &str) -> User {
    User::new(user_id(raw), name)
}

/// In-memory collaborator used by the integration tests. Counts backend
/// calls and can be told to fail.
#[derive(Default)]
pub struct MemoryStore {
    pub users: Mutex<Vec<User>>,
    pub messages: Mutex<Vec<Message>>,
    pub batch_latest: AtomicBool,
    pub fail_users: AtomicBool,
    pub fail_deletes: AtomicBool,
    pub fail_profile_writes: AtomicBool,
    pub delete_calls: AtomicUsize,
    pub merge_calls: AtomicUsize,
    pub latest_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn with_users(users: Vec<User>) -> Self {
        let store = Self::default();
        *store.users.lock().unwrap() = users;
        store
    }

    pub fn insert(&self, message: Message) {
        self.messages.lock().unwrap().push(message);
    }

    pub fn all_users(&self) -> Vec<User> {
        self.users.lock().unwrap().clone()
    }

    pub fn message_count(&self) -> usize {
        self.messages.lock().unwrap().len()
    }

    pub fn user(&self, id: &UserId) -> Option<User> {
        self.users.lock().unwrap().iter().find(|u| &u.id == id).cloned()
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn list_users(&self) -> Result<Vec<User>, anyhow::Error> {
        if self.fail_users.load(Ordering::SeqCst) {
            return Err(anyhow!("directory unavailable"));
        }
        Ok(self.users.lock().unwrap().clone())
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn latest_message(&self, chat_id: &ChatId) -> Result<Option<Message>, anyhow::Error> {
        self.latest_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| &m.chat_id == chat_id)
            .max_by_key(|m| m.time)
            .cloned())
    }

    async fn list_messages(&self, chat_id: &ChatId) -> Result<Vec<Message>, anyhow::Error> {
        let mut messages: Vec<Message> = self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| &m.chat_id == chat_id)
            .cloned()
            .collect();
        messages.sort_by_key(|m| (m.time.is_none(), m.time));
        Ok(messages)
    }

    async fn append_message(
        &self,
        chat_id: &ChatId,
        mut message: Message,
    ) -> Result<Message, anyhow::Error> {
        if message.id.is_empty() {
            message.id = MessageId::generate();
        }
        message.time.get_or_insert_with(Timestamp::now);
        message.chat_id = chat_id.clone();
        self.insert(message.clone());
        Ok(message)
    }

    async fn delete_message(
        &self,
        chat_id: &ChatId,
        message_id: &MessageId,
    ) -> Result<(), anyhow::Error> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(anyhow!("permission denied"));
        }
        let mut messages = self.messages.lock().unwrap();
        let before = messages.len();
        messages.retain(|m| !(&m.chat_id == chat_id && &m.id == message_id));
        if messages.len() == before {
            return Err(anyhow!("no such message"));
        }
        Ok(())
    }

    async fn latest_per_conversation(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Vec<Message>>, anyhow::Error> {
        if !self.batch_latest.load(Ordering::SeqCst) {
            return Ok(None);
        }
        let mut latest: HashMap<ChatId, Message> = HashMap::new();
        for message in self.messages.lock().unwrap().iter() {
            if !message.chat_id.involves(user_id) {
                continue;
            }
            let newer = latest
                .get(&message.chat_id)
                .map(|current| message.time > current.time)
                .unwrap_or(true);
            if newer {
                latest.insert(message.chat_id.clone(), message.clone());
            }
        }
        Ok(Some(latest.into_values().collect()))
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn get_profile(&self, user_id: &UserId) -> Result<Option<User>, anyhow::Error> {
        Ok(self.user(user_id))
    }

    async fn merge_profile_field(
        &self,
        user_id: &UserId,
        field: ProfileField,
        value: &str,
    ) -> Result<(), anyhow::Error> {
        self.merge_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_profile_writes.load(Ordering::SeqCst) {
            return Err(anyhow!("write rejected"));
        }
        let mut users = self.users.lock().unwrap();
        let position = match users.iter().position(|u| &u.id == user_id) {
            Some(v) => v,
            None => {
                users.push(User::new(user_id.clone(), ""));
                users.len() - 1
            }
        };
        let user = &mut users[position];
        let value = value.to_string();
        match field {
            ProfileField::Name => user.display_name = value,
            ProfileField::Username => user.username = Some(value),
            ProfileField::Email => user.email = Some(value),
            ProfileField::About => user.about = Some(value),
        }
        Ok(())
    }
}
