use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use tokio::sync::Mutex as TokioMutex;
use tokio_sqlite::Value;

use crate::backend::{MessageStore, ProfileStore, UserDirectory};
use crate::models::{ChatId, Message, MessageId, Timestamp, User, UserId};
use crate::profile::ProfileField;

use super::Storage;

/// User directory, message store and profile store on top of [`Storage`].
#[derive(Clone)]
pub struct SqliteBackend {
    storage: Arc<TokioMutex<Storage>>,
}

impl SqliteBackend {
    pub fn new(storage: Arc<TokioMutex<Storage>>) -> Self {
        Self { storage }
    }

    /// Insert a user or replace the stored record with the same id.
    pub async fn upsert_user(&self, user: &User) -> Result<(), anyhow::Error> {
        let columns = User::columns();
        let values = user.values(columns);
        let query = format!(
            "INSERT OR REPLACE INTO \"user\" ({}) VALUES ({})",
            columns.format_columns(),
            columns.format_placeholders(),
        );
        let mut storage = self.storage.lock().await;
        let connection = storage.connection().await;
        connection.execute(query, values).await?;
        Ok(())
    }

    async fn query_messages(
        &self,
        query: String,
        values: Vec<Value>,
    ) -> Result<Vec<Message>, anyhow::Error> {
        let columns = Message::columns();
        let mut storage = self.storage.lock().await;
        let connection = storage.connection().await;
        let mut rows = connection.query(query, values).await?;
        let mut result = Vec::new();
        while let Some(row) = rows.next().await {
            let row = row?;
            // A malformed row must not hide the rest of the conversation.
            match Message::from_values(row.into_values(), columns) {
                Ok(message) => result.push(message),
                Err(err) => tracing::warn!(?err, "Skipping undecodable message row"),
            }
        }
        Ok(result)
    }
}

#[async_trait]
impl UserDirectory for SqliteBackend {
    async fn list_users(&self) -> Result<Vec<User>, anyhow::Error> {
        let columns = User::columns();
        let query = format!(
            "SELECT {} FROM \"user\" ORDER BY \"id\"",
            columns.format_columns()
        );
        let mut storage = self.storage.lock().await;
        let connection = storage.connection().await;
        let mut rows = connection.query(query, vec![]).await?;
        let mut result = Vec::new();
        while let Some(row) = rows.next().await {
            let row = row?;
            match User::from_values(row.into_values(), columns) {
                Ok(user) => result.push(user),
                Err(err) => tracing::warn!(?err, "Skipping undecodable user row"),
            }
        }
        Ok(result)
    }
}

#[async_trait]
impl MessageStore for SqliteBackend {
    async fn latest_message(&self, chat_id: &ChatId) -> Result<Option<Message>, anyhow::Error> {
        let query = format!(
            "SELECT {} FROM \"message\" WHERE \"chat_id\" = ?1 \
             ORDER BY \"time\" DESC, \"seq\" DESC LIMIT 1",
            Message::columns().format_columns()
        );
        let values = vec![Value::Text(chat_id.as_str().to_string())];
        Ok(self.query_messages(query, values).await?.into_iter().next())
    }

    async fn list_messages(&self, chat_id: &ChatId) -> Result<Vec<Message>, anyhow::Error> {
        let query = format!(
            "SELECT {} FROM \"message\" WHERE \"chat_id\" = ?1 \
             ORDER BY \"time\" IS NULL, \"time\" ASC, \"seq\" ASC",
            Message::columns().format_columns()
        );
        let values = vec![Value::Text(chat_id.as_str().to_string())];
        self.query_messages(query, values).await
    }

    async fn append_message(
        &self,
        chat_id: &ChatId,
        mut message: Message,
    ) -> Result<Message, anyhow::Error> {
        if message.id.is_empty() {
            message.id = MessageId::generate();
        }
        if message.time.is_none() {
            message.time = Some(Timestamp::now());
        }
        message.chat_id = chat_id.clone();
        let columns = Message::columns();
        let values = message.values(columns);
        let query = format!(
            "INSERT INTO \"message\" ({}) VALUES ({})",
            columns.format_columns(),
            columns.format_placeholders(),
        );
        let mut storage = self.storage.lock().await;
        let connection = storage.connection().await;
        connection.execute(query, values).await?;
        tracing::debug!(%chat_id, message_id = %message.id, "Stored message");
        Ok(message)
    }

    async fn delete_message(
        &self,
        chat_id: &ChatId,
        message_id: &MessageId,
    ) -> Result<(), anyhow::Error> {
        let query = "DELETE FROM \"message\" WHERE \"chat_id\" = ?1 AND \"id\" = ?2";
        let values = vec![
            Value::Text(chat_id.as_str().to_string()),
            Value::Text(message_id.as_str().to_string()),
        ];
        let mut storage = self.storage.lock().await;
        let connection = storage.connection().await;
        let status = connection.execute(query, values).await?;
        if status.rows_affected() != 1 {
            return Err(anyhow!("Cannot delete message {}", message_id));
        }
        Ok(())
    }

    async fn latest_per_conversation(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Vec<Message>>, anyhow::Error> {
        let query = format!(
            "SELECT {columns} FROM (
                SELECT *, ROW_NUMBER() OVER (
                    PARTITION BY \"chat_id\" ORDER BY \"time\" DESC, \"seq\" DESC
                ) AS \"rank\"
                FROM \"message\"
                WHERE substr(\"chat_id\", 1, length(?1) + 1) = ?1 || '_'
                   OR substr(\"chat_id\", -(length(?1) + 1)) = '_' || ?1
            ) WHERE \"rank\" = 1",
            columns = Message::columns().format_columns()
        );
        let values = vec![Value::Text(user_id.as_str().to_string())];
        let messages = self.query_messages(query, values).await?;
        Ok(Some(messages))
    }
}

#[async_trait]
impl ProfileStore for SqliteBackend {
    async fn get_profile(&self, user_id: &UserId) -> Result<Option<User>, anyhow::Error> {
        let columns = User::columns();
        let query = format!(
            "SELECT {} FROM \"user\" WHERE \"id\" = ?1 LIMIT 1",
            columns.format_columns()
        );
        let values = vec![Value::Text(user_id.as_str().to_string())];
        let mut storage = self.storage.lock().await;
        let connection = storage.connection().await;
        match connection.query_row(query, values).await? {
            Some(row) => Ok(Some(User::from_values(row.into_values(), columns)?)),
            None => Ok(None),
        }
    }

    async fn merge_profile_field(
        &self,
        user_id: &UserId,
        field: ProfileField,
        value: &str,
    ) -> Result<(), anyhow::Error> {
        let query = format!(
            "UPDATE \"user\" SET \"{}\" = ?1 WHERE \"id\" = ?2",
            field.column()
        );
        let mut storage = self.storage.lock().await;
        let connection = storage.connection().await;
        let status = connection
            .execute(
                query,
                vec![
                    Value::Text(value.to_string()),
                    Value::Text(user_id.as_str().to_string()),
                ],
            )
            .await?;
        if status.rows_affected() == 0 {
            // No record yet: create one holding only this field.
            let mut user = User::new(user_id.clone(), "");
            match field {
                ProfileField::Name => user.display_name = value.to_string(),
                ProfileField::Username => user.username = Some(value.to_string()),
                ProfileField::Email => user.email = Some(value.to_string()),
                ProfileField::About => user.about = Some(value.to_string()),
            }
            let columns = User::columns();
            let query = format!(
                "INSERT INTO \"user\" ({}) VALUES ({})",
                columns.format_columns(),
                columns.format_placeholders(),
            );
            connection.execute(query, user.values(columns)).await?;
        }
        Ok(())
    }
}
