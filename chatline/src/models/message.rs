use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use tokio_sqlite::Value;

use super::{
    ChatId, ColumnIndex, MessageId, Timestamp, UserId, value_as_i64_opt, value_as_string,
    value_as_string_opt, value_as_u32_opt,
};

/// A message document of one chat as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub chat_id: ChatId,
    // Missing on records written before sender ids were recorded.
    pub sender_id: Option<UserId>,
    // Display name of the sender.
    pub from: String,
    // Sealed text envelope.
    pub content: Option<String>,
    pub attachment: Option<Attachment>,
    pub time: Option<Timestamp>,
    pub streak: Option<u32>,
    pub profile_pic: Option<String>,
}

impl Message {
    pub fn columns() -> &'static ColumnIndex {
        lazy_static! {
            static ref COLUMNS: ColumnIndex = ColumnIndex::builder()
                .add("id")
                .add("chat_id")
                .add("sender_id")
                .add("sender_name")
                .add("content")
                .add("file_url")
                .add("file_type")
                .add("file_name")
                .add("time")
                .add("streak")
                .add("profile_pic")
                .build();
        }
        &COLUMNS
    }

    pub fn values(&self, columns: &ColumnIndex) -> Vec<Value> {
        let mut values = columns.new_values();
        columns.set_value(&mut values, "id", self.id.as_str().to_string());
        columns.set_value(&mut values, "chat_id", self.chat_id.as_str().to_string());
        columns.set_value(
            &mut values,
            "sender_id",
            self.sender_id.as_ref().map(|v| v.as_str().to_string()),
        );
        columns.set_value(&mut values, "sender_name", self.from.clone());
        columns.set_value(&mut values, "content", self.content.clone());
        if let Some(attachment) = &self.attachment {
            columns.set_value(&mut values, "file_url", attachment.url.clone());
            columns.set_value(&mut values, "file_type", attachment.kind.name().to_string());
            columns.set_value(&mut values, "file_name", attachment.name.clone());
        }
        columns.set_value(&mut values, "time", self.time.map(|v| v.micros()));
        columns.set_value(&mut values, "streak", self.streak.map(i64::from));
        columns.set_value(&mut values, "profile_pic", self.profile_pic.clone());
        values
    }

    pub fn from_values(values: Vec<Value>, columns: &ColumnIndex) -> Result<Self, anyhow::Error> {
        let file_url = value_as_string_opt(columns.value(&values, "file_url")?)?;
        let attachment = match file_url {
            Some(url) => {
                let kind = value_as_string_opt(columns.value(&values, "file_type")?)?;
                Some(Attachment {
                    url,
                    kind: AttachmentKind::parse(kind.as_deref().unwrap_or_default()),
                    name: value_as_string_opt(columns.value(&values, "file_name")?)?,
                })
            }
            None => None,
        };
        // Bad optional fields read as absent; ownership then falls back to
        // the sender name.
        let sender_id = match value_as_string_opt(columns.value(&values, "sender_id")?)? {
            Some(raw) => UserId::parse(raw)
                .map_err(|err| tracing::warn!(?err, "Ignoring malformed sender id"))
                .ok(),
            None => None,
        };
        let streak = value_as_u32_opt(columns.value(&values, "streak")?)
            .map_err(|err| tracing::warn!(?err, "Ignoring malformed streak"))
            .ok()
            .flatten();
        Ok(Self {
            id: MessageId::new(value_as_string(columns.value(&values, "id")?)?),
            chat_id: ChatId::from_stored(value_as_string(columns.value(&values, "chat_id")?)?),
            sender_id,
            from: value_as_string(columns.value(&values, "sender_name")?)?,
            content: value_as_string_opt(columns.value(&values, "content")?)?,
            attachment,
            time: value_as_i64_opt(columns.value(&values, "time")?)?.map(Timestamp),
            streak,
            profile_pic: value_as_string_opt(columns.value(&values, "profile_pic")?)?,
        })
    }
}

/// Reference to an uploaded file carried by a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub url: String,
    pub kind: AttachmentKind,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum AttachmentKind {
    Image,
    Document,
    // Declared type this client does not know how to display.
    Other(String),
}

impl AttachmentKind {
    pub fn name(&self) -> &str {
        match self {
            Self::Image => "image",
            Self::Document => "document",
            Self::Other(kind) => kind,
        }
    }

    pub fn parse(kind: &str) -> Self {
        match kind {
            "image" => Self::Image,
            "document" => Self::Document,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for AttachmentKind {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<AttachmentKind> for String {
    fn from(value: AttachmentKind) -> Self {
        value.name().to_string()
    }
}
