use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::keys::KeyRing;
use crate::models::{AttachmentKind, ChatId, Message, MessageId, Session, Timestamp};

use super::clock::{WallClock, format_clock};
use super::state::{ImagePreview, MenuState, Overflow};

/// Shown in place of text that cannot be decrypted.
pub const DECRYPTION_ERROR: &str = "Decryption error";
pub const DEFAULT_PROFILE_PIC: &str = "/default-profile-pic.png";
pub const DEFAULT_DOCUMENT_NAME: &str = "Document";
pub const PHOTO_PREVIEW: &str = "Photo";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderOptions {
    // Rows of text visible before "See more".
    pub collapsed_max_lines: usize,
    pub chars_per_line: usize,
    // Characters of the last message shown in the contact list.
    pub preview_chars: usize,
    // Fixed offset for wall-clock times; the system zone when unset.
    pub utc_offset_minutes: Option<i32>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            collapsed_max_lines: 4,
            chars_per_line: 40,
            preview_chars: 30,
            utc_offset_minutes: None,
        }
    }
}

impl RenderOptions {
    /// Zone for wall-clock times. An offset out of range falls back to the
    /// system zone.
    pub fn wall_clock(&self) -> WallClock {
        let fixed = self.utc_offset_minutes.and_then(|minutes| {
            let offset = FixedOffset::east_opt(minutes.checked_mul(60)?);
            if offset.is_none() {
                tracing::warn!(minutes, "UTC offset out of range, using system zone");
            }
            offset
        });
        fixed.map_or(WallClock::Local, WallClock::Fixed)
    }
}

/// Display-ready message of a thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayMessage {
    pub id: MessageId,
    pub sender: String,
    pub sent_by_me: bool,
    pub profile_pic: String,
    pub body: MessageBody,
    pub time: String,
    pub menu: MenuState,
}

impl DisplayMessage {
    /// Reveal a collapsed text body. Returns whether anything changed.
    pub fn expand(&mut self) -> bool {
        match &mut self.body {
            MessageBody::Text { overflow, .. } => overflow.expand(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    Text {
        text: String,
        overflow: Overflow,
    },
    Image {
        url: String,
        name: Option<String>,
        preview: ImagePreview,
    },
    Document {
        url: String,
        name: String,
    },
    /// Neither text nor a file reference.
    Empty,
}

/// Turns raw message records into display records: decrypts text, classifies
/// attachments and formats timestamps. Never fails; problems become sentinel
/// text.
#[derive(Clone)]
pub struct MessageRenderer {
    keys: Arc<dyn KeyRing>,
    options: RenderOptions,
    clock: WallClock,
}

impl MessageRenderer {
    pub fn new(keys: Arc<dyn KeyRing>, options: RenderOptions) -> Self {
        let clock = options.wall_clock();
        Self {
            keys,
            options,
            clock,
        }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn wall_clock(&self) -> &WallClock {
        &self.clock
    }

    pub fn format_message(&self, session: &Session, raw: &Message) -> DisplayMessage {
        let body = match &raw.attachment {
            Some(attachment) if attachment.kind == AttachmentKind::Image => MessageBody::Image {
                url: attachment.url.clone(),
                name: attachment.name.clone(),
                preview: ImagePreview::default(),
            },
            Some(attachment) if attachment.kind == AttachmentKind::Document => {
                MessageBody::Document {
                    url: attachment.url.clone(),
                    name: attachment
                        .name
                        .clone()
                        .unwrap_or_else(|| DEFAULT_DOCUMENT_NAME.to_string()),
                }
            }
            _ => match &raw.content {
                Some(content) => {
                    let text = self.decrypt(&raw.chat_id, content);
                    let overflow = Overflow::measure(
                        &text,
                        self.options.collapsed_max_lines,
                        self.options.chars_per_line,
                    );
                    MessageBody::Text { text, overflow }
                }
                None => MessageBody::Empty,
            },
        };
        DisplayMessage {
            id: raw.id.clone(),
            sender: raw.from.clone(),
            sent_by_me: is_sent_by(session, raw),
            profile_pic: raw
                .profile_pic
                .clone()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_PROFILE_PIC.to_string()),
            body,
            time: format_clock(raw.time, &self.clock),
            menu: MenuState::Closed,
        }
    }

    /// Decrypt a sealed text envelope of `chat_id`.
    pub fn decrypt(&self, chat_id: &ChatId, envelope: &str) -> String {
        decrypt_text(self.keys.as_ref(), chat_id, envelope)
    }

    pub fn seal(&self, chat_id: &ChatId, text: &str) -> Result<String, anyhow::Error> {
        let key = self
            .keys
            .key_for(chat_id)
            .ok_or_else(|| anyhow::anyhow!("No key for chat {}", chat_id))?;
        key.seal(text)
            .map_err(|err| anyhow::anyhow!("Failed to seal message: {}", err))
    }

    /// One-line preview of a message for the contact list.
    pub fn preview(&self, raw: &Message) -> String {
        let text = match &raw.attachment {
            Some(attachment) if attachment.kind == AttachmentKind::Image => {
                PHOTO_PREVIEW.to_string()
            }
            Some(attachment) if attachment.kind == AttachmentKind::Document => attachment
                .name
                .clone()
                .unwrap_or_else(|| DEFAULT_DOCUMENT_NAME.to_string()),
            _ => match &raw.content {
                Some(content) => self.decrypt(&raw.chat_id, content),
                None => String::new(),
            },
        };
        truncate_preview(&text, self.options.preview_chars)
    }

    /// Wall-clock value of a timestamp, with the offset in effect at that
    /// instant.
    pub fn local_time(&self, time: Option<Timestamp>) -> Option<DateTime<FixedOffset>> {
        time?.to_utc().map(|datetime| self.clock.localize(datetime))
    }
}

pub fn decrypt_text(keys: &dyn KeyRing, chat_id: &ChatId, envelope: &str) -> String {
    let Some(key) = keys.key_for(chat_id) else {
        tracing::error!(%chat_id, "No key for chat");
        return DECRYPTION_ERROR.to_string();
    };
    let plaintext = match key.open(envelope) {
        Ok(v) => v,
        Err(err) => {
            tracing::error!(%chat_id, %err, "Error decrypting message");
            return DECRYPTION_ERROR.to_string();
        }
    };
    match String::from_utf8(plaintext) {
        Ok(text) => text,
        Err(err) => {
            tracing::error!(%chat_id, %err, "Decrypted message is not UTF-8");
            DECRYPTION_ERROR.to_string()
        }
    }
}

/// Whether `session` sent `message`. Records without a sender id fall back to
/// comparing display names.
pub fn is_sent_by(session: &Session, message: &Message) -> bool {
    match &message.sender_id {
        Some(sender_id) => *sender_id == session.user_id,
        None => message.from == session.display_name,
    }
}

pub(crate) fn truncate_preview(text: &str, max_chars: usize) -> String {
    let mut lines = text.lines();
    let first = lines.next().unwrap_or_default();
    if first.chars().count() > max_chars {
        format!("{}...", first.chars().take(max_chars).collect::<String>())
    } else if lines.next().is_some() {
        format!("{}...", first)
    } else {
        first.to_string()
    }
}
