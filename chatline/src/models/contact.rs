use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::{ChatId, UserId};

/// One row of the contact list: a user paired with the newest message of the
/// chat shared with the session user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSummary {
    pub user_id: UserId,
    pub chat_id: ChatId,
    pub display_name: String,
    pub photo_url: Option<String>,
    pub username: Option<String>,
    // Decrypted and truncated preview of the newest message.
    pub last_message: String,
    // Local wall-clock time of the newest message, if it carries one.
    pub last_message_time: Option<DateTime<FixedOffset>>,
    pub streak: u32,
}

impl ContactSummary {
    /// Whether the streak badge should be shown.
    pub fn has_streak(&self) -> bool {
        self.streak > 0
    }
}
