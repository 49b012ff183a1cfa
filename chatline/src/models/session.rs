use serde::{Deserialize, Serialize};

use super::UserId;

/// Signed-in user, passed explicitly to every operation that depends on who
/// is looking at the data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: UserId,
    pub display_name: String,
    pub email: Option<String>,
}

impl Session {
    pub fn new(user_id: UserId, display_name: impl Into<String>) -> Self {
        Self {
            user_id,
            display_name: display_name.into(),
            email: None,
        }
    }
}
