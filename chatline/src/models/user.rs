use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use tokio_sqlite::Value;

use super::{ColumnIndex, UserId, value_as_string, value_as_string_opt};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub display_name: String,
    // Reference to the profile photo in object storage.
    pub photo_url: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    // Free-text status shown on the details panel.
    pub about: Option<String>,
}

impl User {
    pub fn new(id: UserId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            photo_url: None,
            username: None,
            email: None,
            about: None,
        }
    }

    pub fn columns() -> &'static ColumnIndex {
        lazy_static! {
            static ref COLUMNS: ColumnIndex = ColumnIndex::builder()
                .add("id")
                .add("display_name")
                .add("photo_url")
                .add("username")
                .add("email")
                .add("about")
                .build();
        }
        &COLUMNS
    }

    pub fn values(&self, columns: &ColumnIndex) -> Vec<Value> {
        let mut values = columns.new_values();
        columns.set_value(&mut values, "id", self.id.as_str().to_string());
        columns.set_value(&mut values, "display_name", self.display_name.clone());
        columns.set_value(&mut values, "photo_url", self.photo_url.clone());
        columns.set_value(&mut values, "username", self.username.clone());
        columns.set_value(&mut values, "email", self.email.clone());
        columns.set_value(&mut values, "about", self.about.clone());
        values
    }

    pub fn from_values(values: Vec<Value>, columns: &ColumnIndex) -> Result<Self, anyhow::Error> {
        Ok(Self {
            id: UserId::parse(value_as_string(columns.value(&values, "id")?)?)?,
            display_name: value_as_string(columns.value(&values, "display_name")?)?,
            photo_url: value_as_string_opt(columns.value(&values, "photo_url")?)?,
            username: value_as_string_opt(columns.value(&values, "username")?)?,
            email: value_as_string_opt(columns.value(&values, "email")?)?,
            about: value_as_string_opt(columns.value(&values, "about")?)?,
        })
    }
}
