mod details;
mod editor;

use std::fmt::{self, Display};
use std::str::FromStr;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

pub use details::{DEFAULT_DETAILS_ABOUT, UserDetails};
pub use editor::{
    DEFAULT_ABOUT, DEFAULT_EMAIL, DEFAULT_NAME, DEFAULT_USERNAME, EditState, Profile, ProfileEditor,
};

/// Editable field of the session user's profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileField {
    Name,
    Username,
    Email,
    About,
}

impl ProfileField {
    pub const ALL: [ProfileField; 4] = [Self::Name, Self::Username, Self::Email, Self::About];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Username => "username",
            Self::Email => "email",
            Self::About => "about",
        }
    }

    /// Column of the user record holding this field.
    pub fn column(&self) -> &'static str {
        match self {
            Self::Name => "display_name",
            Self::Username => "username",
            Self::Email => "email",
            Self::About => "about",
        }
    }
}

impl Display for ProfileField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProfileField {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| anyhow!("Unknown profile field: {}", s))
    }
}
