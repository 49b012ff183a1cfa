use crate::models::User;

pub const DEFAULT_DETAILS_ABOUT: &str = "Hey Guys I am Using ChatApp";

/// Read-only panel describing another user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDetails {
    pub display_name: String,
    pub photo_url: Option<String>,
    pub username: String,
    pub email: String,
    pub about: String,
}

impl From<&User> for UserDetails {
    fn from(user: &User) -> Self {
        Self {
            display_name: user.display_name.clone(),
            photo_url: user.photo_url.clone(),
            username: user.username.clone().unwrap_or_default(),
            email: user.email.clone().unwrap_or_default(),
            about: user
                .about
                .clone()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_DETAILS_ABOUT.to_string()),
        }
    }
}
