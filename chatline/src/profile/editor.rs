use std::sync::Arc;

use crate::backend::ProfileStore;
use crate::error::{Error, Result};
use crate::models::{Session, User};

use super::ProfileField;

pub const DEFAULT_NAME: &str = "User Name";
pub const DEFAULT_EMAIL: &str = "user@example.com";
pub const DEFAULT_ABOUT: &str = "Hey Guys, I am using Chat App!";
pub const DEFAULT_USERNAME: &str = "@username";

/// Profile values as shown on the profile screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    pub username: String,
    pub email: String,
    pub about: String,
}

impl Profile {
    fn with_defaults(session: &Session, stored: Option<&User>) -> Self {
        let non_empty = |v: Option<&String>| v.filter(|v| !v.is_empty()).cloned();
        Self {
            name: non_empty(stored.map(|u| &u.display_name))
                .or_else(|| Some(session.display_name.clone()).filter(|v| !v.is_empty()))
                .unwrap_or_else(|| DEFAULT_NAME.to_string()),
            username: non_empty(stored.and_then(|u| u.username.as_ref()))
                .unwrap_or_else(|| DEFAULT_USERNAME.to_string()),
            email: non_empty(stored.and_then(|u| u.email.as_ref()))
                .or_else(|| session.email.clone())
                .unwrap_or_else(|| DEFAULT_EMAIL.to_string()),
            about: non_empty(stored.and_then(|u| u.about.as_ref()))
                .unwrap_or_else(|| DEFAULT_ABOUT.to_string()),
        }
    }

    pub fn get(&self, field: ProfileField) -> &str {
        match field {
            ProfileField::Name => &self.name,
            ProfileField::Username => &self.username,
            ProfileField::Email => &self.email,
            ProfileField::About => &self.about,
        }
    }

    fn set(&mut self, field: ProfileField, value: String) {
        match field {
            ProfileField::Name => self.name = value,
            ProfileField::Username => self.username = value,
            ProfileField::Email => self.email = value,
            ProfileField::About => self.about = value,
        }
    }
}

/// Which edit popup is open, with its draft text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditState {
    #[default]
    Idle,
    Editing {
        field: ProfileField,
        draft: String,
    },
}

/// Profile screen of the session user.
pub struct ProfileEditor {
    store: Arc<dyn ProfileStore>,
    session: Session,
    profile: Profile,
    edit: EditState,
}

impl ProfileEditor {
    /// Load the profile of the session user. Fetch failures and missing
    /// documents are logged and leave the defaults in place.
    pub async fn load(store: Arc<dyn ProfileStore>, session: Session) -> Self {
        let stored = match store.get_profile(&session.user_id).await {
            Ok(Some(user)) => Some(user),
            Ok(None) => {
                tracing::info!(user_id = %session.user_id, "No profile document");
                None
            }
            Err(err) => {
                tracing::error!(?err, user_id = %session.user_id, "Failed to load profile");
                None
            }
        };
        let profile = Profile::with_defaults(&session, stored.as_ref());
        Self {
            store,
            session,
            profile,
            edit: EditState::Idle,
        }
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn edit_state(&self) -> &EditState {
        &self.edit
    }

    /// Open the popup of `field` with the current value as draft.
    pub fn begin_edit(&mut self, field: ProfileField) {
        self.edit = EditState::Editing {
            field,
            draft: self.profile.get(field).to_string(),
        };
    }

    pub fn set_draft(&mut self, text: impl Into<String>) -> bool {
        match &mut self.edit {
            EditState::Editing { draft, .. } => {
                *draft = text.into();
                true
            }
            EditState::Idle => false,
        }
    }

    pub fn cancel_edit(&mut self) {
        self.edit = EditState::Idle;
    }

    /// Save the open draft. The popup closes on success and stays open with
    /// its draft on failure.
    pub async fn submit_edit(&mut self) -> Result<()> {
        let EditState::Editing { field, draft } = &self.edit else {
            return Ok(());
        };
        let (field, draft) = (*field, draft.clone());
        self.update(field, &draft).await?;
        self.edit = EditState::Idle;
        Ok(())
    }

    /// Store a new value for one field. Blank values are rejected before the
    /// store is called.
    pub async fn update(&mut self, field: ProfileField, value: &str) -> Result<()> {
        if value.trim().is_empty() {
            tracing::debug!(%field, "Rejecting blank profile value");
            return Err(Error::Validation { field });
        }
        if let Err(err) = self
            .store
            .merge_profile_field(&self.session.user_id, field, value)
            .await
        {
            tracing::error!(?err, %field, "Error updating profile");
            return Err(err.into());
        }
        tracing::info!(%field, user_id = %self.session.user_id, "Profile updated");
        self.profile.set(field, value.to_string());
        Ok(())
    }
}
