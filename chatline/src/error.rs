use crate::profile::ProfileField;

/// Failures an operation reports to its caller so it can give the user
/// feedback. Rendering failures never surface here; they become sentinel text.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Please enter a valid {field}.")]
    Validation { field: ProfileField },
    #[error("Only the sender can delete this message")]
    NotOwner,
    #[error("Message does not have a valid id")]
    MissingMessageId,
    #[error("Message text is empty")]
    EmptyMessage,
    #[error("Message not found in this thread")]
    UnknownMessage,
    #[error("No signed-in user")]
    NoSession,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
