use std::time::Duration;

use thiserror::Error;

/// Domain-specific errors using thiserror.
///
/// One variant per failure cause; the REST layer collapses them into
/// status codes through [`crate::errors::ErrorCode`].
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("User not found: {id}")]
    UserNotFound { id: i64 },

    #[error("User with email '{email}' already exists")]
    EmailAlreadyExists { email: String },

    #[error("No vote from user {user_id} on profile {profile_id}")]
    VoteNotFound { user_id: i64, profile_id: i64 },

    #[error("User {user_id} must wait {}s before voting again", remaining.as_secs())]
    VoteCooldown { user_id: i64, remaining: Duration },

    #[error("Insertion failed: {message}")]
    InsertionFailed { message: String },

    #[error("Database error: {message}")]
    Database { message: String },

    #[error("Validation failed: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Operation deadline exceeded")]
    DeadlineExceeded,
}

impl DomainError {
    pub fn user_not_found(id: i64) -> Self {
        Self::UserNotFound { id }
    }

    pub fn email_already_exists(email: impl Into<String>) -> Self {
        Self::EmailAlreadyExists {
            email: email.into(),
        }
    }

    pub fn vote_not_found(user_id: i64, profile_id: i64) -> Self {
        Self::VoteNotFound {
            user_id,
            profile_id,
        }
    }

    pub fn vote_cooldown(user_id: i64, remaining: Duration) -> Self {
        Self::VoteCooldown { user_id, remaining }
    }

    pub fn insertion_failed(message: impl Into<String>) -> Self {
        Self::InsertionFailed {
            message: message.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// True for the two interruption variants raised by [`super::ctx::CallCtx`].
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }
}
