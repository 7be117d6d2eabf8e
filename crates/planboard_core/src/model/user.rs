//! User directory record.
//!
//! # Responsibility
//! - Define the user shape plans and comments point at.
//! - Define the reduced projections used when resolving plan references.
//!
//! # Invariants
//! - `id` is stable and never nil.
//! - `name` and `email` are non-empty after trimming.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

use super::now_epoch_ms;

/// Stable identifier of a user directory entry.
pub type UserId = Uuid;

/// Validation failures for user records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserValidationError {
    NilId,
    BlankName,
    BlankEmail,
}

impl Display for UserValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "user id cannot be nil"),
            Self::BlankName => write!(f, "user name cannot be blank"),
            Self::BlankEmail => write!(f, "user email cannot be blank"),
        }
    }
}

impl Error for UserValidationError {}

/// Full user directory record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    /// Optional handle; empty when the directory has none.
    pub username: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl User {
    /// Creates a user with a generated id and trimmed contact fields.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into().trim().to_string(),
            email: email.into().trim().to_string(),
            username: String::new(),
            created_at: now_epoch_ms(),
        }
    }

    /// Sets the optional username handle.
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into().trim().to_string();
        self
    }

    pub fn validate(&self) -> Result<(), UserValidationError> {
        if self.id.is_nil() {
            return Err(UserValidationError::NilId);
        }
        if self.name.trim().is_empty() {
            return Err(UserValidationError::BlankName);
        }
        if self.email.trim().is_empty() {
            return Err(UserValidationError::BlankEmail);
        }
        Ok(())
    }
}

/// Owner projection used by `load`: id, name and email only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContact {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

/// Owner projection used by `list`: id and name only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserName {
    pub id: UserId,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::{User, UserValidationError};

    #[test]
    fn new_trims_contact_fields() {
        let user = User::new("  Ada ", " ada@example.com\n").with_username(" ada ");
        assert_eq!(user.name, "Ada");
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.username, "ada");
        assert!(user.validate().is_ok());
    }

    #[test]
    fn validate_rejects_blank_email() {
        let user = User::new("Ada", "   ");
        assert_eq!(user.validate(), Err(UserValidationError::BlankEmail));
    }
}
