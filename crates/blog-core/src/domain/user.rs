use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Clean, max_length, require};
use crate::error::DomainError;

const USERNAME_MAX_LEN: usize = 150;

/// User entity - an account owned by the host authentication system.
///
/// Only the fields that posts, comments and likes rely on are mirrored here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    /// Staff accounts are the only ones offered as post authors.
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new non-staff user with generated ID and timestamp.
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            email: email.into(),
            is_staff: false,
            created_at: Utc::now(),
        }
    }

    /// Create a new staff user.
    pub fn staff(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            is_staff: true,
            ..Self::new(username, email)
        }
    }
}

impl Clean for User {
    fn clean(&mut self) -> Result<(), DomainError> {
        require("username", &self.username)?;
        max_length("username", &self.username, USERNAME_MAX_LEN)
    }
}

impl std::fmt::Display for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.username)
    }
}
