use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

use crate::domain::ensure_max_len;
use crate::domain::error::DomainError;
use crate::infrastructure::security::hash_password;

pub type UserId = i64;

pub const MIN_PASSWORD_LEN: usize = 6;

// widths of the `users` columns
pub const MAX_NAME_LEN: usize = 50;
pub const MAX_NICK_LEN: usize = 50;
pub const MAX_EMAIL_LEN: usize = 100;

/// Public view of a user. The password digest lives only in [`StoredCredentials`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub nick: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredCredentials {
    pub id: UserId,
    pub email: String,
    #[sqlx(rename = "password")]
    pub password_hash: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Create,
    Update,
}

/// Raw user fields as they arrive from a client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub nick: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Normalized fields. `None` means "keep what is stored".
#[derive(Debug, Clone, PartialEq)]
pub struct UserChanges {
    pub name: String,
    pub nick: String,
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub nick: String,
    pub email: String,
    pub password_hash: String,
}

impl UserInput {
    pub fn prepare(self, stage: Stage) -> Result<UserChanges, DomainError> {
        self.validate(stage)?;

        let email = normalize_email(&self.email);
        let password_hash = if self.password.is_empty() {
            None
        } else {
            let hash = hash_password(&self.password)
                .map_err(|e| DomainError::Internal(format!("password hashing failed: {e}")))?;
            Some(hash)
        };

        Ok(UserChanges {
            name: self.name.trim().to_string(),
            nick: self.nick.trim().to_string(),
            email: (!email.is_empty()).then_some(email),
            password_hash,
        })
    }

    fn validate(&self, stage: Stage) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::bad_input("name is required"));
        }
        if self.nick.trim().is_empty() {
            return Err(DomainError::bad_input("nick is required"));
        }
        ensure_max_len("name", self.name.trim(), MAX_NAME_LEN)?;
        ensure_max_len("nick", self.nick.trim(), MAX_NICK_LEN)?;

        let email = normalize_email(&self.email);
        if stage == Stage::Create && email.is_empty() {
            return Err(DomainError::bad_input("email is required"));
        }
        ensure_max_len("email", &email, MAX_EMAIL_LEN)?;
        if !email.is_empty() && !email.validate_email() {
            return Err(DomainError::bad_input("email has an invalid format"));
        }

        // an update may omit the password, but a new one obeys the same rule
        let password_given = stage == Stage::Create || !self.password.is_empty();
        if password_given && self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(DomainError::bad_input(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        Ok(())
    }
}

impl UserChanges {
    /// Registration needs every field; `prepare(Stage::Create)` guarantees them.
    pub fn into_new_user(self) -> Result<NewUser, DomainError> {
        match (self.email, self.password_hash) {
            (Some(email), Some(password_hash)) => Ok(NewUser {
                name: self.name,
                nick: self.nick,
                email,
                password_hash,
            }),
            _ => Err(DomainError::bad_input("email and password are required")),
        }
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
