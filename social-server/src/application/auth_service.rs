use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::data::user_repository::UserRepository;
use crate::domain::error::DomainError;
use crate::domain::user::{MIN_PASSWORD_LEN, Stage, User, UserId, UserInput, normalize_email};
use crate::infrastructure::credentials::CredentialCodec;
use crate::infrastructure::security::{hash_password, verify_password};

const BAD_LOGIN: &str = "invalid email or password";

#[derive(Clone)]
pub struct AuthService {
    repo: Arc<dyn UserRepository>,
    codec: CredentialCodec,
}

impl AuthService {
    pub fn new(repo: Arc<dyn UserRepository>, codec: CredentialCodec) -> Self {
        Self { repo, codec }
    }

    pub fn codec(&self) -> &CredentialCodec {
        &self.codec
    }

    #[instrument(skip(self, input), fields(nick = %input.nick))]
    pub async fn register(&self, input: UserInput) -> Result<User, DomainError> {
        let user = input.prepare(Stage::Create)?.into_new_user()?;
        self.repo.create(user).await
    }

    /// Checks an email/password pair and returns the owner's id.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<UserId, DomainError> {
        let stored = match self.repo.find_by_email(&normalize_email(email)).await {
            Ok(stored) => stored,
            Err(DomainError::NotFound(_)) => {
                return Err(DomainError::Unauthenticated(BAD_LOGIN.into()));
            }
            Err(err) => return Err(err),
        };

        if !verify_password(password, &stored.password_hash) {
            warn!(user_id = stored.id, "password mismatch");
            return Err(DomainError::Unauthenticated(BAD_LOGIN.into()));
        }
        Ok(stored.id)
    }

    #[instrument(skip(self, password))]
    pub async fn issue_token(&self, email: &str, password: &str) -> Result<String, DomainError> {
        let user_id = self.authenticate(email, password).await?;
        let subject = u64::try_from(user_id)
            .map_err(|_| DomainError::Internal(format!("user id {user_id} is negative")))?;
        let token = self.codec.issue(subject).map_err(|e| DomainError::Internal(e.to_string()))?;
        info!(user_id, "credential issued");
        Ok(token)
    }

    #[instrument(skip(self, old_password, new_password))]
    pub async fn change_password(
        &self,
        user_id: UserId,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), DomainError> {
        if old_password.is_empty() || new_password.is_empty() {
            return Err(DomainError::bad_input(
                "both the current and the new password are required",
            ));
        }
        if new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(DomainError::bad_input(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let current = self.repo.get_password(user_id).await?;
        if !verify_password(old_password, &current) {
            return Err(DomainError::Unauthenticated(
                "current password is incorrect".into(),
            ));
        }

        let hash = hash_password(new_password)
            .map_err(|e| DomainError::Internal(format!("password hashing failed: {e}")))?;
        self.repo.update_password(user_id, &hash).await
    }
}
