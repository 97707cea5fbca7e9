use std::sync::Arc;

use tracing::instrument;

use crate::data::follow_repository::FollowRepository;
use crate::data::user_repository::UserRepository;
use crate::domain::error::DomainError;
use crate::domain::user::{Stage, User, UserId, UserInput};

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    follows: Arc<dyn FollowRepository>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>, follows: Arc<dyn FollowRepository>) -> Self {
        Self { users, follows }
    }

    pub async fn search(&self, name_or_nick: &str) -> Result<Vec<User>, DomainError> {
        self.users.search(name_or_nick).await
    }

    pub async fn get_user(&self, id: UserId) -> Result<User, DomainError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("user {id} not found")))
    }

    #[instrument(skip(self, input))]
    pub async fn update_user(&self, id: UserId, input: UserInput) -> Result<User, DomainError> {
        let changes = input.prepare(Stage::Update)?;
        self.users.update(id, changes).await
    }

    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: UserId) -> Result<(), DomainError> {
        self.users.delete(id).await
    }

    #[instrument(skip(self))]
    pub async fn follow(&self, follower: UserId, followee: UserId) -> Result<(), DomainError> {
        self.follows.follow(follower, followee).await
    }

    #[instrument(skip(self))]
    pub async fn unfollow(&self, follower: UserId, followee: UserId) -> Result<(), DomainError> {
        self.follows.unfollow(follower, followee).await
    }

    pub async fn followers(&self, id: UserId) -> Result<Vec<User>, DomainError> {
        self.follows.followers(id).await
    }

    pub async fn following(&self, id: UserId) -> Result<Vec<User>, DomainError> {
        self.follows.following(id).await
    }
}
