use std::sync::Arc;

use tracing::instrument;

use crate::data::post_repository::PostRepository;
use crate::domain::error::DomainError;
use crate::domain::post::{Post, PostId, PostInput, PostWithLikes};
use crate::domain::user::UserId;

#[derive(Clone)]
pub struct PostService {
    repo: Arc<dyn PostRepository>,
}

fn post_not_found(id: PostId) -> DomainError {
    DomainError::not_found(format!("post {id} not found"))
}

impl PostService {
    pub fn new(repo: Arc<dyn PostRepository>) -> Self {
        Self { repo }
    }

    pub async fn get_post(&self, id: PostId) -> Result<Post, DomainError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| post_not_found(id))
    }

    pub async fn get_post_with_likes(
        &self,
        viewer: UserId,
        id: PostId,
    ) -> Result<PostWithLikes, DomainError> {
        self.repo
            .find_with_like_info(viewer, id)
            .await?
            .ok_or_else(|| post_not_found(id))
    }

    pub async fn feed(&self, viewer: UserId) -> Result<Vec<PostWithLikes>, DomainError> {
        self.repo.list_with_likes(viewer).await
    }

    #[instrument(skip(self, input))]
    pub async fn create_post(&self, author_id: UserId, input: PostInput) -> Result<Post, DomainError> {
        let post = input.prepare(author_id)?;
        self.repo.create(post).await
    }

    /// The author is never changed by an update.
    #[instrument(skip(self, input))]
    pub async fn update_post(
        &self,
        author_id: UserId,
        post_id: PostId,
        input: PostInput,
    ) -> Result<Post, DomainError> {
        let changes = input.prepare(author_id)?;
        self.repo
            .update(post_id, &changes.title, &changes.content)
            .await?
            .ok_or_else(|| post_not_found(post_id))
    }

    #[instrument(skip(self))]
    pub async fn delete_post(&self, post_id: PostId) -> Result<(), DomainError> {
        self.repo.delete(post_id).await
    }

    #[instrument(skip(self))]
    pub async fn like(&self, user: UserId, post_id: PostId) -> Result<PostWithLikes, DomainError> {
        self.repo.like(user, post_id).await?;
        self.get_post_with_likes(user, post_id).await
    }

    #[instrument(skip(self))]
    pub async fn unlike(&self, user: UserId, post_id: PostId) -> Result<PostWithLikes, DomainError> {
        self.repo.unlike(user, post_id).await?;
        self.get_post_with_likes(user, post_id).await
    }
}
