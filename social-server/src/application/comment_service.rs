use std::sync::Arc;

use tracing::instrument;

use crate::data::comment_repository::CommentRepository;
use crate::domain::comment::{Comment, CommentId, CommentInput, CommentWithAuthor};
use crate::domain::error::DomainError;
use crate::domain::post::PostId;
use crate::domain::user::UserId;

#[derive(Clone)]
pub struct CommentService {
    repo: Arc<dyn CommentRepository>,
}

impl CommentService {
    pub fn new(repo: Arc<dyn CommentRepository>) -> Self {
        Self { repo }
    }

    #[instrument(skip(self, input))]
    pub async fn add_comment(
        &self,
        post_id: PostId,
        author_id: UserId,
        input: CommentInput,
    ) -> Result<Comment, DomainError> {
        let comment = input.prepare(post_id, author_id)?;
        self.repo.create(comment).await
    }

    pub async fn comments_for(&self, post_id: PostId) -> Result<Vec<CommentWithAuthor>, DomainError> {
        self.repo.list_by_post(post_id).await
    }

    pub async fn author_of(&self, id: CommentId) -> Result<UserId, DomainError> {
        self.repo
            .author_of(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("comment {id} not found")))
    }

    #[instrument(skip(self))]
    pub async fn delete_comment(&self, id: CommentId) -> Result<(), DomainError> {
        self.repo.delete(id).await
    }
}
