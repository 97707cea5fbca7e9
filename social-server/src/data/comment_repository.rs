use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;

use crate::data::{DbFailure, classify, internal, references, write_error};
use crate::domain::comment::{Comment, CommentId, CommentWithAuthor, NewComment};
use crate::domain::error::DomainError;
use crate::domain::post::PostId;
use crate::domain::user::UserId;

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create(&self, comment: NewComment) -> Result<Comment, DomainError>;
    /// Oldest first.
    async fn list_by_post(&self, post: PostId) -> Result<Vec<CommentWithAuthor>, DomainError>;
    async fn author_of(&self, id: CommentId) -> Result<Option<UserId>, DomainError>;
    async fn delete(&self, id: CommentId) -> Result<(), DomainError>;
}

#[derive(Clone)]
pub struct PostgresCommentRepository {
    pool: PgPool,
}

impl PostgresCommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn create(&self, comment: NewComment) -> Result<Comment, DomainError> {
        let created = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (post_id, author_id, content)
            VALUES ($1, $2, $3)
            RETURNING id, post_id, author_id, content, created_at
            "#,
        )
        .bind(comment.post_id)
        .bind(comment.author_id)
        .bind(&comment.content)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match classify(&e) {
            DbFailure::ForeignKeyViolation(constraint)
                if references(constraint.as_deref(), "author_id") =>
            {
                DomainError::not_found(format!("user {} not found", comment.author_id))
            }
            DbFailure::ForeignKeyViolation(_) => {
                DomainError::not_found(format!("post {} not found", comment.post_id))
            }
            _ => write_error("create comment", e),
        })?;

        info!(comment_id = created.id, post_id = created.post_id, "comment created");
        Ok(created)
    }

    async fn list_by_post(&self, post: PostId) -> Result<Vec<CommentWithAuthor>, DomainError> {
        sqlx::query_as::<_, CommentWithAuthor>(
            r#"
            SELECT
                c.id,
                c.content,
                c.created_at,
                u.id AS author_id,
                u.name AS author_name,
                u.nick AS author_nick
            FROM comments c
            INNER JOIN users u ON u.id = c.author_id
            WHERE c.post_id = $1
            ORDER BY c.created_at ASC, c.id ASC
            "#,
        )
        .bind(post)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| internal("list comments", e))
    }

    async fn author_of(&self, id: CommentId) -> Result<Option<UserId>, DomainError> {
        sqlx::query_scalar("SELECT author_id FROM comments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| internal("find comment author", e))
    }

    async fn delete(&self, id: CommentId) -> Result<(), DomainError> {
        let deleted = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| internal("delete comment", e))?;

        if deleted.rows_affected() == 0 {
            return Err(DomainError::not_found(format!("comment {id} not found")));
        }

        info!(comment_id = id, "comment deleted");
        Ok(())
    }
}
