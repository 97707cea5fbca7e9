use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;

use crate::data::{DbFailure, classify, internal, references, write_error};
use crate::domain::error::DomainError;
use crate::domain::post::{NewPost, Post, PostId, PostWithLikes};
use crate::domain::user::UserId;

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, post: NewPost) -> Result<Post, DomainError>;
    /// Whole feed, newest first, with like aggregates for `viewer`.
    async fn list_with_likes(&self, viewer: UserId) -> Result<Vec<PostWithLikes>, DomainError>;
    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, DomainError>;
    async fn find_with_like_info(
        &self,
        viewer: UserId,
        id: PostId,
    ) -> Result<Option<PostWithLikes>, DomainError>;
    async fn update(
        &self,
        id: PostId,
        title: &str,
        content: &str,
    ) -> Result<Option<Post>, DomainError>;
    async fn delete(&self, id: PostId) -> Result<(), DomainError>;
    async fn like(&self, user: UserId, post: PostId) -> Result<(), DomainError>;
    /// Returns whether a like was actually removed.
    async fn unlike(&self, user: UserId, post: PostId) -> Result<bool, DomainError>;
}

#[derive(Clone)]
pub struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create(&self, post: NewPost) -> Result<Post, DomainError> {
        let created = sqlx::query_as::<_, Post>(
            r#"
            WITH inserted AS (
                INSERT INTO posts (title, content, author_id)
                VALUES ($1, $2, $3)
                RETURNING id, title, content, author_id, created_at
            )
            SELECT i.id, i.title, i.content, i.author_id, u.nick AS author_nickname, i.created_at
            FROM inserted i
            INNER JOIN users u ON u.id = i.author_id
            "#,
        )
        .bind(&post.title)
        .bind(&post.content)
        .bind(post.author_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match classify(&e) {
            DbFailure::ForeignKeyViolation(_) => {
                DomainError::not_found(format!("user {} not found", post.author_id))
            }
            _ => write_error("create post", e),
        })?;

        info!(post_id = created.id, author_id = created.author_id, "post created");
        Ok(created)
    }

    async fn list_with_likes(&self, viewer: UserId) -> Result<Vec<PostWithLikes>, DomainError> {
        // "liked by me" is a correlated EXISTS so it cannot multiply the COUNT rows
        sqlx::query_as::<_, PostWithLikes>(
            r#"
            SELECT
                p.id,
                p.title,
                p.content,
                p.author_id,
                u.nick AS author_nickname,
                p.created_at,
                COUNT(l.post_id) AS likes,
                EXISTS(
                    SELECT 1 FROM likes mine WHERE mine.user_id = $1 AND mine.post_id = p.id
                ) AS liked_by_me
            FROM posts p
            INNER JOIN users u ON u.id = p.author_id
            LEFT JOIN likes l ON l.post_id = p.id
            GROUP BY p.id, u.nick
            ORDER BY p.created_at DESC, p.id DESC
            "#,
        )
        .bind(viewer)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| internal("list posts", e))
    }

    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, DomainError> {
        sqlx::query_as::<_, Post>(
            r#"
            SELECT p.id, p.title, p.content, p.author_id, u.nick AS author_nickname, p.created_at
            FROM posts p
            INNER JOIN users u ON u.id = p.author_id
            WHERE p.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| internal("find post by id", e))
    }

    async fn find_with_like_info(
        &self,
        viewer: UserId,
        id: PostId,
    ) -> Result<Option<PostWithLikes>, DomainError> {
        sqlx::query_as::<_, PostWithLikes>(
            r#"
            SELECT
                p.id,
                p.title,
                p.content,
                p.author_id,
                u.nick AS author_nickname,
                p.created_at,
                (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS likes,
                EXISTS(
                    SELECT 1 FROM likes mine WHERE mine.user_id = $1 AND mine.post_id = p.id
                ) AS liked_by_me
            FROM posts p
            INNER JOIN users u ON u.id = p.author_id
            WHERE p.id = $2
            "#,
        )
        .bind(viewer)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| internal("find post with like info", e))
    }

    async fn update(
        &self,
        id: PostId,
        title: &str,
        content: &str,
    ) -> Result<Option<Post>, DomainError> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            WITH updated AS (
                UPDATE posts
                SET title = $1, content = $2
                WHERE id = $3
                RETURNING id, title, content, author_id, created_at
            )
            SELECT p.id, p.title, p.content, p.author_id, u.nick AS author_nickname, p.created_at
            FROM updated p
            INNER JOIN users u ON u.id = p.author_id
            "#,
        )
        .bind(title)
        .bind(content)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| write_error("update post", e))?;

        if post.is_some() {
            info!(post_id = id, "post updated");
        }

        Ok(post)
    }

    async fn delete(&self, id: PostId) -> Result<(), DomainError> {
        let deleted = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| internal("delete post", e))?;

        if deleted.rows_affected() == 0 {
            return Err(DomainError::not_found(format!("post {id} not found")));
        }

        info!(post_id = id, "post deleted");
        Ok(())
    }

    async fn like(&self, user: UserId, post: PostId) -> Result<(), DomainError> {
        sqlx::query("INSERT INTO likes (user_id, post_id) VALUES ($1, $2)")
            .bind(user)
            .bind(post)
            .execute(&self.pool)
            .await
            .map_err(|e| match classify(&e) {
                DbFailure::UniqueViolation(_) => {
                    DomainError::conflict("you already liked this post")
                }
                DbFailure::ForeignKeyViolation(constraint)
                    if references(constraint.as_deref(), "user_id") =>
                {
                    DomainError::not_found(format!("user {user} not found"))
                }
                DbFailure::ForeignKeyViolation(_) => {
                    DomainError::not_found(format!("post {post} not found"))
                }
                _ => internal("insert like", e),
            })?;

        info!(user_id = user, post_id = post, "post liked");
        Ok(())
    }

    async fn unlike(&self, user: UserId, post: PostId) -> Result<bool, DomainError> {
        let deleted = sqlx::query("DELETE FROM likes WHERE user_id = $1 AND post_id = $2")
            .bind(user)
            .bind(post)
            .execute(&self.pool)
            .await
            .map_err(|e| internal("delete like", e))?;

        let removed = deleted.rows_affected() > 0;
        if removed {
            info!(user_id = user, post_id = post, "post unliked");
        }
        Ok(removed)
    }
}
