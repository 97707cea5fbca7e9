use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;

use crate::data::{DbFailure, classify, internal, references};
use crate::domain::error::DomainError;
use crate::domain::user::{User, UserId};

pub const SELF_FOLLOW: &str = "you cannot follow yourself";
pub const SELF_UNFOLLOW: &str = "you cannot unfollow yourself";

#[async_trait]
pub trait FollowRepository: Send + Sync {
    async fn follow(&self, follower: UserId, followee: UserId) -> Result<(), DomainError>;
    async fn unfollow(&self, follower: UserId, followee: UserId) -> Result<(), DomainError>;
    /// Users following `user`.
    async fn followers(&self, user: UserId) -> Result<Vec<User>, DomainError>;
    /// Users `user` follows.
    async fn following(&self, user: UserId) -> Result<Vec<User>, DomainError>;
}

#[derive(Clone)]
pub struct PostgresFollowRepository {
    pool: PgPool,
}

impl PostgresFollowRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FollowRepository for PostgresFollowRepository {
    async fn follow(&self, follower: UserId, followee: UserId) -> Result<(), DomainError> {
        if follower == followee {
            return Err(DomainError::forbidden(SELF_FOLLOW));
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| internal("begin follow", e))?;

        let target_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
                .bind(followee)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| internal("check follow target", e))?;
        if !target_exists {
            return Err(DomainError::not_found(format!("user {followee} not found")));
        }

        let already: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM followers WHERE follower_id = $1 AND followee_id = $2)",
        )
        .bind(follower)
        .bind(followee)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| internal("check existing follow", e))?;
        if already {
            return Err(DomainError::conflict("already following this user"));
        }

        // the primary key still decides when two requests race past the check
        sqlx::query("INSERT INTO followers (follower_id, followee_id) VALUES ($1, $2)")
            .bind(follower)
            .bind(followee)
            .execute(&mut *tx)
            .await
            .map_err(|e| match classify(&e) {
                DbFailure::UniqueViolation(_) => {
                    DomainError::conflict("already following this user")
                }
                DbFailure::ForeignKeyViolation(constraint)
                    if references(constraint.as_deref(), "follower_id") =>
                {
                    DomainError::not_found(format!("user {follower} not found"))
                }
                DbFailure::ForeignKeyViolation(_) => {
                    DomainError::not_found(format!("user {followee} not found"))
                }
                DbFailure::CheckViolation => DomainError::forbidden(SELF_FOLLOW),
                _ => internal("insert follow", e),
            })?;

        tx.commit().await.map_err(|e| internal("commit follow", e))?;

        info!(follower_id = follower, followee_id = followee, "user followed");
        Ok(())
    }

    async fn unfollow(&self, follower: UserId, followee: UserId) -> Result<(), DomainError> {
        if follower == followee {
            return Err(DomainError::forbidden(SELF_UNFOLLOW));
        }

        let deleted =
            sqlx::query("DELETE FROM followers WHERE follower_id = $1 AND followee_id = $2")
                .bind(follower)
                .bind(followee)
                .execute(&self.pool)
                .await
                .map_err(|e| internal("delete follow", e))?;

        if deleted.rows_affected() == 0 {
            return Err(DomainError::not_found("follow relationship not found"));
        }

        info!(follower_id = follower, followee_id = followee, "user unfollowed");
        Ok(())
    }

    async fn followers(&self, user: UserId) -> Result<Vec<User>, DomainError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.name, u.nick, u.email, u.created_at
            FROM users u
            INNER JOIN followers f ON u.id = f.follower_id
            WHERE f.followee_id = $1
            ORDER BY f.created_at DESC
            "#,
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| internal("list followers", e))
    }

    async fn following(&self, user: UserId) -> Result<Vec<User>, DomainError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.name, u.nick, u.email, u.created_at
            FROM users u
            INNER JOIN followers f ON u.id = f.followee_id
            WHERE f.follower_id = $1
            ORDER BY f.created_at DESC
            "#,
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| internal("list following", e))
    }
}
