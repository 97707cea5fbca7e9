use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;

use crate::data::{DbFailure, classify, internal, like_pattern, write_error};
use crate::domain::error::DomainError;
use crate::domain::user::{NewUser, StoredCredentials, User, UserChanges, UserId};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: NewUser) -> Result<User, DomainError>;
    /// Case-insensitive substring match on name or nick. An empty term lists everyone.
    async fn search(&self, name_or_nick: &str) -> Result<Vec<User>, DomainError>;
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, DomainError>;
    async fn find_by_email(&self, email: &str) -> Result<StoredCredentials, DomainError>;
    async fn update(&self, id: UserId, changes: UserChanges) -> Result<User, DomainError>;
    async fn delete(&self, id: UserId) -> Result<(), DomainError>;
    async fn get_password(&self, id: UserId) -> Result<String, DomainError>;
    async fn update_password(&self, id: UserId, password_hash: &str) -> Result<(), DomainError>;
}

/// Maps a unique violation on `users` to the field that collided.
pub(crate) fn user_conflict(constraint: Option<&str>) -> DomainError {
    match constraint {
        Some(c) if c.contains("nick") => DomainError::conflict("nick already taken"),
        Some(c) if c.contains("email") => DomainError::conflict("email already registered"),
        _ => DomainError::conflict("user already exists"),
    }
}

fn user_write_error(context: &str, err: sqlx::Error) -> DomainError {
    match classify(&err) {
        DbFailure::UniqueViolation(constraint) => user_conflict(constraint.as_deref()),
        _ => write_error(context, err),
    }
}

#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, DomainError> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, nick, email, password)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, nick, email, created_at
            "#,
        )
        .bind(&user.name)
        .bind(&user.nick)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| user_write_error("create user", e))?;

        info!(user_id = created.id, nick = %created.nick, "user created");
        Ok(created)
    }

    async fn search(&self, name_or_nick: &str) -> Result<Vec<User>, DomainError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, nick, email, created_at
            FROM users
            WHERE name ILIKE $1 OR nick ILIKE $1
            ORDER BY id
            "#,
        )
        .bind(like_pattern(name_or_nick.trim()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| internal("search users", e))
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, DomainError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, nick, email, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| internal("find user by id", e))
    }

    async fn find_by_email(&self, email: &str) -> Result<StoredCredentials, DomainError> {
        sqlx::query_as::<_, StoredCredentials>(
            r#"
            SELECT id, email, password
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| internal("find user by email", e))?
        .ok_or_else(|| DomainError::not_found("user not found"))
    }

    async fn update(&self, id: UserId, changes: UserChanges) -> Result<User, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| internal("begin user update", e))?;

        let current = sqlx::query_as::<_, (String, String)>(
            "SELECT email, password FROM users WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| internal("load user for update", e))?
        .ok_or_else(|| DomainError::not_found(format!("user {id} not found")))?;

        let (current_email, current_password) = current;
        let email = changes.email.unwrap_or(current_email);
        let password = changes.password_hash.unwrap_or(current_password);

        let updated = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = $1, nick = $2, email = $3, password = $4
            WHERE id = $5
            RETURNING id, name, nick, email, created_at
            "#,
        )
        .bind(&changes.name)
        .bind(&changes.nick)
        .bind(&email)
        .bind(&password)
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| user_write_error("update user", e))?;

        tx.commit()
            .await
            .map_err(|e| internal("commit user update", e))?;

        info!(user_id = id, "user updated");
        Ok(updated)
    }

    async fn delete(&self, id: UserId) -> Result<(), DomainError> {
        let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| internal("delete user", e))?;

        if deleted.rows_affected() == 0 {
            return Err(DomainError::not_found(format!("user {id} not found")));
        }

        info!(user_id = id, "user deleted");
        Ok(())
    }

    async fn get_password(&self, id: UserId) -> Result<String, DomainError> {
        sqlx::query_scalar::<_, String>("SELECT password FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| internal("get password", e))?
            .ok_or_else(|| DomainError::not_found(format!("user {id} not found")))
    }

    async fn update_password(&self, id: UserId, password_hash: &str) -> Result<(), DomainError> {
        let updated = sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| internal("update password", e))?;

        if updated.rows_affected() == 0 {
            return Err(DomainError::not_found(format!("user {id} not found")));
        }

        info!(user_id = id, "password updated");
        Ok(())
    }
}


#[cfg(all(test, feature = "postgres-tests"))]
mod postgres_tests {
    use super::*;
    use crate::data::fixtures;
    use crate::domain::user::MAX_NAME_LEN;
    use assert_matches::assert_matches;

    fn new_user(nick: &str, email: &str) -> NewUser {
        NewUser {
            name: "Someone".into(),
            nick: nick.into(),
            email: email.into(),
            password_hash: "digest".into(),
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn unique_constraints_map_to_the_colliding_field(pool: PgPool) {
        let repo = PostgresUserRepository::new(pool.clone());
        fixtures::user(&pool, "ana1").await;

        let err = repo.create(new_user("ana1", "other@x.com")).await.unwrap_err();
        assert_matches!(&err, DomainError::Conflict(_));
        assert_eq!(err.to_string(), "nick already taken");

        let err = repo.create(new_user("other", "ana1@x.com")).await.unwrap_err();
        assert_eq!(err.to_string(), "email already registered");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn partial_update_keeps_stored_email_and_password(pool: PgPool) {
        let repo = PostgresUserRepository::new(pool.clone());
        let ana = fixtures::user(&pool, "ana1").await;

        let updated = repo
            .update(
                ana.id,
                UserChanges {
                    name: "Ana Maria".into(),
                    nick: "ana2".into(),
                    email: None,
                    password_hash: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Ana Maria");
        assert_eq!(updated.nick, "ana2");
        assert_eq!(updated.email, "ana1@x.com");
        assert_eq!(repo.get_password(ana.id).await.unwrap(), "digest");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn update_into_a_taken_nick_is_a_conflict(pool: PgPool) {
        let repo = PostgresUserRepository::new(pool.clone());
        fixtures::user(&pool, "ana1").await;
        let bob = fixtures::user(&pool, "bob").await;

        let changes = UserChanges {
            name: "Bob".into(),
            nick: "ana1".into(),
            email: None,
            password_hash: None,
        };
        assert_matches!(repo.update(bob.id, changes).await, Err(DomainError::Conflict(_)));
        assert_matches!(
            repo.update(
                999,
                UserChanges {
                    name: "x".into(),
                    nick: "x".into(),
                    email: None,
                    password_hash: None,
                }
            )
            .await,
            Err(DomainError::NotFound(_))
        );
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn oversized_values_are_bad_input(pool: PgPool) {
        let repo = PostgresUserRepository::new(pool);
        let mut user = new_user("ana1", "ana1@x.com");
        user.name = "a".repeat(MAX_NAME_LEN + 1);

        assert_matches!(repo.create(user).await, Err(DomainError::BadInput(_)));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn search_ignores_case_and_matches_wildcards_literally(pool: PgPool) {
        let repo = PostgresUserRepository::new(pool.clone());
        fixtures::user(&pool, "ana1").await;
        fixtures::user(&pool, "bob_2").await;

        let found = repo.search("ANA").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].nick, "ana1");

        let found = repo.search("_").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].nick, "bob_2");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn delete_cascades_and_reports_missing_users(pool: PgPool) {
        let repo = PostgresUserRepository::new(pool.clone());
        let ana = fixtures::user(&pool, "ana1").await;
        fixtures::post(&pool, &ana, "hello").await;

        repo.delete(ana.id).await.unwrap();

        let posts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(posts, 0);
        assert_matches!(repo.delete(ana.id).await, Err(DomainError::NotFound(_)));
        assert_matches!(
            repo.find_by_email("ana1@x.com").await,
            Err(DomainError::NotFound(_))
        );
    }
}
