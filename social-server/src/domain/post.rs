use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ensure_max_len;
use crate::domain::error::DomainError;
use crate::domain::user::UserId;

pub type PostId = i64;

/// Width of `posts.title`.
pub const MAX_TITLE_LEN: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub content: String,
    pub author_id: UserId,
    pub author_nickname: String,
    pub created_at: DateTime<Utc>,
}

/// A post together with the like aggregate as seen by one viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PostWithLikes {
    pub id: PostId,
    pub title: String,
    pub content: String,
    pub author_id: UserId,
    pub author_nickname: String,
    pub created_at: DateTime<Utc>,
    pub likes: i64,
    #[serde(rename = "likedByMe")]
    pub liked_by_me: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub author_id: UserId,
}

impl PostInput {
    pub fn prepare(self, author_id: UserId) -> Result<NewPost, DomainError> {
        let title = self.title.trim();
        let content = self.content.trim();

        if title.is_empty() {
            return Err(DomainError::bad_input("title is required"));
        }
        ensure_max_len("title", title, MAX_TITLE_LEN)?;
        if content.is_empty() {
            return Err(DomainError::bad_input("content is required"));
        }
        if author_id == 0 {
            return Err(DomainError::bad_input("author is required"));
        }

        Ok(NewPost {
            title: title.to_string(),
            content: content.to_string(),
            author_id,
        })
    }
}
