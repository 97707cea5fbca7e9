use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;
use crate::domain::post::PostId;
use crate::domain::user::UserId;

pub type CommentId = i64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub author_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Comment row joined with its author, flattened as it comes out of SQL.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct CommentWithAuthor {
    pub id: CommentId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub author_id: UserId,
    pub author_name: String,
    pub author_nick: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentInput {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewComment {
    pub post_id: PostId,
    pub author_id: UserId,
    pub content: String,
}

impl CommentInput {
    pub fn prepare(self, post_id: PostId, author_id: UserId) -> Result<NewComment, DomainError> {
        let content = self.content.trim();
        if content.is_empty() {
            return Err(DomainError::bad_input("comment content is required"));
        }
        Ok(NewComment {
            post_id,
            author_id,
            content: content.to_string(),
        })
    }
}
