use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::comment::{Comment, CommentWithAuthor};
use crate::domain::post::{Post, PostWithLikes};
use crate::domain::user::{User, UserId};

// ======================= AUTH =======================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: i64,
    pub token_type: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordUpdateRequest {
    #[serde(
        default,
        rename = "oldPassword",
        alias = "OldPassword",
        alias = "old_password"
    )]
    pub old_password: String,
    #[serde(
        default,
        rename = "newPassword",
        alias = "NewPassword",
        alias = "new_password"
    )]
    pub new_password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ======================= USERS =======================

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub user: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: UserId,
    pub name: String,
    pub nick: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            nick: user.nick,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

// ======================= POSTS =======================

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author_id: UserId,
    pub author_nickname: String,
    pub created_at: DateTime<Utc>,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            title: post.title,
            content: post.content,
            author_id: post.author_id,
            author_nickname: post.author_nickname,
            created_at: post.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostWithLikesResponse {
    #[serde(flatten)]
    pub post: PostResponse,
    pub likes: i64,
    #[serde(rename = "likedByMe")]
    pub liked_by_me: bool,
}

impl From<PostWithLikes> for PostWithLikesResponse {
    fn from(p: PostWithLikes) -> Self {
        Self {
            post: PostResponse {
                id: p.id,
                title: p.title,
                content: p.content,
                author_id: p.author_id,
                author_nickname: p.author_nickname,
                created_at: p.created_at,
            },
            likes: p.likes,
            liked_by_me: p.liked_by_me,
        }
    }
}

// ======================= COMMENTS =======================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedCommentResponse {
    pub id: i64,
    pub post_id: i64,
    pub author_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<Comment> for CreatedCommentResponse {
    fn from(c: Comment) -> Self {
        Self {
            id: c.id,
            post_id: c.post_id,
            author_id: c.author_id,
            content: c.content,
            created_at: c.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CommentAuthor {
    pub id: UserId,
    pub name: String,
    pub nick: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub author: CommentAuthor,
}

impl From<CommentWithAuthor> for CommentResponse {
    fn from(c: CommentWithAuthor) -> Self {
        Self {
            id: c.id,
            content: c.content,
            created_at: c.created_at,
            author: CommentAuthor {
                id: c.author_id,
                name: c.author_name,
                nick: c.author_nick,
            },
        }
    }
}

// ======================= HEALTH =======================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}
