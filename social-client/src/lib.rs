//! Typed HTTP client for the social API server.

mod error;
mod http_client;
mod models;

pub use error::ClientError;
pub use http_client::SocialClient;
pub use models::{
    Comment, CommentAuthor, CommentWithAuthor, Message, NewUser, Post, PostWithLikes,
    TokenResponse, User, UserUpdate,
};
