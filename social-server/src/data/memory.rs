//! In-process implementation of every repository trait, used by handler and
//! service tests. Uniqueness, foreign keys and cascades mirror the SQL schema.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::data::comment_repository::CommentRepository;
use crate::data::follow_repository::{FollowRepository, SELF_FOLLOW, SELF_UNFOLLOW};
use crate::data::post_repository::PostRepository;
use crate::data::user_repository::{UserRepository, user_conflict};
use crate::domain::comment::{Comment, CommentId, CommentWithAuthor, NewComment};
use crate::domain::error::DomainError;
use crate::domain::post::{NewPost, Post, PostId, PostWithLikes};
use crate::domain::user::{NewUser, StoredCredentials, User, UserChanges, UserId};

#[derive(Clone)]
struct PostRow {
    id: PostId,
    title: String,
    content: String,
    author_id: UserId,
    created_at: DateTime<Utc>,
}

#[derive(Default)]
struct State {
    ticks: i64,
    next_id: i64,
    users: BTreeMap<UserId, (User, String)>,
    posts: BTreeMap<PostId, PostRow>,
    likes: BTreeSet<(UserId, PostId)>,
    comments: BTreeMap<CommentId, Comment>,
    follows: Vec<(UserId, UserId)>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    /// Strictly increasing timestamps keep ordering deterministic.
    fn now(&mut self) -> DateTime<Utc> {
        self.ticks += 1;
        DateTime::from_timestamp(1_700_000_000 + self.ticks, 0).unwrap_or_default()
    }

    fn nick_of(&self, id: UserId) -> String {
        self.users
            .get(&id)
            .map(|(u, _)| u.nick.clone())
            .unwrap_or_default()
    }

    fn post(&self, row: &PostRow) -> Post {
        Post {
            id: row.id,
            title: row.title.clone(),
            content: row.content.clone(),
            author_id: row.author_id,
            author_nickname: self.nick_of(row.author_id),
            created_at: row.created_at,
        }
    }

    fn with_likes(&self, viewer: UserId, row: &PostRow) -> PostWithLikes {
        PostWithLikes {
            id: row.id,
            title: row.title.clone(),
            content: row.content.clone(),
            author_id: row.author_id,
            author_nickname: self.nick_of(row.author_id),
            created_at: row.created_at,
            likes: self.likes.iter().filter(|(_, p)| *p == row.id).count() as i64,
            liked_by_me: self.likes.contains(&(viewer, row.id)),
        }
    }

    fn unique_clash(&self, skip: Option<UserId>, nick: &str, email: &str) -> Option<DomainError> {
        self.users
            .values()
            .filter(|(u, _)| Some(u.id) != skip)
            .find_map(|(u, _)| {
                if u.nick == nick {
                    Some(user_conflict(Some("users_nick_key")))
                } else if u.email == email {
                    Some(user_conflict(Some("users_email_key")))
                } else {
                    None
                }
            })
    }

    fn remove_post(&mut self, id: PostId) {
        self.posts.remove(&id);
        self.likes.retain(|(_, p)| *p != id);
        self.comments.retain(|_, c| c.post_id != id);
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn follow_count(&self) -> usize {
        self.lock().follows.len()
    }

    pub fn post_count(&self) -> usize {
        self.lock().posts.len()
    }

    pub fn comment_count(&self) -> usize {
        self.lock().comments.len()
    }

    pub fn raw_post(&self, id: PostId) -> Option<(String, String)> {
        self.lock()
            .posts
            .get(&id)
            .map(|p| (p.title.clone(), p.content.clone()))
    }

    pub fn password_hash(&self, id: UserId) -> Option<String> {
        self.lock().users.get(&id).map(|(_, hash)| hash.clone())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: NewUser) -> Result<User, DomainError> {
        let mut state = self.lock();
        if let Some(err) = state.unique_clash(None, &user.nick, &user.email) {
            return Err(err);
        }
        let created = User {
            id: state.next_id(),
            name: user.name,
            nick: user.nick,
            email: user.email,
            created_at: state.now(),
        };
        state
            .users
            .insert(created.id, (created.clone(), user.password_hash));
        Ok(created)
    }

    async fn search(&self, name_or_nick: &str) -> Result<Vec<User>, DomainError> {
        let term = name_or_nick.trim().to_lowercase();
        Ok(self
            .lock()
            .users
            .values()
            .filter(|(u, _)| {
                u.name.to_lowercase().contains(&term) || u.nick.to_lowercase().contains(&term)
            })
            .map(|(u, _)| u.clone())
            .collect())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, DomainError> {
        Ok(self.lock().users.get(&id).map(|(u, _)| u.clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<StoredCredentials, DomainError> {
        self.lock()
            .users
            .values()
            .find(|(u, _)| u.email == email)
            .map(|(u, hash)| StoredCredentials {
                id: u.id,
                email: u.email.clone(),
                password_hash: hash.clone(),
            })
            .ok_or_else(|| DomainError::not_found("user not found"))
    }

    async fn update(&self, id: UserId, changes: UserChanges) -> Result<User, DomainError> {
        let mut state = self.lock();
        let (current, current_hash) = state
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("user {id} not found")))?;

        let email = changes.email.unwrap_or(current.email.clone());
        if let Some(err) = state.unique_clash(Some(id), &changes.nick, &email) {
            return Err(err);
        }

        let updated = User {
            name: changes.name,
            nick: changes.nick,
            email,
            ..current
        };
        let hash = changes.password_hash.unwrap_or(current_hash);
        state.users.insert(id, (updated.clone(), hash));
        Ok(updated)
    }

    async fn delete(&self, id: UserId) -> Result<(), DomainError> {
        let mut state = self.lock();
        if state.users.remove(&id).is_none() {
            return Err(DomainError::not_found(format!("user {id} not found")));
        }
        let owned: Vec<PostId> = state
            .posts
            .values()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        for post in owned {
            state.remove_post(post);
        }
        state.likes.retain(|(u, _)| *u != id);
        state.comments.retain(|_, c| c.author_id != id);
        state.follows.retain(|(a, b)| *a != id && *b != id);
        Ok(())
    }

    async fn get_password(&self, id: UserId) -> Result<String, DomainError> {
        self.password_hash(id)
            .ok_or_else(|| DomainError::not_found(format!("user {id} not found")))
    }

    async fn update_password(&self, id: UserId, password_hash: &str) -> Result<(), DomainError> {
        let mut state = self.lock();
        let entry = state
            .users
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(format!("user {id} not found")))?;
        entry.1 = password_hash.to_string();
        Ok(())
    }
}

#[async_trait]
impl FollowRepository for MemoryStore {
    async fn follow(&self, follower: UserId, followee: UserId) -> Result<(), DomainError> {
        if follower == followee {
            return Err(DomainError::forbidden(SELF_FOLLOW));
        }
        let mut state = self.lock();
        if !state.users.contains_key(&follower) {
            return Err(DomainError::not_found(format!("user {follower} not found")));
        }
        if !state.users.contains_key(&followee) {
            return Err(DomainError::not_found(format!("user {followee} not found")));
        }
        if state.follows.contains(&(follower, followee)) {
            return Err(DomainError::conflict("already following this user"));
        }
        state.follows.push((follower, followee));
        Ok(())
    }

    async fn unfollow(&self, follower: UserId, followee: UserId) -> Result<(), DomainError> {
        if follower == followee {
            return Err(DomainError::forbidden(SELF_UNFOLLOW));
        }
        let mut state = self.lock();
        let before = state.follows.len();
        state.follows.retain(|pair| *pair != (follower, followee));
        if state.follows.len() == before {
            return Err(DomainError::not_found("follow relationship not found"));
        }
        Ok(())
    }

    async fn followers(&self, user: UserId) -> Result<Vec<User>, DomainError> {
        let state = self.lock();
        Ok(state
            .follows
            .iter()
            .rev()
            .filter(|(_, b)| *b == user)
            .filter_map(|(a, _)| state.users.get(a).map(|(u, _)| u.clone()))
            .collect())
    }

    async fn following(&self, user: UserId) -> Result<Vec<User>, DomainError> {
        let state = self.lock();
        Ok(state
            .follows
            .iter()
            .rev()
            .filter(|(a, _)| *a == user)
            .filter_map(|(_, b)| state.users.get(b).map(|(u, _)| u.clone()))
            .collect())
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn create(&self, post: NewPost) -> Result<Post, DomainError> {
        let mut state = self.lock();
        if !state.users.contains_key(&post.author_id) {
            return Err(DomainError::not_found(format!("user {} not found", post.author_id)));
        }
        let row = PostRow {
            id: state.next_id(),
            title: post.title,
            content: post.content,
            author_id: post.author_id,
            created_at: state.now(),
        };
        state.posts.insert(row.id, row.clone());
        Ok(state.post(&row))
    }

    async fn list_with_likes(&self, viewer: UserId) -> Result<Vec<PostWithLikes>, DomainError> {
        let state = self.lock();
        let mut posts: Vec<PostWithLikes> = state
            .posts
            .values()
            .map(|row| state.with_likes(viewer, row))
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(posts)
    }

    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, DomainError> {
        let state = self.lock();
        Ok(state.posts.get(&id).map(|row| state.post(row)))
    }

    async fn find_with_like_info(
        &self,
        viewer: UserId,
        id: PostId,
    ) -> Result<Option<PostWithLikes>, DomainError> {
        let state = self.lock();
        Ok(state.posts.get(&id).map(|row| state.with_likes(viewer, row)))
    }

    async fn update(
        &self,
        id: PostId,
        title: &str,
        content: &str,
    ) -> Result<Option<Post>, DomainError> {
        let mut state = self.lock();
        let Some(row) = state.posts.get_mut(&id) else {
            return Ok(None);
        };
        row.title = title.to_string();
        row.content = content.to_string();
        let row = row.clone();
        Ok(Some(state.post(&row)))
    }

    async fn delete(&self, id: PostId) -> Result<(), DomainError> {
        let mut state = self.lock();
        if !state.posts.contains_key(&id) {
            return Err(DomainError::not_found(format!("post {id} not found")));
        }
        state.remove_post(id);
        Ok(())
    }

    async fn like(&self, user: UserId, post: PostId) -> Result<(), DomainError> {
        let mut state = self.lock();
        if !state.posts.contains_key(&post) {
            return Err(DomainError::not_found(format!("post {post} not found")));
        }
        if !state.users.contains_key(&user) {
            return Err(DomainError::not_found(format!("user {user} not found")));
        }
        if !state.likes.insert((user, post)) {
            return Err(DomainError::conflict("you already liked this post"));
        }
        Ok(())
    }

    async fn unlike(&self, user: UserId, post: PostId) -> Result<bool, DomainError> {
        Ok(self.lock().likes.remove(&(user, post)))
    }

}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn create(&self, comment: NewComment) -> Result<Comment, DomainError> {
        let mut state = self.lock();
        if !state.posts.contains_key(&comment.post_id) {
            return Err(DomainError::not_found(format!("post {} not found", comment.post_id)));
        }
        if !state.users.contains_key(&comment.author_id) {
            return Err(DomainError::not_found(format!(
                "user {} not found",
                comment.author_id
            )));
        }
        let created = Comment {
            id: state.next_id(),
            post_id: comment.post_id,
            author_id: comment.author_id,
            content: comment.content,
            created_at: state.now(),
        };
        state.comments.insert(created.id, created.clone());
        Ok(created)
    }

    async fn list_by_post(&self, post: PostId) -> Result<Vec<CommentWithAuthor>, DomainError> {
        let state = self.lock();
        Ok(state
            .comments
            .values()
            .filter(|c| c.post_id == post)
            .filter_map(|c| {
                state.users.get(&c.author_id).map(|(u, _)| CommentWithAuthor {
                    id: c.id,
                    content: c.content.clone(),
                    created_at: c.created_at,
                    author_id: u.id,
                    author_name: u.name.clone(),
                    author_nick: u.nick.clone(),
                })
            })
            .collect())
    }

    async fn author_of(&self, id: CommentId) -> Result<Option<UserId>, DomainError> {
        Ok(self.lock().comments.get(&id).map(|c| c.author_id))
    }

    async fn delete(&self, id: CommentId) -> Result<(), DomainError> {
        match self.lock().comments.remove(&id) {
            Some(_) => Ok(()),
            None => Err(DomainError::not_found(format!("comment {id} not found"))),
        }
    }
}
