use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ClientError;
use crate::models::{
    Comment, CommentWithAuthor, Credentials, Listing, Message, NewUser, PasswordChange, Post,
    PostBody, PostWithLikes, TokenResponse, User, UserUpdate,
};

/// HTTP client for the social API. The bearer token is kept in memory and,
/// when a token file is configured, persisted there between runs.
#[derive(Clone)]
pub struct SocialClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    token_file: Option<PathBuf>,
}

impl SocialClient {
    pub fn new(endpoint: &str) -> Result<Self, ClientError> {
        Ok(Self {
            client: Client::builder().build()?,
            base_url: endpoint.trim_end_matches('/').to_string(),
            token: None,
            token_file: None,
        })
    }

    /// Uses `path` for token persistence and loads a token saved there earlier.
    pub fn with_token_file(mut self, path: impl Into<PathBuf>) -> Result<Self, ClientError> {
        let path = path.into();
        match fs::read_to_string(&path) {
            Ok(saved) => {
                let saved = saved.trim();
                if !saved.is_empty() {
                    self.token = Some(saved.to_string());
                }
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }
        self.token_file = Some(path);
        Ok(self)
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn set_token(&mut self, token: String) -> Result<(), ClientError> {
        if let Some(path) = &self.token_file {
            fs::write(path, &token)?;
        }
        self.token = Some(token);
        Ok(())
    }

    pub fn logout(&mut self) -> Result<(), ClientError> {
        self.token = None;
        if let Some(path) = &self.token_file {
            match fs::remove_file(path) {
                Err(err) if err.kind() != ErrorKind::NotFound => return Err(err.into()),
                _ => {}
            }
        }
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authed(&self, req: RequestBuilder) -> Result<RequestBuilder, ClientError> {
        let token = self.token.as_deref().ok_or(ClientError::NotLoggedIn)?;
        let value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| ClientError::InvalidRequest("stored token is not a valid header".into()))?;
        Ok(req.header(AUTHORIZATION, value))
    }

    async fn json<T: DeserializeOwned>(resp: Response) -> Result<T, ClientError> {
        if resp.status().is_success() {
            Ok(resp.json().await?)
        } else {
            Err(ClientError::from_http_response(resp).await)
        }
    }

    async fn message(resp: Response) -> Result<String, ClientError> {
        Ok(Self::json::<Message>(resp).await?.message)
    }

    // ======================= AUTH =======================

    pub async fn register(&self, user: &NewUser<'_>) -> Result<User, ClientError> {
        let resp = self.client.post(self.url("/users")).json(user).send().await?;
        Self::json(resp).await
    }

    /// Exchanges email and password for a bearer token and stores it.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<TokenResponse, ClientError> {
        let resp = self
            .client
            .post(self.url("/token"))
            .json(&Credentials { email, password })
            .send()
            .await?;
        let token: TokenResponse = Self::json(resp).await?;
        debug!(expires_in = token.expires_in, "token received");
        self.set_token(token.access_token.clone())?;
        Ok(token)
    }

    /// Checks a password pair without issuing a token.
    pub async fn check_login(&self, email: &str, password: &str) -> Result<String, ClientError> {
        let resp = self
            .client
            .post(self.url("/login"))
            .json(&Credentials { email, password })
            .send()
            .await?;
        if resp.status().is_success() {
            Ok(resp.text().await?)
        } else {
            Err(ClientError::from_http_response(resp).await)
        }
    }

    pub async fn change_password(
        &self,
        user_id: i64,
        old_password: &str,
        new_password: &str,
    ) -> Result<String, ClientError> {
        let req = self
            .client
            .post(self.url(&format!("/user/{user_id}/password-update")))
            .json(&PasswordChange {
                old_password,
                new_password,
            });
        Self::message(self.authed(req)?.send().await?).await
    }

    // ======================= USERS =======================

    pub async fn user(&self, id: i64) -> Result<User, ClientError> {
        let req = self.client.get(self.url(&format!("/users/{id}")));
        Self::json(self.authed(req)?.send().await?).await
    }

    /// An empty result comes back as `404`, which is mapped to an empty list.
    pub async fn search(&self, term: &str) -> Result<Vec<User>, ClientError> {
        let req = self.client.get(self.url("/users")).query(&[("user", term)]);
        let resp = self.authed(req)?.send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        Self::json(resp).await
    }

    pub async fn update_user(&self, id: i64, update: &UserUpdate<'_>) -> Result<User, ClientError> {
        let req = self.client.put(self.url(&format!("/users/{id}"))).json(update);
        Self::json(self.authed(req)?.send().await?).await
    }

    pub async fn delete_user(&self, id: i64) -> Result<(), ClientError> {
        let req = self.client.delete(self.url(&format!("/users/{id}")));
        let resp = self.authed(req)?.send().await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(ClientError::from_http_response(resp).await)
        }
    }

    pub async fn follow(&self, id: i64) -> Result<String, ClientError> {
        let req = self.client.post(self.url(&format!("/user/{id}/userFollowed")));
        Self::message(self.authed(req)?.send().await?).await
    }

    pub async fn unfollow(&self, id: i64) -> Result<String, ClientError> {
        let req = self.client.post(self.url(&format!("/user/{id}/unfollowed")));
        Self::message(self.authed(req)?.send().await?).await
    }

    pub async fn followers(&self, id: i64) -> Result<Vec<User>, ClientError> {
        let req = self.client.get(self.url(&format!("/user/{id}/followers")));
        let listing: Listing<User> = Self::json(self.authed(req)?.send().await?).await?;
        Ok(listing.into_vec())
    }

    pub async fn following(&self, id: i64) -> Result<Vec<User>, ClientError> {
        let req = self.client.get(self.url(&format!("/user/{id}/following")));
        let listing: Listing<User> = Self::json(self.authed(req)?.send().await?).await?;
        Ok(listing.into_vec())
    }

    // ======================= POSTS =======================

    pub async fn posts(&self) -> Result<Vec<PostWithLikes>, ClientError> {
        let req = self.client.get(self.url("/posts"));
        Self::json(self.authed(req)?.send().await?).await
    }

    pub async fn post(&self, id: i64) -> Result<PostWithLikes, ClientError> {
        let req = self.client.get(self.url(&format!("/posts/{id}")));
        Self::json(self.authed(req)?.send().await?).await
    }

    pub async fn create_post(&self, title: &str, content: &str) -> Result<Post, ClientError> {
        let req = self
            .client
            .post(self.url("/posts"))
            .json(&PostBody { title, content });
        Self::json(self.authed(req)?.send().await?).await
    }

    pub async fn update_post(&self, id: i64, title: &str, content: &str) -> Result<Post, ClientError> {
        let req = self
            .client
            .put(self.url(&format!("/posts/{id}")))
            .json(&PostBody { title, content });
        Self::json(self.authed(req)?.send().await?).await
    }

    pub async fn delete_post(&self, id: i64) -> Result<String, ClientError> {
        let req = self.client.delete(self.url(&format!("/posts/{id}")));
        Self::message(self.authed(req)?.send().await?).await
    }

    pub async fn like(&self, id: i64) -> Result<PostWithLikes, ClientError> {
        let req = self.client.post(self.url(&format!("/posts/{id}/like")));
        Self::json(self.authed(req)?.send().await?).await
    }

    pub async fn unlike(&self, id: i64) -> Result<PostWithLikes, ClientError> {
        let req = self.client.delete(self.url(&format!("/posts/{id}/unlike")));
        Self::json(self.authed(req)?.send().await?).await
    }

    // ======================= COMMENTS =======================

    pub async fn comment(&self, post_id: i64, content: &str) -> Result<Comment, ClientError> {
        let req = self
            .client
            .post(self.url(&format!("/posts/{post_id}/comments")))
            .json(&serde_json::json!({ "content": content }));
        Self::json(self.authed(req)?.send().await?).await
    }

    pub async fn comments(&self, post_id: i64) -> Result<Vec<CommentWithAuthor>, ClientError> {
        let resp = self
            .client
            .get(self.url(&format!("/posts/{post_id}/comments")))
            .send()
            .await?;
        Self::json(resp).await
    }

    pub async fn delete_comment(&self, id: i64) -> Result<String, ClientError> {
        let req = self.client.delete(self.url(&format!("/comments/{id}")));
        Self::message(self.authed(req)?.send().await?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn user_json(id: i64, nick: &str) -> serde_json::Value {
        json!({
            "id": id,
            "name": nick.to_uppercase(),
            "nick": nick,
            "email": format!("{nick}@x.com"),
            "createdAt": "2024-05-01T10:00:00Z"
        })
    }

    fn temp_token_file(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("social-client-{}-{name}", std::process::id()))
    }

    #[tokio::test]
    async fn login_stores_the_token_and_sends_it_afterwards() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_json(json!({"email": "ana@x.com", "password": "secret1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "abc",
                "expires_in": 21600,
                "token_type": "Bearer"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/users/1"))
            .and(header("authorization", "Bearer abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(user_json(1, "ana")))
            .mount(&server)
            .await;

        let file = temp_token_file("login");
        let mut client = SocialClient::new(&server.uri())
            .unwrap()
            .with_token_file(&file)
            .unwrap();
        client.login("ana@x.com", "secret1").await.unwrap();
        assert_eq!(client.token(), Some("abc"));

        let reloaded = SocialClient::new(&server.uri())
            .unwrap()
            .with_token_file(&file)
            .unwrap();
        let user = reloaded.user(1).await.unwrap();
        assert_eq!(user.nick, "ana");

        client.logout().unwrap();
        assert!(!file.exists());
    }

    #[tokio::test]
    async fn protected_calls_need_a_token() {
        let client = SocialClient::new("http://127.0.0.1:9").unwrap();
        assert_matches!(client.posts().await, Err(ClientError::NotLoggedIn));
    }

    #[tokio::test]
    async fn error_statuses_map_to_variants() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users"))
            .respond_with(
                ResponseTemplate::new(409).set_body_json(json!({"error": "nick already taken"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/users/5"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({"error": "nope"})))
            .mount(&server)
            .await;

        let mut client = SocialClient::new(&server.uri()).unwrap();
        let new_user = NewUser {
            name: "Ana",
            nick: "ana1",
            email: "ana@x.com",
            password: "secret1",
        };
        assert_matches!(
            client.register(&new_user).await,
            Err(ClientError::Conflict(msg)) if msg == "nick already taken"
        );

        client.set_token("abc".into()).unwrap();
        let update = UserUpdate {
            name: "Ana",
            nick: "ana1",
            email: None,
        };
        assert_matches!(client.update_user(5, &update).await, Err(ClientError::Forbidden(_)));
    }

    #[tokio::test]
    async fn empty_listings_become_empty_vectors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users"))
            .and(query_param("user", "zzz"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"message": "no users found"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/user/2/followers"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"message": "this user has no followers"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/user/2/following"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([user_json(3, "bob")])))
            .mount(&server)
            .await;

        let mut client = SocialClient::new(&server.uri()).unwrap();
        client.set_token("abc".into()).unwrap();

        assert!(client.search("zzz").await.unwrap().is_empty());
        assert!(client.followers(2).await.unwrap().is_empty());
        let following = client.following(2).await.unwrap();
        assert_eq!(following[0].nick, "bob");
    }

    #[tokio::test]
    async fn feed_and_comments_decode() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/posts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": 7,
                "title": "Hello",
                "content": "World",
                "author_id": 1,
                "author_nickname": "ana",
                "created_at": "2024-05-01T10:00:00Z",
                "likes": 2,
                "likedByMe": true
            }])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/posts/7/comments"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": 9,
                "content": "nice",
                "createdAt": "2024-05-01T11:00:00Z",
                "author": {"id": 2, "name": "Bob", "nick": "bob"}
            }])))
            .mount(&server)
            .await;

        let mut client = SocialClient::new(&server.uri()).unwrap();
        client.set_token("abc".into()).unwrap();

        let feed = client.posts().await.unwrap();
        assert_eq!(feed[0].post.title, "Hello");
        assert!(feed[0].liked_by_me);
        assert_eq!(feed[0].likes, 2);

        let anonymous = SocialClient::new(&server.uri()).unwrap();
        let comments = anonymous.comments(7).await.unwrap();
        assert_eq!(comments[0].author.nick, "bob");
    }
}
