use actix_web::{HttpRequest, HttpResponse, get, post, web};
use tracing::info;

use crate::application::user_service::UserService;
use crate::data::follow_repository::{SELF_FOLLOW, SELF_UNFOLLOW};
use crate::domain::error::DomainError;
use crate::domain::user::{User, UserId};
use crate::presentation::dto::{MessageResponse, UserResponse};
use crate::presentation::middleware::JwtAuthMiddleware;
use crate::presentation::utils::{AuthenticatedUser, request_id};

#[post("/user/{id}/userFollowed", wrap = "JwtAuthMiddleware")]
pub async fn follow_user(
    req: HttpRequest,
    user: AuthenticatedUser,
    service: web::Data<UserService>,
    path: web::Path<UserId>,
) -> Result<HttpResponse, DomainError> {
    let target = path.into_inner();
    if target == user.id {
        return Err(DomainError::forbidden(SELF_FOLLOW));
    }

    service.follow(user.id, target).await?;

    info!(request_id = %request_id(&req), follower = user.id, followee = target, "user followed");

    Ok(HttpResponse::Ok().json(MessageResponse::new("user followed successfully")))
}

#[post("/user/{id}/unfollowed", wrap = "JwtAuthMiddleware")]
pub async fn unfollow_user(
    req: HttpRequest,
    user: AuthenticatedUser,
    service: web::Data<UserService>,
    path: web::Path<UserId>,
) -> Result<HttpResponse, DomainError> {
    let target = path.into_inner();
    if target == user.id {
        return Err(DomainError::forbidden(SELF_UNFOLLOW));
    }

    service.unfollow(user.id, target).await?;

    info!(request_id = %request_id(&req), follower = user.id, followee = target, "user unfollowed");

    Ok(HttpResponse::Ok().json(MessageResponse::new("user unfollowed successfully")))
}

#[get("/user/{id}/followers", wrap = "JwtAuthMiddleware")]
pub async fn followers(
    service: web::Data<UserService>,
    path: web::Path<UserId>,
) -> Result<HttpResponse, DomainError> {
    let users = service.followers(path.into_inner()).await?;
    Ok(user_list(users, "this user has no followers"))
}

#[get("/user/{id}/following", wrap = "JwtAuthMiddleware")]
pub async fn following(
    service: web::Data<UserService>,
    path: web::Path<UserId>,
) -> Result<HttpResponse, DomainError> {
    let users = service.following(path.into_inner()).await?;
    Ok(user_list(users, "this user is not following anyone"))
}

fn user_list(users: Vec<User>, empty: &str) -> HttpResponse {
    if users.is_empty() {
        return HttpResponse::Ok().json(MessageResponse::new(empty));
    }
    let body: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
    HttpResponse::Ok().json(body)
}
