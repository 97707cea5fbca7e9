use actix_web::{HttpRequest, HttpResponse, delete, get, post, put, web};
use tracing::info;

use crate::application::post_service::PostService;
use crate::domain::error::DomainError;
use crate::domain::post::{PostId, PostInput};
use crate::presentation::dto::{MessageResponse, PostResponse, PostWithLikesResponse};
use crate::presentation::middleware::JwtAuthMiddleware;
use crate::presentation::utils::{AuthenticatedUser, ensure_owner, request_id};

const NOT_YOUR_POST: &str = "you can only modify your own posts";

#[post("/posts", wrap = "JwtAuthMiddleware")]
pub async fn create_post(
    req: HttpRequest,
    user: AuthenticatedUser,
    service: web::Data<PostService>,
    payload: web::Json<PostInput>,
) -> Result<HttpResponse, DomainError> {
    let post = service.create_post(user.id, payload.into_inner()).await?;

    info!(
        request_id = %request_id(&req),
        user_id = user.id,
        post_id = post.id,
        "post created"
    );

    Ok(HttpResponse::Created().json(PostResponse::from(post)))
}

#[get("/posts", wrap = "JwtAuthMiddleware")]
pub async fn list_posts(
    user: AuthenticatedUser,
    service: web::Data<PostService>,
) -> Result<HttpResponse, DomainError> {
    let posts = service.feed(user.id).await?;
    let body: Vec<PostWithLikesResponse> =
        posts.into_iter().map(PostWithLikesResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

#[get("/posts/{id}", wrap = "JwtAuthMiddleware")]
pub async fn get_post(
    user: AuthenticatedUser,
    service: web::Data<PostService>,
    path: web::Path<PostId>,
) -> Result<HttpResponse, DomainError> {
    let post = service
        .get_post_with_likes(user.id, path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(PostWithLikesResponse::from(post)))
}

#[put("/posts/{id}", wrap = "JwtAuthMiddleware")]
pub async fn update_post(
    req: HttpRequest,
    user: AuthenticatedUser,
    service: web::Data<PostService>,
    path: web::Path<PostId>,
    payload: web::Json<PostInput>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    let current = service.get_post(post_id).await?;
    ensure_owner(current.author_id, user.id, NOT_YOUR_POST)?;

    let post = service
        .update_post(user.id, post_id, payload.into_inner())
        .await?;

    info!(
        request_id = %request_id(&req),
        user_id = user.id,
        post_id,
        "post updated"
    );

    Ok(HttpResponse::Ok().json(PostResponse::from(post)))
}

#[delete("/posts/{id}", wrap = "JwtAuthMiddleware")]
pub async fn delete_post(
    req: HttpRequest,
    user: AuthenticatedUser,
    service: web::Data<PostService>,
    path: web::Path<PostId>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    let current = service.get_post(post_id).await?;
    ensure_owner(current.author_id, user.id, NOT_YOUR_POST)?;

    service.delete_post(post_id).await?;

    info!(
        request_id = %request_id(&req),
        user_id = user.id,
        post_id,
        "post deleted"
    );

    Ok(HttpResponse::Ok().json(MessageResponse::new("post deleted successfully")))
}

#[post("/posts/{id}/like", wrap = "JwtAuthMiddleware")]
pub async fn like_post(
    user: AuthenticatedUser,
    service: web::Data<PostService>,
    path: web::Path<PostId>,
) -> Result<HttpResponse, DomainError> {
    let post = service.like(user.id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(PostWithLikesResponse::from(post)))
}

#[delete("/posts/{id}/unlike", wrap = "JwtAuthMiddleware")]
pub async fn unlike_post(
    user: AuthenticatedUser,
    service: web::Data<PostService>,
    path: web::Path<PostId>,
) -> Result<HttpResponse, DomainError> {
    let post = service.unlike(user.id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(PostWithLikesResponse::from(post)))
}
