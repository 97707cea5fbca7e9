use actix_web::{HttpRequest, HttpResponse, delete, get, post, web};
use tracing::info;

use crate::application::comment_service::CommentService;
use crate::domain::comment::{CommentId, CommentInput};
use crate::domain::error::DomainError;
use crate::domain::post::PostId;
use crate::presentation::dto::{CommentResponse, CreatedCommentResponse, MessageResponse};
use crate::presentation::middleware::JwtAuthMiddleware;
use crate::presentation::utils::{AuthenticatedUser, ensure_owner, request_id};

#[post("/posts/{id}/comments", wrap = "JwtAuthMiddleware")]
pub async fn add_comment(
    req: HttpRequest,
    user: AuthenticatedUser,
    service: web::Data<CommentService>,
    path: web::Path<PostId>,
    payload: web::Json<CommentInput>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    let comment = service
        .add_comment(post_id, user.id, payload.into_inner())
        .await?;

    info!(
        request_id = %request_id(&req),
        user_id = user.id,
        post_id,
        comment_id = comment.id,
        "comment added"
    );

    Ok(HttpResponse::Ok().json(CreatedCommentResponse::from(comment)))
}

#[get("/posts/{id}/comments")]
pub async fn list_comments(
    service: web::Data<CommentService>,
    path: web::Path<PostId>,
) -> Result<HttpResponse, DomainError> {
    let comments = service.comments_for(path.into_inner()).await?;
    let body: Vec<CommentResponse> = comments.into_iter().map(CommentResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

#[delete("/comments/{id}", wrap = "JwtAuthMiddleware")]
pub async fn delete_comment(
    req: HttpRequest,
    user: AuthenticatedUser,
    service: web::Data<CommentService>,
    path: web::Path<CommentId>,
) -> Result<HttpResponse, DomainError> {
    let comment_id = path.into_inner();
    let author = service.author_of(comment_id).await?;
    ensure_owner(author, user.id, "you can only delete your own comments")?;

    service.delete_comment(comment_id).await?;

    info!(request_id = %request_id(&req), user_id = user.id, comment_id, "comment deleted");

    Ok(HttpResponse::Ok().json(MessageResponse::new("comment deleted")))
}
