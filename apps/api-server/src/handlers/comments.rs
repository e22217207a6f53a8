//! Comment handlers.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use quill_shared::ListResponse;
use quill_shared::dto::{CreateCommentRequest, UpdateCommentRequest, required};

use super::mappers;
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::middleware::validated::ValidatedJson;
use crate::state::AppState;

/// GET /api/comments
pub async fn list(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let comments = state.services.comments().list_comments().await?;
    let comments = comments.into_iter().map(mappers::comment).collect();
    Ok(HttpResponse::Ok().json(ListResponse::new(comments)))
}

/// GET /api/comments/{id}
pub async fn get(state: web::Data<AppState>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
    let comment = state
        .services
        .comments()
        .get_comment(path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(mappers::comment(comment)))
}

/// POST /api/comments
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: ValidatedJson<CreateCommentRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let comment = state
        .services
        .comments()
        .create_comment(&identity.actor(), required(req.post), required(req.text))
        .await?;
    Ok(HttpResponse::Created().json(mappers::comment(comment)))
}

/// PATCH /api/comments/{id}
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: ValidatedJson<UpdateCommentRequest>,
) -> AppResult<HttpResponse> {
    let text = required(body.into_inner().text);
    let comment = state
        .services
        .comments()
        .update_comment(&identity.actor(), path.into_inner(), text)
        .await?;
    Ok(HttpResponse::Ok().json(mappers::comment(comment)))
}

/// DELETE /api/comments/{id}
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state
        .services
        .comments()
        .delete_comment(&identity.actor(), path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
