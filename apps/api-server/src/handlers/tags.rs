//! Tag handlers. Tags are created through posts, so there is no POST route.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use quill_shared::ListResponse;
use quill_shared::dto::{UpdateTagRequest, required};

use super::mappers;
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::middleware::validated::ValidatedJson;
use crate::state::AppState;

/// GET /api/tags
pub async fn list(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let tags = state.services.tags().list_tags().await?;
    let tags = tags.into_iter().map(mappers::tag).collect();
    Ok(HttpResponse::Ok().json(ListResponse::new(tags)))
}

/// PATCH /api/tags/{id}
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: ValidatedJson<UpdateTagRequest>,
) -> AppResult<HttpResponse> {
    let name = required(body.into_inner().name);
    let tag = state
        .services
        .tags()
        .update_tag(&identity.actor(), path.into_inner(), name)
        .await?;
    Ok(HttpResponse::Ok().json(mappers::tag(tag)))
}

/// DELETE /api/tags/{id}
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state
        .services
        .tags()
        .delete_tag(&identity.actor(), path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
