//! Post image handlers. Only metadata is handled; file storage is external.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use quill_shared::ListResponse;
use quill_shared::dto::{CreateImageRequest, UpdateImageRequest, required};

use super::mappers;
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::middleware::validated::ValidatedJson;
use crate::state::AppState;

/// GET /api/images
pub async fn list(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let images = state.services.images().list_images().await?;
    let images = images.into_iter().map(mappers::image).collect();
    Ok(HttpResponse::Ok().json(ListResponse::new(images)))
}

/// POST /api/images
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: ValidatedJson<CreateImageRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let filename = required(req.image);
    let image = state
        .services
        .images()
        .create_image(
            &identity.actor(),
            required(req.post),
            required(req.title),
            &filename,
        )
        .await?;
    Ok(HttpResponse::Created().json(mappers::image(image)))
}

/// PATCH /api/images/{id}
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: ValidatedJson<UpdateImageRequest>,
) -> AppResult<HttpResponse> {
    let title = required(body.into_inner().title);
    let image = state
        .services
        .images()
        .update_image(&identity.actor(), path.into_inner(), title)
        .await?;
    Ok(HttpResponse::Ok().json(mappers::image(image)))
}

/// DELETE /api/images/{id}
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state
        .services
        .images()
        .delete_image(&identity.actor(), path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
