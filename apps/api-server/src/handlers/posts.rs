//! Post handlers.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use quill_core::domain::PostQuery;
use quill_core::services::{NewPost, PostChanges};
use quill_shared::ListResponse;
use quill_shared::dto::{CreatePostRequest, PostListQuery, TagInput, UpdatePostRequest, required};

use super::mappers;
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::middleware::validated::ValidatedJson;
use crate::state::AppState;

fn tag_names(tags: Vec<TagInput>) -> Vec<String> {
    tags.into_iter().map(|tag| tag.name).collect()
}

/// GET /api/posts?sort=title-asc&tags=<id>,<id>
pub async fn list(
    state: web::Data<AppState>,
    params: web::Query<PostListQuery>,
) -> AppResult<HttpResponse> {
    let query = PostQuery::parse(params.sort.as_deref(), params.tags.as_deref())?;
    let posts = state.services.posts().list_posts(&query).await?;
    let posts = posts.into_iter().map(mappers::post_summary).collect();
    Ok(HttpResponse::Ok().json(ListResponse::new(posts)))
}

/// GET /api/posts/{id}
pub async fn get(state: web::Data<AppState>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
    let post = state.services.posts().get_post(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(mappers::post_detail(post)))
}

/// POST /api/posts
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: ValidatedJson<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let new = NewPost {
        title: required(req.title),
        description: required(req.description),
        body: required(req.body),
        cover_image: req.cover_image,
        tags: tag_names(req.tags),
    };

    let post = state
        .services
        .posts()
        .create_post(&identity.actor(), new)
        .await?;
    Ok(HttpResponse::Created().json(mappers::post_detail(post)))
}

/// PATCH /api/posts/{id}
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: ValidatedJson<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let changes = PostChanges {
        title: req.title,
        description: req.description,
        body: req.body,
        cover_image: req.cover_image,
        tags: req.tags.map(tag_names),
    };

    let post = state
        .services
        .posts()
        .update_post(&identity.actor(), path.into_inner(), changes)
        .await?;
    Ok(HttpResponse::Ok().json(mappers::post_detail(post)))
}

/// DELETE /api/posts/{id}
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state
        .services
        .posts()
        .delete_post(&identity.actor(), path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
