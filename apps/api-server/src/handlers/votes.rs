//! Vote handlers.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use quill_core::domain::VoteType;
use quill_core::services::VoteOutcome;
use quill_shared::dto::{VoteRequest, required};

use super::mappers;
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::middleware::validated::ValidatedJson;
use crate::state::AppState;

/// POST /api/votes
///
/// Toggles the caller's vote: 201 when a vote now exists (new or flipped),
/// 200 when the same vote was withdrawn.
pub async fn submit(
    state: web::Data<AppState>,
    identity: Identity,
    body: ValidatedJson<VoteRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let vote_type: VoteType = required(req.vote_type).parse()?;

    let outcome = state
        .services
        .votes()
        .submit_vote(&identity.actor(), required(req.comment), vote_type)
        .await?;

    let body = mappers::vote_outcome(&outcome);
    Ok(match outcome {
        VoteOutcome::Removed { .. } => HttpResponse::Ok().json(body),
        VoteOutcome::Created { .. } | VoteOutcome::Replaced { .. } => {
            HttpResponse::Created().json(body)
        }
    })
}

/// DELETE /api/votes/{id}
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state
        .services
        .votes()
        .delete_vote(&identity.actor(), path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
