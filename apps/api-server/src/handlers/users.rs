//! Account handlers: registration, tokens, password reset and the caller's
//! profile.

use actix_web::{HttpResponse, web};

use quill_core::services::{ProfileChanges, Registration};
use quill_shared::dto::{
    DetailResponse, ForgotPasswordRequest, RegisterRequest, ResetPasswordRequest, TokenRequest,
    TokenResponse, UpdateProfileRequest, required,
};

use super::mappers;
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::middleware::validated::ValidatedJson;
use crate::state::AppState;

/// POST /api/users
pub async fn register(
    state: web::Data<AppState>,
    body: ValidatedJson<RegisterRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let registration = Registration {
        email: required(req.email),
        username: required(req.username),
        password: required(req.password),
        first_name: req.first_name,
        last_name: req.last_name,
        date_of_birth: req.date_of_birth,
        profile_image: req.profile_image,
    };

    let account = state.services.users().register(registration).await?;
    Ok(HttpResponse::Created().json(mappers::profile(account)))
}

/// POST /api/users/token
pub async fn token(
    state: web::Data<AppState>,
    body: ValidatedJson<TokenRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let user = state
        .services
        .users()
        .authenticate(&required(req.email), &required(req.password))
        .await?;

    let token = state
        .tokens
        .generate_token(user.id, &user.email, user.roles())?;

    Ok(HttpResponse::Ok().json(TokenResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: state.tokens.expiration_seconds(),
    }))
}

/// GET /api/users/me
pub async fn me(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let account = state.services.users().get_profile(&identity.actor()).await?;
    Ok(HttpResponse::Ok().json(mappers::profile(account)))
}

/// PATCH /api/users/me
pub async fn update_me(
    state: web::Data<AppState>,
    identity: Identity,
    body: ValidatedJson<UpdateProfileRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let changes = ProfileChanges {
        email: req.email,
        username: req.username,
        password: req.password,
        first_name: req.first_name,
        last_name: req.last_name,
        date_of_birth: req.date_of_birth,
        profile_image: req.profile_image,
    };

    let account = state
        .services
        .users()
        .update_profile(&identity.actor(), changes)
        .await?;
    Ok(HttpResponse::Ok().json(mappers::profile(account)))
}

/// POST /api/users/forgot-password
///
/// Always answers 200 so callers cannot tell which addresses are registered.
pub async fn forgot_password(
    state: web::Data<AppState>,
    body: ValidatedJson<ForgotPasswordRequest>,
) -> AppResult<HttpResponse> {
    let email = required(body.into_inner().email);
    state.services.users().request_password_reset(&email).await?;

    Ok(HttpResponse::Ok().json(DetailResponse {
        detail: "If the address is registered, a reset link has been sent.".to_string(),
    }))
}

/// POST /api/users/reset-password/{encoded_pk}/{token}
pub async fn reset_password(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    body: ValidatedJson<ResetPasswordRequest>,
) -> AppResult<HttpResponse> {
    let (encoded_pk, token) = path.into_inner();
    let password = required(body.into_inner().password);
    state
        .services
        .users()
        .reset_password(&encoded_pk, &token, &password)
        .await?;

    Ok(HttpResponse::Ok().json(DetailResponse {
        detail: "Password has been reset.".to_string(),
    }))
}
