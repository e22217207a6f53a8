use std::sync::{Arc, Mutex};

use actix_web::{App, http::StatusCode, test, web};
use async_trait::async_trait;
use serde_json::{Value, json};

use quill_core::ports::{
    AuthError, MailError, Mailer, OutgoingMail, PasswordService, TokenService,
};
use quill_core::services::{RESET_LINK_PATH, ServiceContext};
use quill_infra::{InMemoryStore, JwtConfig, JwtTokenService};

use super::configure_routes;
use crate::middleware::rate_limit::RateLimitMiddleware;
use crate::observability::RequestIdMiddleware;
use crate::state::AppState;

/// Argon2 is too slow for request tests.
struct PlainPasswords;

impl PasswordService for PlainPasswords {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        Ok(format!("plain:{password}"))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        Ok(hash == format!("plain:{password}"))
    }
}

/// Collects outgoing mail so reset links can be followed.
#[derive(Default)]
struct Outbox(Mutex<Vec<OutgoingMail>>);

#[async_trait]
impl Mailer for Outbox {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        self.0.lock().unwrap().push(mail);
        Ok(())
    }
}

fn test_state_with_outbox() -> (AppState, Arc<Outbox>) {
    let outbox = Arc::new(Outbox::default());
    let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::new(JwtConfig::default()));
    let services = ServiceContext::new(Arc::new(InMemoryStore::new()), Arc::new(PlainPasswords))
        .with_account_recovery(tokens.clone(), outbox.clone());
    let state = AppState {
        services,
        tokens,
        rate_limiter: None,
    };
    (state, outbox)
}

fn test_state() -> AppState {
    test_state_with_outbox().0
}

macro_rules! test_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .wrap(RateLimitMiddleware::new($state.rate_limiter.clone()))
                .wrap(RequestIdMiddleware)
                .app_data(web::Data::new($state.clone()))
                .configure(configure_routes),
        )
        .await
    };
}

/// Register a user through the service layer and return a bearer header.
async fn bearer(state: &AppState, name: &str, staff: bool) -> (String, String) {
    let email = format!("{name}@example.com");
    let user = if staff {
        state
            .services
            .users()
            .ensure_staff_user(&email, name, "secret-pass")
            .await
            .unwrap()
    } else {
        state
            .services
            .users()
            .register(quill_core::services::Registration {
                email: email.clone(),
                username: name.to_string(),
                password: "secret-pass".to_string(),
                ..Default::default()
            })
            .await
            .unwrap()
            .user
    };
    let token = state
        .tokens
        .generate_token(user.id, &user.email, user.roles())
        .unwrap();
    (user.id.to_string(), format!("Bearer {token}"))
}

#[actix_web::test]
async fn test_health_sets_request_id() {
    let state = test_state();
    let app = test_app!(state);

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));
}

#[actix_web::test]
async fn test_register_and_fetch_profile() {
    let state = test_state();
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/users")
        .set_json(json!({
            "email": "Ada@Example.com",
            "username": "ada",
            "password": "secret-pass",
            "first_name": "Ada"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    // Only the domain is case-folded.
    assert_eq!(body["user"]["email"], "Ada@example.com");
    assert_eq!(body["points"], 0);
    assert!(body["user"].get("password").is_none());

    let req = test::TestRequest::post()
        .uri("/api/users/token")
        .set_json(json!({ "email": "ada@example.com", "password": "secret-pass" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/users/token")
        .set_json(json!({ "email": "Ada@EXAMPLE.COM", "password": "secret-pass" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let token = body["token"].as_str().unwrap().to_string();
    assert_eq!(body["token_type"], "Bearer");

    let req = test::TestRequest::get()
        .uri("/api/users/me")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["user"]["username"], "ada");
    assert_eq!(body["first_name"], "Ada");
}

#[actix_web::test]
async fn test_password_reset_over_http() {
    let (state, outbox) = test_state_with_outbox();
    bearer(&state, "forgetful", false).await;
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/users/forgot-password")
        .set_json(json!({ "email": "forgetful@example.com" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    // Unknown addresses get the same answer.
    let req = test::TestRequest::post()
        .uri("/api/users/forgot-password")
        .set_json(json!({ "email": "ghost@example.com" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let sent = std::mem::take(&mut *outbox.0.lock().unwrap());
    assert_eq!(sent.len(), 1);
    let start = sent[0].body.find(RESET_LINK_PATH).unwrap();
    let link = sent[0].body[start..].split_whitespace().next().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri(&link)
        .set_json(json!({ "password": "12345" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["errors"]["password"].is_array());

    let req = test::TestRequest::post()
        .uri(&link)
        .set_json(json!({ "password": "brand-new-pass" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/api/users/token")
        .set_json(json!({ "email": "forgetful@example.com", "password": "brand-new-pass" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri(&link)
        .set_json(json!({ "password": "another-pass" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["errors"]["token"].is_array());
}

#[actix_web::test]
async fn test_register_reports_field_errors() {
    let state = test_state();
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/users")
        .set_json(json!({ "email": "not-an-email", "password": "123" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["errors"]["email"].is_array());
    assert!(body["errors"]["username"].is_array());
    assert!(body["errors"]["password"].is_array());
    assert!(body["request_id"].is_string());
}

#[actix_web::test]
async fn test_duplicate_email_is_rejected() {
    let state = test_state();
    bearer(&state, "grace", false).await;
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/users")
        .set_json(json!({
            "email": "grace@example.com",
            "username": "grace2",
            "password": "secret-pass"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["errors"]["email"].is_array());
}

#[actix_web::test]
async fn test_bad_credentials_are_a_client_error() {
    let state = test_state();
    bearer(&state, "linus", false).await;
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/users/token")
        .set_json(json!({ "email": "linus@example.com", "password": "wrong-pass" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["errors"]["non_field_errors"].is_array());
}

#[actix_web::test]
async fn test_writes_require_authentication_and_staff() {
    let state = test_state();
    let (_, reader) = bearer(&state, "reader", false).await;
    let app = test_app!(state);

    let post = json!({ "title": "Hello", "description": "d", "body": "b" });

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .set_json(&post)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header(("Authorization", reader))
        .set_json(&post)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_post_lifecycle_collects_orphan_tags() {
    let state = test_state();
    let (_, staff) = bearer(&state, "editor", true).await;
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header(("Authorization", staff.clone()))
        .set_json(json!({
            "title": "Hello, World!",
            "description": "First post",
            "body": "Body",
            "tags": [{ "name": "rust" }, { "name": "intro" }]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["slug"], "hello-world");
    assert_eq!(created["tags"].as_array().unwrap().len(), 2);
    let post_id = created["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header(("Authorization", staff.clone()))
        .set_json(json!({
            "title": "Second",
            "description": "Another",
            "body": "Body",
            "tags": [{ "name": "rust" }]
        }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/posts/{post_id}"))
        .insert_header(("Authorization", staff))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get().uri("/api/tags").to_request();
    let tags: Value = test::call_and_read_body_json(&app, req).await;
    let names: Vec<&str> = tags["results"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|tag| tag["name"].as_str())
        .collect();
    assert_eq!(names, vec!["rust"]);

    let req = test::TestRequest::get()
        .uri(&format!("/api/posts/{post_id}"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_unknown_sort_key_is_rejected() {
    let state = test_state();
    let app = test_app!(state);

    let req = test::TestRequest::get()
        .uri("/api/posts?sort=popularity-desc")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_vote_toggle_over_http() {
    let state = test_state();
    let (_, staff) = bearer(&state, "editor", true).await;
    let (author_id, author) = bearer(&state, "author", false).await;
    let (_, voter) = bearer(&state, "voter", false).await;
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header(("Authorization", staff))
        .set_json(json!({ "title": "Votes", "description": "d", "body": "b" }))
        .to_request();
    let post: Value = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::post()
        .uri("/api/comments")
        .insert_header(("Authorization", author.clone()))
        .set_json(json!({ "post": post["id"], "text": "Nice" }))
        .to_request();
    let comment: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(comment["author"], author_id.as_str());

    let vote = json!({ "comment": comment["id"], "vote_type": "upvote" });

    let req = test::TestRequest::post()
        .uri("/api/votes")
        .insert_header(("Authorization", voter.clone()))
        .set_json(&vote)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["action"], "created");

    let req = test::TestRequest::get()
        .uri(&format!("/api/comments/{}", comment["id"].as_str().unwrap()))
        .to_request();
    let counted: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(counted["number_of_upvotes"], 1);
    assert_eq!(counted["number_of_downvotes"], 0);

    let req = test::TestRequest::get()
        .uri("/api/users/me")
        .insert_header(("Authorization", author.clone()))
        .to_request();
    let profile: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(profile["points"], 1);

    let req = test::TestRequest::post()
        .uri("/api/votes")
        .insert_header(("Authorization", voter))
        .set_json(&vote)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["action"], "removed");

    let req = test::TestRequest::get()
        .uri("/api/users/me")
        .insert_header(("Authorization", author))
        .to_request();
    let profile: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(profile["points"], 0);
}

#[actix_web::test]
async fn test_only_the_author_may_change_a_comment() {
    let state = test_state();
    let (_, staff) = bearer(&state, "editor", true).await;
    let (_, author) = bearer(&state, "author", false).await;
    let (_, stranger) = bearer(&state, "stranger", false).await;
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header(("Authorization", staff))
        .set_json(json!({ "title": "Owned", "description": "d", "body": "b" }))
        .to_request();
    let post: Value = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::post()
        .uri("/api/comments")
        .insert_header(("Authorization", author.clone()))
        .set_json(json!({ "post": post["id"], "text": "Mine" }))
        .to_request();
    let comment: Value = test::call_and_read_body_json(&app, req).await;
    let uri = format!("/api/comments/{}", comment["id"].as_str().unwrap());

    let req = test::TestRequest::patch()
        .uri(&uri)
        .insert_header(("Authorization", stranger.clone()))
        .set_json(json!({ "text": "Not yours" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::delete()
        .uri(&uri)
        .insert_header(("Authorization", stranger))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::patch()
        .uri(&uri)
        .insert_header(("Authorization", author))
        .set_json(json!({ "text": "Still mine" }))
        .to_request();
    let updated: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(updated["text"], "Still mine");
}

#[actix_web::test]
async fn test_invalid_vote_type_is_a_field_error() {
    let state = test_state();
    let (_, voter) = bearer(&state, "voter", false).await;
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/votes")
        .insert_header(("Authorization", voter))
        .set_json(json!({ "comment": uuid::Uuid::new_v4(), "vote_type": "sideways" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["errors"]["vote_type"].is_array());
}

#[cfg(feature = "rate-limit")]
#[actix_web::test]
async fn test_write_routes_are_rate_limited() {
    use std::time::Duration;

    use quill_infra::{InMemoryRateLimiter, RateLimitConfig};

    let mut state = test_state();
    state.rate_limiter = Some(Arc::new(InMemoryRateLimiter::new(RateLimitConfig {
        max_requests: 1,
        window: Duration::from_secs(60),
    })));
    let app = test_app!(state);

    let register = |name: &str| {
        test::TestRequest::post()
            .uri("/api/users")
            .set_json(json!({
                "email": format!("{name}@example.com"),
                "username": name,
                "password": "secret-pass"
            }))
            .to_request()
    };

    let resp = test::call_service(&app, register("first")).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = test::call_service(&app, register("second")).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(resp.headers().contains_key("retry-after"));

    // Reads are never limited
    let req = test::TestRequest::get().uri("/api/posts").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}
