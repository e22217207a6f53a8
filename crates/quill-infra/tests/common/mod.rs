//! Shared fixtures for service scenarios run against the in-memory store.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use quill_core::domain::Comment;
use quill_core::ports::{AuthError, PasswordService};
use quill_core::services::{Actor, NewPost, PostDetailView, Registration, ServiceContext};
use quill_infra::InMemoryStore;
use uuid::Uuid;

static COUNTER: AtomicU64 = AtomicU64::new(1);

pub fn unique_suffix() -> u64 {
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Reversible "hash" so scenarios don't pay for Argon2.
pub struct PlainPasswords;

impl PasswordService for PlainPasswords {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        Ok(format!("plain:{password}"))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        Ok(hash.strip_prefix("plain:") == Some(password))
    }
}

pub fn context() -> ServiceContext {
    ServiceContext::new(Arc::new(InMemoryStore::new()), Arc::new(PlainPasswords))
}

pub async fn register(ctx: &ServiceContext) -> Actor {
    let suffix = unique_suffix();
    let account = ctx
        .users()
        .register(Registration {
            email: format!("user{suffix}@example.com"),
            username: format!("user{suffix}"),
            password: "testpass123".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    Actor::user(account.user.id)
}

pub async fn register_staff(ctx: &ServiceContext) -> Actor {
    let suffix = unique_suffix();
    let user = ctx
        .users()
        .ensure_staff_user(
            &format!("staff{suffix}@example.com"),
            &format!("staff{suffix}"),
            "testpass123",
        )
        .await
        .unwrap();
    Actor::staff(user.id)
}

pub async fn publish(ctx: &ServiceContext, staff: &Actor, title: &str, tags: &[&str]) -> PostDetailView {
    ctx.posts()
        .create_post(
            staff,
            NewPost {
                title: title.to_string(),
                description: "A short description".to_string(),
                body: "Body text".to_string(),
                cover_image: None,
                tags: tags.iter().map(|t| t.to_string()).collect(),
            },
        )
        .await
        .unwrap()
}

pub async fn comment_on(ctx: &ServiceContext, author: &Actor, post_id: Uuid) -> Comment {
    ctx.comments()
        .create_comment(author, post_id, "Nice post".to_string())
        .await
        .unwrap()
        .comment
}

pub async fn points(ctx: &ServiceContext, actor: &Actor) -> i64 {
    ctx.users().get_profile(actor).await.unwrap().profile.points
}
