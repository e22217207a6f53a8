mod common;

use std::time::Duration;

use common::*;
use quill_core::DomainError;
use quill_core::domain::PostQuery;
use quill_core::services::{NewPost, PostChanges};

#[tokio::test]
async fn test_create_post_derives_slug_and_reuses_tags() {
    let ctx = context();
    let staff = register_staff(&ctx).await;

    let first = publish(&ctx, &staff, "Hello, Rust World!", &["rust"]).await;
    let second = publish(&ctx, &staff, "Another one", &["rust", "misc"]).await;

    assert_eq!(first.summary.post.slug, "hello-rust-world");
    assert_eq!(first.summary.tags[0].id, second.summary.tags[1].id);
    assert_eq!(first.summary.tags[0].user_id, Some(staff.user_id));
    assert_eq!(ctx.tags().list_tags().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_non_staff_cannot_publish() {
    let ctx = context();
    let user = register(&ctx).await;

    let result = ctx
        .posts()
        .create_post(
            &user,
            NewPost {
                title: "Sneaky".to_string(),
                ..Default::default()
            },
        )
        .await;

    assert!(matches!(result, Err(DomainError::Forbidden(_))));
}

#[tokio::test]
async fn test_duplicate_title_is_rejected() {
    let ctx = context();
    let staff = register_staff(&ctx).await;
    publish(&ctx, &staff, "Unique", &[]).await;

    let result = ctx
        .posts()
        .create_post(
            &staff,
            NewPost {
                title: "Unique".to_string(),
                ..Default::default()
            },
        )
        .await;

    assert!(matches!(result, Err(DomainError::Duplicate { field, .. }) if field == "title"));
}

#[tokio::test]
async fn test_update_replaces_tags_and_keeps_slug() {
    let ctx = context();
    let staff = register_staff(&ctx).await;
    let post = publish(&ctx, &staff, "Original title", &["old"]).await;

    let updated = ctx
        .posts()
        .update_post(
            &staff,
            post.summary.post.id,
            PostChanges {
                title: Some("New title".to_string()),
                tags: Some(vec!["new".to_string()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.summary.post.title, "New title");
    assert_eq!(updated.summary.post.slug, "original-title");
    let names: Vec<_> = updated.summary.tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["new"]);
}

#[tokio::test]
async fn test_list_filters_by_any_tag() {
    let ctx = context();
    let staff = register_staff(&ctx).await;
    let rust = publish(&ctx, &staff, "Rust post", &["rust"]).await;
    let go = publish(&ctx, &staff, "Go post", &["go"]).await;
    publish(&ctx, &staff, "Untagged", &[]).await;

    let tags = format!("{},{}", rust.summary.tags[0].id, go.summary.tags[0].id);
    let query = PostQuery::parse(Some("title-asc"), Some(&tags)).unwrap();
    let listed = ctx.posts().list_posts(&query).await.unwrap();

    let titles: Vec<_> = listed.iter().map(|p| p.post.title.as_str()).collect();
    assert_eq!(titles, vec!["Go post", "Rust post"]);
}

#[tokio::test]
async fn test_list_orders_by_comment_count() {
    let ctx = context();
    let staff = register_staff(&ctx).await;
    let reader = register(&ctx).await;
    let quiet = publish(&ctx, &staff, "Quiet", &[]).await;
    let busy = publish(&ctx, &staff, "Busy", &[]).await;
    comment_on(&ctx, &reader, busy.summary.post.id).await;
    comment_on(&ctx, &reader, busy.summary.post.id).await;

    let query = PostQuery::parse(Some("comments-desc"), None).unwrap();
    let listed = ctx.posts().list_posts(&query).await.unwrap();

    assert_eq!(listed[0].post.id, busy.summary.post.id);
    assert_eq!(listed[0].number_of_comments, 2);
    assert_eq!(listed[1].post.id, quiet.summary.post.id);
}

#[tokio::test]
async fn test_detail_includes_comments_and_images() {
    let ctx = context();
    let staff = register_staff(&ctx).await;
    let reader = register(&ctx).await;
    let post = publish(&ctx, &staff, "Detailed", &[]).await;
    comment_on(&ctx, &reader, post.summary.post.id).await;
    ctx.images()
        .create_image(&staff, post.summary.post.id, "Cover".to_string(), "photo.png")
        .await
        .unwrap();

    let detail = ctx.posts().get_post(post.summary.post.id).await.unwrap();

    assert_eq!(detail.comments.len(), 1);
    assert_eq!(detail.images.len(), 1);
    assert!(detail.images[0].image.starts_with("uploads/post/"));
    assert!(detail.images[0].image.ends_with(".png"));
}

#[tokio::test]
async fn test_renaming_tag_onto_existing_name_is_rejected() {
    let ctx = context();
    let staff = register_staff(&ctx).await;
    let post = publish(&ctx, &staff, "Two tags", &["rust", "go"]).await;

    let go = post
        .summary
        .tags
        .iter()
        .find(|t| t.name == "go")
        .unwrap()
        .clone();

    let err = ctx
        .tags()
        .update_tag(&staff, go.id, "rust".to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Duplicate { ref field, .. } if field == "name"));

    let renamed = ctx
        .tags()
        .update_tag(&staff, go.id, "golang".to_string())
        .await
        .unwrap();
    assert_eq!(renamed.name, "golang");
}

async fn listed_titles(ctx: &quill_core::services::ServiceContext, sort: &str) -> Vec<String> {
    let query = PostQuery::parse(Some(sort), None).unwrap();
    ctx.posts()
        .list_posts(&query)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.post.title)
        .collect()
}

#[tokio::test]
async fn test_list_orders_by_creation_update_and_title() {
    let ctx = context();
    let staff = register_staff(&ctx).await;
    let alpha = publish(&ctx, &staff, "Alpha", &[]).await;
    tokio::time::sleep(Duration::from_millis(5)).await;
    publish(&ctx, &staff, "Bravo", &[]).await;
    tokio::time::sleep(Duration::from_millis(5)).await;
    publish(&ctx, &staff, "Charlie", &[]).await;
    tokio::time::sleep(Duration::from_millis(5)).await;

    // Editing the oldest post makes it the most recently updated.
    ctx.posts()
        .update_post(
            &staff,
            alpha.summary.post.id,
            PostChanges {
                body: Some("Revised".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(listed_titles(&ctx, "date-asc").await, ["Alpha", "Bravo", "Charlie"]);
    assert_eq!(listed_titles(&ctx, "date-desc").await, ["Charlie", "Bravo", "Alpha"]);
    assert_eq!(listed_titles(&ctx, "update-asc").await, ["Bravo", "Charlie", "Alpha"]);
    assert_eq!(listed_titles(&ctx, "update-desc").await, ["Alpha", "Charlie", "Bravo"]);
    assert_eq!(listed_titles(&ctx, "title-desc").await, ["Charlie", "Bravo", "Alpha"]);
}
