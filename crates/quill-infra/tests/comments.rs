mod common;

use common::*;
use quill_core::DomainError;

#[tokio::test]
async fn test_author_can_edit_own_comment() {
    let ctx = context();
    let staff = register_staff(&ctx).await;
    let author = register(&ctx).await;
    let post = publish(&ctx, &staff, "Editable", &[]).await;
    let comment = comment_on(&ctx, &author, post.summary.post.id).await;

    let view = ctx
        .comments()
        .update_comment(&author, comment.id, "Edited text".to_string())
        .await
        .unwrap();

    assert_eq!(view.comment.text, "Edited text");
    assert!(view.comment.updated_at >= comment.updated_at);
}

#[tokio::test]
async fn test_other_user_cannot_edit_comment() {
    let ctx = context();
    let staff = register_staff(&ctx).await;
    let author = register(&ctx).await;
    let intruder = register(&ctx).await;
    let post = publish(&ctx, &staff, "Guarded", &[]).await;
    let comment = comment_on(&ctx, &author, post.summary.post.id).await;

    let result = ctx
        .comments()
        .update_comment(&intruder, comment.id, "Hijacked".to_string())
        .await;
    assert!(matches!(result, Err(DomainError::Forbidden(_))));

    // Staff rights do not extend to other people's comments.
    let result = ctx
        .comments()
        .update_comment(&staff, comment.id, "Moderated".to_string())
        .await;
    assert!(matches!(result, Err(DomainError::Forbidden(_))));

    let stored = ctx.comments().get_comment(comment.id).await.unwrap();
    assert_eq!(stored.comment.text, "Nice post");
}

#[tokio::test]
async fn test_other_user_cannot_delete_comment() {
    let ctx = context();
    let staff = register_staff(&ctx).await;
    let author = register(&ctx).await;
    let intruder = register(&ctx).await;
    let post = publish(&ctx, &staff, "Guarded", &[]).await;
    let comment = comment_on(&ctx, &author, post.summary.post.id).await;

    let result = ctx.comments().delete_comment(&intruder, comment.id).await;
    assert!(matches!(result, Err(DomainError::Forbidden(_))));
    assert!(ctx.comments().get_comment(comment.id).await.is_ok());

    ctx.comments().delete_comment(&author, comment.id).await.unwrap();
    assert!(matches!(
        ctx.comments().get_comment(comment.id).await,
        Err(DomainError::NotFound { .. })
    ));
}
