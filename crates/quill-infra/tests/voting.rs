mod common;

use common::*;
use quill_core::DomainError;
use quill_core::domain::VoteType;
use quill_core::services::VoteOutcome;
use uuid::Uuid;

#[tokio::test]
async fn test_upvote_credits_comment_author() {
    let ctx = context();
    let staff = register_staff(&ctx).await;
    let author = register(&ctx).await;
    let voter = register(&ctx).await;
    let post = publish(&ctx, &staff, "Voting basics", &[]).await;
    let comment = comment_on(&ctx, &author, post.summary.post.id).await;

    let outcome = ctx
        .votes()
        .submit_vote(&voter, comment.id, VoteType::Upvote)
        .await
        .unwrap();

    assert!(matches!(outcome, VoteOutcome::Created { .. }));
    assert_eq!(points(&ctx, &author).await, 1);
    assert_eq!(points(&ctx, &voter).await, 0);

    let view = ctx.comments().get_comment(comment.id).await.unwrap();
    assert_eq!(view.votes.upvotes, 1);
    assert_eq!(view.votes.downvotes, 0);
}

#[tokio::test]
async fn test_same_vote_twice_cancels_out() {
    let ctx = context();
    let staff = register_staff(&ctx).await;
    let author = register(&ctx).await;
    let voter = register(&ctx).await;
    let post = publish(&ctx, &staff, "Toggle", &[]).await;
    let comment = comment_on(&ctx, &author, post.summary.post.id).await;

    ctx.votes()
        .submit_vote(&voter, comment.id, VoteType::Upvote)
        .await
        .unwrap();
    let second = ctx
        .votes()
        .submit_vote(&voter, comment.id, VoteType::Upvote)
        .await
        .unwrap();

    assert_eq!(second.action(), "removed");
    assert_eq!(points(&ctx, &author).await, 0);

    let view = ctx.comments().get_comment(comment.id).await.unwrap();
    assert_eq!(view.votes.upvotes + view.votes.downvotes, 0);
}

#[tokio::test]
async fn test_flipping_vote_swings_two_points() {
    let ctx = context();
    let staff = register_staff(&ctx).await;
    let author = register(&ctx).await;
    let voter = register(&ctx).await;
    let post = publish(&ctx, &staff, "Flip", &[]).await;
    let comment = comment_on(&ctx, &author, post.summary.post.id).await;

    ctx.votes()
        .submit_vote(&voter, comment.id, VoteType::Upvote)
        .await
        .unwrap();
    assert_eq!(points(&ctx, &author).await, 1);

    let outcome = ctx
        .votes()
        .submit_vote(&voter, comment.id, VoteType::Downvote)
        .await
        .unwrap();

    match outcome {
        VoteOutcome::Replaced { previous, vote } => {
            assert_eq!(previous.vote_type, VoteType::Upvote);
            assert_eq!(vote.vote_type, VoteType::Downvote);
        }
        other => panic!("expected a replaced vote, got {other:?}"),
    }
    assert_eq!(points(&ctx, &author).await, -1);

    let view = ctx.comments().get_comment(comment.id).await.unwrap();
    assert_eq!(view.votes.upvotes, 0);
    assert_eq!(view.votes.downvotes, 1);
}

#[tokio::test]
async fn test_deleting_vote_restores_points() {
    let ctx = context();
    let staff = register_staff(&ctx).await;
    let author = register(&ctx).await;
    let voter = register(&ctx).await;
    let post = publish(&ctx, &staff, "Undo", &[]).await;
    let comment = comment_on(&ctx, &author, post.summary.post.id).await;

    let before = points(&ctx, &author).await;
    let outcome = ctx
        .votes()
        .submit_vote(&voter, comment.id, VoteType::Upvote)
        .await
        .unwrap();
    assert_eq!(points(&ctx, &author).await, before + 1);

    ctx.votes()
        .delete_vote(&voter, outcome.vote().id)
        .await
        .unwrap();

    assert_eq!(points(&ctx, &author).await, before);
}

#[tokio::test]
async fn test_only_owner_can_delete_vote() {
    let ctx = context();
    let staff = register_staff(&ctx).await;
    let author = register(&ctx).await;
    let voter = register(&ctx).await;
    let post = publish(&ctx, &staff, "Ownership", &[]).await;
    let comment = comment_on(&ctx, &author, post.summary.post.id).await;

    let outcome = ctx
        .votes()
        .submit_vote(&voter, comment.id, VoteType::Downvote)
        .await
        .unwrap();

    let result = ctx.votes().delete_vote(&author, outcome.vote().id).await;

    assert!(matches!(result, Err(DomainError::Forbidden(_))));
    assert_eq!(points(&ctx, &author).await, -1);
}

#[tokio::test]
async fn test_vote_on_missing_comment_is_not_found() {
    let ctx = context();
    let voter = register(&ctx).await;

    let result = ctx
        .votes()
        .submit_vote(&voter, Uuid::new_v4(), VoteType::Upvote)
        .await;

    assert!(matches!(result, Err(DomainError::NotFound { .. })));
}

#[tokio::test]
async fn test_points_equal_net_votes_across_comments() {
    let ctx = context();
    let staff = register_staff(&ctx).await;
    let author = register(&ctx).await;
    let voters = [register(&ctx).await, register(&ctx).await, register(&ctx).await];
    let post = publish(&ctx, &staff, "Net votes", &[]).await;
    let first = comment_on(&ctx, &author, post.summary.post.id).await;
    let second = comment_on(&ctx, &author, post.summary.post.id).await;

    ctx.votes().submit_vote(&voters[0], first.id, VoteType::Upvote).await.unwrap();
    ctx.votes().submit_vote(&voters[1], first.id, VoteType::Upvote).await.unwrap();
    ctx.votes().submit_vote(&voters[2], first.id, VoteType::Downvote).await.unwrap();
    ctx.votes().submit_vote(&voters[0], second.id, VoteType::Downvote).await.unwrap();
    ctx.votes().submit_vote(&voters[1], second.id, VoteType::Upvote).await.unwrap();
    ctx.votes().submit_vote(&voters[1], second.id, VoteType::Upvote).await.unwrap();

    let mut net = 0;
    for comment in [&first, &second] {
        net += ctx.comments().get_comment(comment.id).await.unwrap().votes.score();
    }

    assert_eq!(net, 0);
    assert_eq!(points(&ctx, &author).await, net);
}

#[tokio::test]
async fn test_deleting_comment_reverts_its_votes() {
    let ctx = context();
    let staff = register_staff(&ctx).await;
    let author = register(&ctx).await;
    let voter = register(&ctx).await;
    let post = publish(&ctx, &staff, "Cascade", &[]).await;
    let comment = comment_on(&ctx, &author, post.summary.post.id).await;

    ctx.votes()
        .submit_vote(&voter, comment.id, VoteType::Upvote)
        .await
        .unwrap();
    assert_eq!(points(&ctx, &author).await, 1);

    ctx.comments().delete_comment(&author, comment.id).await.unwrap();

    assert_eq!(points(&ctx, &author).await, 0);
}
