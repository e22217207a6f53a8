//! Domain views to wire DTOs.

use quill_core::domain::{PostImage, Tag, User, Vote};
use quill_core::services::{AccountView, CommentView, PostDetailView, PostSummaryView, VoteOutcome};
use quill_shared::dto::{
    CommentResponse, ImageResponse, PostDetailResponse, PostSummaryResponse, ProfileResponse,
    TagResponse, UserResponse, VoteActionResponse, VoteResponse,
};

pub fn user(user: &User) -> UserResponse {
    UserResponse {
        id: user.id,
        email: user.email.clone(),
        username: user.username.clone(),
        created_at: user.created_at,
    }
}

pub fn profile(account: AccountView) -> ProfileResponse {
    let AccountView { user: owner, profile } = account;
    ProfileResponse {
        user: user(&owner),
        first_name: profile.first_name,
        last_name: profile.last_name,
        date_of_birth: profile.date_of_birth,
        profile_image: profile.profile_image,
        points: profile.points,
    }
}

pub fn tag(tag: Tag) -> TagResponse {
    TagResponse {
        id: tag.id,
        name: tag.name,
    }
}

pub fn image(image: PostImage) -> ImageResponse {
    ImageResponse {
        id: image.id,
        post: image.post_id,
        title: image.title,
        image: image.image,
    }
}

pub fn comment(view: CommentView) -> CommentResponse {
    let CommentView { comment, votes } = view;
    CommentResponse {
        id: comment.id,
        post: comment.post_id,
        author: comment.author_id,
        text: comment.text,
        number_of_upvotes: votes.upvotes,
        number_of_downvotes: votes.downvotes,
        created_at: comment.created_at,
        updated_at: comment.updated_at,
    }
}

pub fn vote(vote: &Vote) -> VoteResponse {
    VoteResponse {
        id: vote.id,
        user: vote.user_id,
        comment: vote.comment_id,
        vote_type: vote.vote_type.to_string(),
        created_at: vote.created_at,
    }
}

pub fn vote_outcome(outcome: &VoteOutcome) -> VoteActionResponse {
    VoteActionResponse {
        action: outcome.action().to_string(),
        vote: vote(outcome.vote()),
    }
}

pub fn post_summary(view: PostSummaryView) -> PostSummaryResponse {
    let PostSummaryView {
        post,
        tags,
        number_of_comments,
    } = view;
    PostSummaryResponse {
        id: post.id,
        title: post.title,
        slug: post.slug,
        author: post.author_id,
        description: post.description,
        tags: tags.into_iter().map(tag).collect(),
        cover_image: post.cover_image,
        number_of_comments,
        created_at: post.created_at,
        updated_at: post.updated_at,
    }
}

pub fn post_detail(view: PostDetailView) -> PostDetailResponse {
    let PostDetailView {
        summary,
        images,
        comments,
    } = view;
    let body = summary.post.body.clone();
    PostDetailResponse {
        summary: post_summary(summary),
        body,
        images: images.into_iter().map(image).collect(),
        comments: comments.into_iter().map(comment).collect(),
    }
}
