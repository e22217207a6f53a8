//! Comment service
//!
//! Comments are public to read and owned by their author for writes. Every
//! read carries live vote counts taken from the ledger.

use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::{Comment, MAX_COMMENT_LENGTH, VoteTally, VoteType};
use crate::error::DomainError;
use crate::events::{DomainEvent, EventDispatcher};
use crate::ports::UnitOfWork;

use super::{Actor, ServiceContext, ServiceResult, invalid_pk};

/// A comment together with its vote counts.
#[derive(Debug, Clone)]
pub struct CommentView {
    pub comment: Comment,
    pub votes: VoteTally,
}

pub struct CommentService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> CommentService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    pub async fn list_comments(&self) -> ServiceResult<Vec<CommentView>> {
        let uow = self.ctx.begin().await?;
        let comments = uow.comments().list_all().await?;
        with_tallies(uow.as_ref(), comments).await
    }

    pub async fn get_comment(&self, id: Uuid) -> ServiceResult<CommentView> {
        let uow = self.ctx.begin().await?;
        let comment = uow
            .comments()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Comment", id))?;
        let votes = tally(uow.as_ref(), id).await?;
        Ok(CommentView { comment, votes })
    }

    #[instrument(skip(self, text), fields(user_id = %actor.user_id))]
    pub async fn create_comment(
        &self,
        actor: &Actor,
        post_id: Uuid,
        text: String,
    ) -> ServiceResult<CommentView> {
        validate_text(&text)?;
        let uow = self.ctx.begin().await?;

        if uow.posts().find_by_id(post_id).await?.is_none() {
            return Err(DomainError::validation("post", invalid_pk(post_id)));
        }

        let comment = uow
            .comments()
            .save(Comment::new(post_id, actor.user_id, text))
            .await?;
        uow.commit().await?;

        info!(comment_id = %comment.id, post_id = %post_id, "Comment created");
        Ok(CommentView {
            comment,
            votes: VoteTally::default(),
        })
    }

    #[instrument(skip(self, text), fields(user_id = %actor.user_id))]
    pub async fn update_comment(
        &self,
        actor: &Actor,
        id: Uuid,
        text: String,
    ) -> ServiceResult<CommentView> {
        validate_text(&text)?;
        let uow = self.ctx.begin().await?;

        let mut comment = uow
            .comments()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Comment", id))?;
        actor.require_owner(comment.author_id)?;

        comment.text = text;
        comment.updated_at = Utc::now();
        let comment = uow.comments().save(comment).await?;
        let votes = tally(uow.as_ref(), id).await?;
        uow.commit().await?;

        info!(comment_id = %id, "Comment updated");
        Ok(CommentView { comment, votes })
    }

    /// Delete a comment and its votes, reverting the points those votes gave.
    #[instrument(skip(self), fields(user_id = %actor.user_id))]
    pub async fn delete_comment(&self, actor: &Actor, id: Uuid) -> ServiceResult<()> {
        let uow = self.ctx.begin().await?;

        let comment = uow
            .comments()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Comment", id))?;
        actor.require_owner(comment.author_id)?;

        remove_comment(self.ctx.events(), uow.as_ref(), &comment).await?;
        uow.commit().await?;

        info!(comment_id = %id, "Comment deleted");
        Ok(())
    }
}

fn validate_text(text: &str) -> ServiceResult<()> {
    if text.trim().is_empty() {
        return Err(DomainError::validation("text", "This field may not be blank."));
    }
    if text.chars().count() > MAX_COMMENT_LENGTH {
        return Err(DomainError::validation(
            "text",
            format!("Ensure this field has no more than {MAX_COMMENT_LENGTH} characters."),
        ));
    }
    Ok(())
}

/// Upvote and downvote counts for one comment.
pub(crate) async fn tally(uow: &dyn UnitOfWork, comment_id: Uuid) -> ServiceResult<VoteTally> {
    Ok(VoteTally {
        upvotes: uow
            .votes()
            .count_for_comment(comment_id, VoteType::Upvote)
            .await?,
        downvotes: uow
            .votes()
            .count_for_comment(comment_id, VoteType::Downvote)
            .await?,
    })
}

pub(crate) async fn with_tallies(
    uow: &dyn UnitOfWork,
    comments: Vec<Comment>,
) -> ServiceResult<Vec<CommentView>> {
    let mut views = Vec::with_capacity(comments.len());
    for comment in comments {
        let votes = tally(uow, comment.id).await?;
        views.push(CommentView { comment, votes });
    }
    Ok(views)
}

/// Remove a comment inside an open unit of work.
///
/// Votes go first, each with a `VoteDeleted` event, while the comment row
/// still exists for the points aggregator to find its author.
pub(crate) async fn remove_comment(
    events: &EventDispatcher,
    uow: &dyn UnitOfWork,
    comment: &Comment,
) -> ServiceResult<()> {
    for vote in uow.votes().list_for_comment(comment.id).await? {
        uow.votes().delete(vote.id).await?;
        events.dispatch(DomainEvent::VoteDeleted(vote), uow).await?;
    }
    uow.comments().delete(comment.id).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_text_rejects_blank() {
        assert!(matches!(
            validate_text("   "),
            Err(DomainError::Validation { field, .. }) if field == "text"
        ));
    }

    #[test]
    fn test_validate_text_length_limit() {
        assert!(validate_text(&"a".repeat(MAX_COMMENT_LENGTH)).is_ok());
        assert!(validate_text(&"a".repeat(MAX_COMMENT_LENGTH + 1)).is_err());
    }
}
