use async_trait::async_trait;

use super::{DomainEvent, EventHandler};
use crate::domain::Vote;
use crate::error::DomainError;
use crate::ports::UnitOfWork;

/// Keeps `UserProfile::points` in step with the vote ledger.
///
/// A created vote moves the comment author's points by the vote's delta;
/// a deleted vote applies the inverse.
pub struct PointsAggregator;

impl PointsAggregator {
    async fn apply(&self, uow: &dyn UnitOfWork, vote: &Vote, delta: i64) -> Result<(), DomainError> {
        let comment = uow
            .comments()
            .find_by_id(vote.comment_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Comment", vote.comment_id))?;

        let points = uow.profiles().adjust_points(comment.author_id, delta).await?;

        tracing::debug!(
            author_id = %comment.author_id,
            vote_id = %vote.id,
            delta,
            points,
            "Author points adjusted"
        );
        Ok(())
    }
}

#[async_trait]
impl EventHandler for PointsAggregator {
    async fn handle(&self, event: &DomainEvent, uow: &dyn UnitOfWork) -> Result<(), DomainError> {
        match event {
            DomainEvent::VoteCreated(vote) => {
                self.apply(uow, vote, vote.vote_type.points_delta()).await
            }
            DomainEvent::VoteDeleted(vote) => {
                self.apply(uow, vote, -vote.vote_type.points_delta()).await
            }
            DomainEvent::PostDeleting { .. } => Ok(()),
        }
    }
}
