//! Vote ledger operations with toggle semantics.

use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::{Vote, VoteType};
use crate::error::DomainError;
use crate::events::DomainEvent;

use super::{Actor, ServiceContext, ServiceResult};

/// What a vote submission did to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteOutcome {
    /// No vote existed; one was recorded.
    Created { vote: Vote },
    /// A vote of the other type existed; it was swapped for the new one.
    Replaced { previous: Vote, vote: Vote },
    /// A vote of the same type existed; it was withdrawn.
    Removed { vote: Vote },
}

impl VoteOutcome {
    pub fn action(&self) -> &'static str {
        match self {
            VoteOutcome::Created { .. } => "created",
            VoteOutcome::Replaced { .. } => "replaced",
            VoteOutcome::Removed { .. } => "removed",
        }
    }

    /// The vote now in the ledger, or the one just removed.
    pub fn vote(&self) -> &Vote {
        match self {
            VoteOutcome::Created { vote }
            | VoteOutcome::Replaced { vote, .. }
            | VoteOutcome::Removed { vote } => vote,
        }
    }
}

pub struct VoteService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> VoteService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Cast, flip or withdraw the actor's vote on a comment.
    #[instrument(skip(self), fields(user_id = %actor.user_id))]
    pub async fn submit_vote(
        &self,
        actor: &Actor,
        comment_id: Uuid,
        vote_type: VoteType,
    ) -> ServiceResult<VoteOutcome> {
        let uow = self.ctx.begin().await?;

        if uow.comments().find_by_id(comment_id).await?.is_none() {
            return Err(DomainError::not_found("Comment", comment_id));
        }

        let existing = uow
            .votes()
            .find_by_user_and_comment(actor.user_id, comment_id)
            .await?;

        let outcome = match existing {
            Some(previous) => {
                uow.votes().delete(previous.id).await?;
                self.ctx
                    .events()
                    .dispatch(DomainEvent::VoteDeleted(previous.clone()), uow.as_ref())
                    .await?;

                if previous.vote_type == vote_type {
                    VoteOutcome::Removed { vote: previous }
                } else {
                    let vote = uow
                        .votes()
                        .save(Vote::new(actor.user_id, comment_id, vote_type))
                        .await?;
                    self.ctx
                        .events()
                        .dispatch(DomainEvent::VoteCreated(vote.clone()), uow.as_ref())
                        .await?;
                    VoteOutcome::Replaced { previous, vote }
                }
            }
            None => {
                let vote = uow
                    .votes()
                    .save(Vote::new(actor.user_id, comment_id, vote_type))
                    .await?;
                self.ctx
                    .events()
                    .dispatch(DomainEvent::VoteCreated(vote.clone()), uow.as_ref())
                    .await?;
                VoteOutcome::Created { vote }
            }
        };

        uow.commit().await?;

        info!(
            comment_id = %comment_id,
            vote_id = %outcome.vote().id,
            action = outcome.action(),
            "Vote submitted"
        );
        Ok(outcome)
    }

    /// Withdraw a vote by id. Only its author may do so.
    #[instrument(skip(self), fields(user_id = %actor.user_id))]
    pub async fn delete_vote(&self, actor: &Actor, vote_id: Uuid) -> ServiceResult<()> {
        let uow = self.ctx.begin().await?;

        let vote = uow
            .votes()
            .find_by_id(vote_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Vote", vote_id))?;
        actor.require_owner(vote.user_id)?;

        uow.votes().delete(vote.id).await?;
        self.ctx
            .events()
            .dispatch(DomainEvent::VoteDeleted(vote), uow.as_ref())
            .await?;

        uow.commit().await?;

        info!(vote_id = %vote_id, "Vote deleted");
        Ok(())
    }
}
