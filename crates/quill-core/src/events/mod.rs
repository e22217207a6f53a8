//! Domain events and their synchronous handlers.
//!
//! Services emit an event right after (or, for deletions that need the
//! pre-delete state, right before) the persistence operation it describes.
//! The [`EventDispatcher`] runs every registered handler inside the same
//! unit of work, so the reaction commits or rolls back together with the
//! change that caused it.

mod points;
mod tag_gc;

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::Vote;
use crate::error::DomainError;
use crate::ports::UnitOfWork;

pub use points::PointsAggregator;
pub use tag_gc::TagGarbageCollector;

/// Something that happened to the domain state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainEvent {
    /// A vote row was persisted.
    VoteCreated(Vote),
    /// A vote row was removed. Carries the removed row.
    VoteDeleted(Vote),
    /// A post is about to be removed; its associations are still intact.
    PostDeleting { post_id: Uuid },
}

impl DomainEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::VoteCreated(_) => "vote_created",
            DomainEvent::VoteDeleted(_) => "vote_deleted",
            DomainEvent::PostDeleting { .. } => "post_deleting",
        }
    }
}

/// Reacts to domain events within the emitting unit of work.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &DomainEvent, uow: &dyn UnitOfWork) -> Result<(), DomainError>;
}

/// Ordered list of handlers every event is delivered to.
#[derive(Clone, Default)]
pub struct EventDispatcher {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    /// Dispatcher with no handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatcher wired with the points aggregator and the tag garbage collector.
    pub fn standard() -> Self {
        Self::new()
            .with_handler(Arc::new(PointsAggregator))
            .with_handler(Arc::new(TagGarbageCollector))
    }

    pub fn with_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Deliver `event` to every handler in registration order, stopping at
    /// the first failure.
    pub async fn dispatch(&self, event: DomainEvent, uow: &dyn UnitOfWork) -> Result<(), DomainError> {
        tracing::debug!(event = event.name(), "Dispatching domain event");
        for handler in &self.handlers {
            handler.handle(&event, uow).await?;
        }
        Ok(())
    }
}
