use async_trait::async_trait;
use uuid::Uuid;

use super::{DomainEvent, EventHandler};
use crate::error::DomainError;
use crate::ports::UnitOfWork;

/// Deletes the tags that only the post being deleted still references.
///
/// Runs before the post row goes away, so a tag whose post count is exactly
/// one is referenced by that post alone.
pub struct TagGarbageCollector;

impl TagGarbageCollector {
    async fn collect(&self, uow: &dyn UnitOfWork, post_id: Uuid) -> Result<(), DomainError> {
        for tag in uow.tags().list_for_post(post_id).await? {
            if uow.tags().count_posts(tag.id).await? == 1 {
                uow.tags().delete(tag.id).await?;
                tracing::info!(tag_id = %tag.id, tag = %tag.name, "Orphaned tag removed");
            }
        }
        Ok(())
    }
}

#[async_trait]
impl EventHandler for TagGarbageCollector {
    async fn handle(&self, event: &DomainEvent, uow: &dyn UnitOfWork) -> Result<(), DomainError> {
        match event {
            DomainEvent::PostDeleting { post_id } => self.collect(uow, *post_id).await,
            _ => Ok(()),
        }
    }
}
