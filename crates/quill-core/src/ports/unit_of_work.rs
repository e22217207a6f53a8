//! Transaction-scoped access to the repositories.

use async_trait::async_trait;

use super::repository::{
    CommentRepository, ImageRepository, PostRepository, ProfileRepository, TagRepository,
    UserRepository, VoteRepository,
};
use crate::error::RepoError;

/// A unit of work groups every repository behind one transaction.
///
/// Changes become visible to other units of work only after [`commit`].
/// Dropping a unit of work without committing discards its changes.
///
/// [`commit`]: UnitOfWork::commit
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    fn users(&self) -> &dyn UserRepository;
    fn profiles(&self) -> &dyn ProfileRepository;
    fn posts(&self) -> &dyn PostRepository;
    fn tags(&self) -> &dyn TagRepository;
    fn comments(&self) -> &dyn CommentRepository;
    fn votes(&self) -> &dyn VoteRepository;
    fn images(&self) -> &dyn ImageRepository;

    /// Make every change made through this unit of work durable.
    async fn commit(self: Box<Self>) -> Result<(), RepoError>;
}

/// Store trait - abstraction over persistence backends (PostgreSQL, in-memory).
#[async_trait]
pub trait Store: Send + Sync {
    /// Open a new unit of work.
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, RepoError>;
}
