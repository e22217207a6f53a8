use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Comment, Post, PostImage, PostQuery, Tag, User, UserProfile, Vote, VoteType};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Save an entity (create or update).
    async fn save(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their (normalized) email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;
}

/// Profile repository, keyed by the owning user's ID.
#[async_trait]
pub trait ProfileRepository: BaseRepository<UserProfile, Uuid> {
    /// Add `delta` to the user's points in a single atomic update and return
    /// the new total. Creates the profile if it does not exist yet.
    async fn adjust_points(&self, user_id: Uuid, delta: i64) -> Result<i64, RepoError>;
}

/// Post repository.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    async fn find_by_title(&self, title: &str) -> Result<Option<Post>, RepoError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError>;

    /// Posts matching the query's tag filter, in the query's order.
    async fn list(&self, query: &PostQuery) -> Result<Vec<Post>, RepoError>;

    /// Replace the set of tags linked to a post.
    async fn set_tags(&self, post_id: Uuid, tag_ids: &[Uuid]) -> Result<(), RepoError>;
}

/// Tag repository. Deleting a tag also unlinks it from every post.
#[async_trait]
pub trait TagRepository: BaseRepository<Tag, Uuid> {
    async fn find_by_name(&self, name: &str) -> Result<Option<Tag>, RepoError>;

    async fn list_all(&self) -> Result<Vec<Tag>, RepoError>;

    /// Tags linked to a post, ordered by name.
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<Tag>, RepoError>;

    /// Number of posts linked to a tag.
    async fn count_posts(&self, tag_id: Uuid) -> Result<u64, RepoError>;
}

/// Comment repository.
#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, Uuid> {
    /// All comments, newest first.
    async fn list_all(&self) -> Result<Vec<Comment>, RepoError>;

    /// Comments on one post, newest first.
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError>;

    async fn count_for_post(&self, post_id: Uuid) -> Result<u64, RepoError>;
}

/// Vote ledger.
#[async_trait]
pub trait VoteRepository: BaseRepository<Vote, Uuid> {
    async fn find_by_user_and_comment(
        &self,
        user_id: Uuid,
        comment_id: Uuid,
    ) -> Result<Option<Vote>, RepoError>;

    async fn list_for_comment(&self, comment_id: Uuid) -> Result<Vec<Vote>, RepoError>;

    async fn count_for_comment(
        &self,
        comment_id: Uuid,
        vote_type: VoteType,
    ) -> Result<u64, RepoError>;
}

/// Post image repository.
#[async_trait]
pub trait ImageRepository: BaseRepository<PostImage, Uuid> {
    async fn list_all(&self) -> Result<Vec<PostImage>, RepoError>;

    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<PostImage>, RepoError>;
}
