//! In-memory store used when no database is configured.
//!
//! A unit of work takes the store's async mutex for its whole lifetime and
//! works on a copy of the tables, so units of work are serialized and an
//! uncommitted one leaves no trace. Referential rules mirror the PostgreSQL
//! schema: unique columns and foreign keys are checked on save, and deleting
//! a parent row cascades to its children.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use uuid::Uuid;

use quill_core::domain::{
    Comment, Post, PostImage, PostQuery, SortDirection, SortField, Tag, User, UserProfile, Vote,
    VoteType,
};
use quill_core::error::RepoError;
use quill_core::ports::{
    BaseRepository, CommentRepository, ImageRepository, PostRepository, ProfileRepository, Store,
    TagRepository, UnitOfWork, UserRepository, VoteRepository,
};

#[derive(Debug, Clone, Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    profiles: HashMap<Uuid, UserProfile>,
    posts: HashMap<Uuid, Post>,
    tags: HashMap<Uuid, Tag>,
    /// (post_id, tag_id)
    post_tags: BTreeSet<(Uuid, Uuid)>,
    comments: HashMap<Uuid, Comment>,
    votes: HashMap<Uuid, Vote>,
    images: HashMap<Uuid, PostImage>,
}

impl Tables {
    fn remove_post(&mut self, post_id: Uuid) {
        self.posts.remove(&post_id);
        self.post_tags.retain(|(post, _)| *post != post_id);
        let comments: Vec<Uuid> = self
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .map(|c| c.id)
            .collect();
        for comment_id in comments {
            self.remove_comment(comment_id);
        }
        self.images.retain(|_, image| image.post_id != post_id);
    }

    fn remove_comment(&mut self, comment_id: Uuid) {
        self.comments.remove(&comment_id);
        self.votes.retain(|_, vote| vote.comment_id != comment_id);
    }

    fn comment_count(&self, post_id: Uuid) -> usize {
        self.comments
            .values()
            .filter(|c| c.post_id == post_id)
            .count()
    }
}

type Stamps = (DateTime<Utc>, DateTime<Utc>);

/// Newest first by `(created_at, updated_at)`, the default order for posts
/// and comments.
fn newest_first<T>(a: &T, b: &T, stamps: impl Fn(&T) -> Stamps) -> Ordering {
    stamps(b).cmp(&stamps(a))
}

/// Process-local store backed by hash maps.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, RepoError> {
        let guard = self.tables.clone().lock_owned().await;
        let work = RwLock::new(Tables::clone(&guard));
        Ok(Box::new(InMemoryUnitOfWork { guard, work }))
    }
}

/// Unit of work over a private copy of the tables.
pub struct InMemoryUnitOfWork {
    guard: OwnedMutexGuard<Tables>,
    work: RwLock<Tables>,
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    fn users(&self) -> &dyn UserRepository {
        self
    }

    fn profiles(&self) -> &dyn ProfileRepository {
        self
    }

    fn posts(&self) -> &dyn PostRepository {
        self
    }

    fn tags(&self) -> &dyn TagRepository {
        self
    }

    fn comments(&self) -> &dyn CommentRepository {
        self
    }

    fn votes(&self) -> &dyn VoteRepository {
        self
    }

    fn images(&self) -> &dyn ImageRepository {
        self
    }

    async fn commit(self: Box<Self>) -> Result<(), RepoError> {
        let InMemoryUnitOfWork { mut guard, work } = *self;
        *guard = work.into_inner();
        Ok(())
    }
}

fn constraint(message: &str) -> RepoError {
    RepoError::Constraint(message.to_string())
}

// Users

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryUnitOfWork {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.work.read().await.users.get(&id).cloned())
    }

    async fn save(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.work.write().await;
        let clash = tables
            .users
            .values()
            .any(|u| u.id != user.id && (u.email == user.email || u.username == user.username));
        if clash {
            return Err(constraint("duplicate key value violates unique constraint on users"));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.work.write().await;
        tables.users.remove(&id).ok_or(RepoError::NotFound)?;
        tables.profiles.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryUnitOfWork {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let tables = self.work.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.work.read().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }
}

// Profiles

#[async_trait]
impl BaseRepository<UserProfile, Uuid> for InMemoryUnitOfWork {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<UserProfile>, RepoError> {
        Ok(self.work.read().await.profiles.get(&user_id).cloned())
    }

    async fn save(&self, mut profile: UserProfile) -> Result<UserProfile, RepoError> {
        let mut tables = self.work.write().await;
        if !tables.users.contains_key(&profile.user_id) {
            return Err(constraint("profile references a missing user"));
        }
        // Points only move through adjust_points.
        profile.points = tables
            .profiles
            .get(&profile.user_id)
            .map_or(0, |stored| stored.points);
        tables.profiles.insert(profile.user_id, profile.clone());
        Ok(profile)
    }

    async fn delete(&self, user_id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.work.write().await;
        tables.profiles.remove(&user_id).ok_or(RepoError::NotFound)?;
        Ok(())
    }
}

#[async_trait]
impl ProfileRepository for InMemoryUnitOfWork {
    async fn adjust_points(&self, user_id: Uuid, delta: i64) -> Result<i64, RepoError> {
        let mut tables = self.work.write().await;
        if !tables.users.contains_key(&user_id) {
            return Err(constraint("profile references a missing user"));
        }
        let profile = tables
            .profiles
            .entry(user_id)
            .or_insert_with(|| UserProfile::new(user_id));
        profile.points += delta;
        Ok(profile.points)
    }
}

// Posts

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryUnitOfWork {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.work.read().await.posts.get(&id).cloned())
    }

    async fn save(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.work.write().await;
        let clash = tables
            .posts
            .values()
            .any(|p| p.id != post.id && (p.title == post.title || p.slug == post.slug));
        if clash {
            return Err(constraint("duplicate key value violates unique constraint on posts"));
        }
        if !tables.users.contains_key(&post.author_id) {
            return Err(constraint("post references a missing author"));
        }
        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.work.write().await;
        if !tables.posts.contains_key(&id) {
            return Err(RepoError::NotFound);
        }
        tables.remove_post(id);
        Ok(())
    }
}

#[async_trait]
impl PostRepository for InMemoryUnitOfWork {
    async fn find_by_title(&self, title: &str) -> Result<Option<Post>, RepoError> {
        let tables = self.work.read().await;
        Ok(tables.posts.values().find(|p| p.title == title).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        let tables = self.work.read().await;
        Ok(tables.posts.values().find(|p| p.slug == slug).cloned())
    }

    async fn list(&self, query: &PostQuery) -> Result<Vec<Post>, RepoError> {
        let tables = self.work.read().await;

        let mut posts: Vec<Post> = tables
            .posts
            .values()
            .filter(|post| {
                query.tag_ids.is_empty()
                    || query
                        .tag_ids
                        .iter()
                        .any(|tag_id| tables.post_tags.contains(&(post.id, *tag_id)))
            })
            .cloned()
            .collect();

        posts.sort_by(|a, b| {
            let primary = match query.sort.field {
                SortField::Title => a.title.cmp(&b.title),
                SortField::Comments => tables.comment_count(a.id).cmp(&tables.comment_count(b.id)),
                SortField::Created => a.created_at.cmp(&b.created_at),
                SortField::Updated => a.updated_at.cmp(&b.updated_at),
            };
            let primary = match query.sort.direction {
                SortDirection::Asc => primary,
                SortDirection::Desc => primary.reverse(),
            };
            primary.then_with(|| newest_first(a, b, |p| (p.created_at, p.updated_at)))
        });

        Ok(posts)
    }

    async fn set_tags(&self, post_id: Uuid, tag_ids: &[Uuid]) -> Result<(), RepoError> {
        let mut tables = self.work.write().await;
        if tag_ids.iter().any(|id| !tables.tags.contains_key(id)) {
            return Err(constraint("post tag references a missing tag"));
        }
        tables.post_tags.retain(|(post, _)| *post != post_id);
        for tag_id in tag_ids {
            tables.post_tags.insert((post_id, *tag_id));
        }
        Ok(())
    }
}

// Tags

#[async_trait]
impl BaseRepository<Tag, Uuid> for InMemoryUnitOfWork {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Tag>, RepoError> {
        Ok(self.work.read().await.tags.get(&id).cloned())
    }

    async fn save(&self, tag: Tag) -> Result<Tag, RepoError> {
        let mut tables = self.work.write().await;
        if tables
            .tags
            .values()
            .any(|t| t.id != tag.id && t.name == tag.name)
        {
            return Err(constraint("duplicate tag name"));
        }
        tables.tags.insert(tag.id, tag.clone());
        Ok(tag)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.work.write().await;
        tables.tags.remove(&id).ok_or(RepoError::NotFound)?;
        tables.post_tags.retain(|(_, tag)| *tag != id);
        Ok(())
    }
}

#[async_trait]
impl TagRepository for InMemoryUnitOfWork {
    async fn find_by_name(&self, name: &str) -> Result<Option<Tag>, RepoError> {
        let tables = self.work.read().await;
        Ok(tables.tags.values().find(|t| t.name == name).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Tag>, RepoError> {
        let tables = self.work.read().await;
        let mut tags: Vec<Tag> = tables.tags.values().cloned().collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<Tag>, RepoError> {
        let tables = self.work.read().await;
        let mut tags: Vec<Tag> = tables
            .post_tags
            .iter()
            .filter(|(post, _)| *post == post_id)
            .filter_map(|(_, tag_id)| tables.tags.get(tag_id).cloned())
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    async fn count_posts(&self, tag_id: Uuid) -> Result<u64, RepoError> {
        let tables = self.work.read().await;
        let count = tables
            .post_tags
            .iter()
            .filter(|(_, tag)| *tag == tag_id)
            .count();
        Ok(count as u64)
    }
}

// Comments

#[async_trait]
impl BaseRepository<Comment, Uuid> for InMemoryUnitOfWork {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, RepoError> {
        Ok(self.work.read().await.comments.get(&id).cloned())
    }

    async fn save(&self, comment: Comment) -> Result<Comment, RepoError> {
        let mut tables = self.work.write().await;
        if !tables.posts.contains_key(&comment.post_id) {
            return Err(constraint("comment references a missing post"));
        }
        if !tables.users.contains_key(&comment.author_id) {
            return Err(constraint("comment references a missing author"));
        }
        tables.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.work.write().await;
        if !tables.comments.contains_key(&id) {
            return Err(RepoError::NotFound);
        }
        tables.remove_comment(id);
        Ok(())
    }
}

#[async_trait]
impl CommentRepository for InMemoryUnitOfWork {
    async fn list_all(&self) -> Result<Vec<Comment>, RepoError> {
        let tables = self.work.read().await;
        let mut comments: Vec<Comment> = tables.comments.values().cloned().collect();
        comments.sort_by(|a, b| newest_first(a, b, |c| (c.created_at, c.updated_at)));
        Ok(comments)
    }

    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let tables = self.work.read().await;
        let mut comments: Vec<Comment> = tables
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| newest_first(a, b, |c| (c.created_at, c.updated_at)));
        Ok(comments)
    }

    async fn count_for_post(&self, post_id: Uuid) -> Result<u64, RepoError> {
        Ok(self.work.read().await.comment_count(post_id) as u64)
    }
}

// Votes

#[async_trait]
impl BaseRepository<Vote, Uuid> for InMemoryUnitOfWork {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Vote>, RepoError> {
        Ok(self.work.read().await.votes.get(&id).cloned())
    }

    async fn save(&self, vote: Vote) -> Result<Vote, RepoError> {
        let mut tables = self.work.write().await;
        let clash = tables.votes.values().any(|v| {
            v.id != vote.id && v.user_id == vote.user_id && v.comment_id == vote.comment_id
        });
        if clash {
            return Err(constraint("duplicate key value violates unique constraint on votes"));
        }
        if !tables.comments.contains_key(&vote.comment_id) {
            return Err(constraint("vote references a missing comment"));
        }
        if !tables.users.contains_key(&vote.user_id) {
            return Err(constraint("vote references a missing user"));
        }
        tables.votes.insert(vote.id, vote.clone());
        Ok(vote)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.work.write().await;
        tables.votes.remove(&id).ok_or(RepoError::NotFound)?;
        Ok(())
    }
}

#[async_trait]
impl VoteRepository for InMemoryUnitOfWork {
    async fn find_by_user_and_comment(
        &self,
        user_id: Uuid,
        comment_id: Uuid,
    ) -> Result<Option<Vote>, RepoError> {
        let tables = self.work.read().await;
        Ok(tables
            .votes
            .values()
            .find(|v| v.user_id == user_id && v.comment_id == comment_id)
            .cloned())
    }

    async fn list_for_comment(&self, comment_id: Uuid) -> Result<Vec<Vote>, RepoError> {
        let tables = self.work.read().await;
        let mut votes: Vec<Vote> = tables
            .votes
            .values()
            .filter(|v| v.comment_id == comment_id)
            .cloned()
            .collect();
        votes.sort_by_key(|v| v.created_at);
        Ok(votes)
    }

    async fn count_for_comment(
        &self,
        comment_id: Uuid,
        vote_type: VoteType,
    ) -> Result<u64, RepoError> {
        let tables = self.work.read().await;
        let count = tables
            .votes
            .values()
            .filter(|v| v.comment_id == comment_id && v.vote_type == vote_type)
            .count();
        Ok(count as u64)
    }
}

// Images

#[async_trait]
impl BaseRepository<PostImage, Uuid> for InMemoryUnitOfWork {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostImage>, RepoError> {
        Ok(self.work.read().await.images.get(&id).cloned())
    }

    async fn save(&self, image: PostImage) -> Result<PostImage, RepoError> {
        let mut tables = self.work.write().await;
        if !tables.posts.contains_key(&image.post_id) {
            return Err(constraint("image references a missing post"));
        }
        tables.images.insert(image.id, image.clone());
        Ok(image)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.work.write().await;
        tables.images.remove(&id).ok_or(RepoError::NotFound)?;
        Ok(())
    }
}

#[async_trait]
impl ImageRepository for InMemoryUnitOfWork {
    async fn list_all(&self) -> Result<Vec<PostImage>, RepoError> {
        let tables = self.work.read().await;
        let mut images: Vec<PostImage> = tables.images.values().cloned().collect();
        images.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(images)
    }

    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<PostImage>, RepoError> {
        let tables = self.work.read().await;
        let mut images: Vec<PostImage> = tables
            .images
            .values()
            .filter(|i| i.post_id == post_id)
            .cloned()
            .collect();
        images.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(images)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seed_user(uow: &dyn UnitOfWork) -> User {
        uow.users()
            .save(User::new("author@example.com", "author".into(), "hash".into()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_uncommitted_work_is_discarded() {
        let store = InMemoryStore::new();

        let uow = store.begin().await.unwrap();
        let user = seed_user(uow.as_ref()).await;
        drop(uow);

        let uow = store.begin().await.unwrap();
        assert!(uow.users().find_by_id(user.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_committed_work_is_visible() {
        let store = InMemoryStore::new();

        let uow = store.begin().await.unwrap();
        let user = seed_user(uow.as_ref()).await;
        uow.commit().await.unwrap();

        let uow = store.begin().await.unwrap();
        assert!(uow.users().find_by_id(user.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_adjust_points_creates_missing_profile() {
        let store = InMemoryStore::new();
        let uow = store.begin().await.unwrap();
        let user = seed_user(uow.as_ref()).await;

        assert_eq!(uow.profiles().adjust_points(user.id, -1).await.unwrap(), -1);
        assert_eq!(uow.profiles().adjust_points(user.id, 2).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_profile_save_keeps_stored_points() {
        let store = InMemoryStore::new();
        let uow = store.begin().await.unwrap();
        let user = seed_user(uow.as_ref()).await;
        let mut stale = UserProfile::new(user.id);

        uow.profiles().adjust_points(user.id, 3).await.unwrap();
        stale.first_name = Some("Ada".into());
        let saved = uow.profiles().save(stale).await.unwrap();

        assert_eq!(saved.points, 3);
        let stored = uow.profiles().find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.points, 3);
        assert_eq!(stored.first_name.as_deref(), Some("Ada"));
    }

    #[tokio::test]
    async fn test_second_vote_on_same_comment_is_rejected() {
        let store = InMemoryStore::new();
        let uow = store.begin().await.unwrap();
        let user = seed_user(uow.as_ref()).await;
        let post = uow
            .posts()
            .save(Post::new(user.id, "Title".into(), "d".into(), "b".into()))
            .await
            .unwrap();
        let comment = uow
            .comments()
            .save(Comment::new(post.id, user.id, "text".into()))
            .await
            .unwrap();

        uow.votes()
            .save(Vote::new(user.id, comment.id, VoteType::Upvote))
            .await
            .unwrap();
        let second = uow
            .votes()
            .save(Vote::new(user.id, comment.id, VoteType::Downvote))
            .await;

        assert!(matches!(second, Err(RepoError::Constraint(_))));
    }

    #[tokio::test]
    async fn test_deleting_tag_unlinks_posts() {
        let store = InMemoryStore::new();
        let uow = store.begin().await.unwrap();
        let user = seed_user(uow.as_ref()).await;
        let post = uow
            .posts()
            .save(Post::new(user.id, "Title".into(), "d".into(), "b".into()))
            .await
            .unwrap();
        let tag = uow.tags().save(Tag::new("rust".into(), Some(user.id))).await.unwrap();
        uow.posts().set_tags(post.id, &[tag.id]).await.unwrap();

        uow.tags().delete(tag.id).await.unwrap();

        assert!(uow.tags().list_for_post(post.id).await.unwrap().is_empty());
    }
}
