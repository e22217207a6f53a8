//! PostgreSQL store.
//!
//! Every unit of work is one database transaction; each repository trait is
//! implemented directly on [`PostgresUnitOfWork`] so all of them share it.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::sea_query::{Expr, Order, Query};
use sea_orm::{
    ColumnTrait, DatabaseTransaction, DbConn, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set, TransactionTrait,
};
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

use super::entity::{comment, image, post, post_tag, profile, tag, user, vote};
use super::postgres_base::{delete_by_id, find_by_id, query_err, upsert, write_err};

/// Live comment count of the current `posts` row, used for ordering.
const COMMENT_COUNT_SQL: &str =
    "(SELECT COUNT(*) FROM comments WHERE comments.post_id = posts.id)";

/// Store backed by a SeaORM connection pool.
#[derive(Clone)]
pub struct PostgresStore {
    db: Arc<DbConn>,
}

impl PostgresStore {
    pub fn new(db: impl Into<Arc<DbConn>>) -> Self {
        Self { db: db.into() }
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, RepoError> {
        let txn = self.db.begin().await.map_err(query_err)?;
        Ok(Box::new(PostgresUnitOfWork { txn }))
    }
}

/// Unit of work over an open transaction. Dropping it rolls back.
pub struct PostgresUnitOfWork {
    txn: DatabaseTransaction,
}

#[async_trait]
impl UnitOfWork for PostgresUnitOfWork {
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
        self.txn.commit().await.map_err(query_err)
    }
}

macro_rules! base_repository {
    ($domain:ty, $entity:ty) => {
        #[async_trait]
        impl BaseRepository<$domain, Uuid> for PostgresUnitOfWork {
            async fn find_by_id(&self, id: Uuid) -> Result<Option<$domain>, RepoError> {
                find_by_id::<$entity, _, _, _>(&self.txn, id).await
            }

            async fn save(&self, entity: $domain) -> Result<$domain, RepoError> {
                upsert::<$entity, _, _>(&self.txn, entity).await
            }

            async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
                delete_by_id::<$entity, _, _>(&self.txn, id).await
            }
        }
    };
}

base_repository!(User, user::Entity);
base_repository!(UserProfile, profile::Entity);
base_repository!(Post, post::Entity);
base_repository!(Tag, tag::Entity);
base_repository!(Comment, comment::Entity);
base_repository!(Vote, vote::Entity);
base_repository!(PostImage, image::Entity);

#[async_trait]
impl UserRepository for PostgresUnitOfWork {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let result = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.txn)
            .await
            .map_err(query_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let result = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.txn)
            .await
            .map_err(query_err)?;

        Ok(result.map(Into::into))
    }
}

#[async_trait]
impl ProfileRepository for PostgresUnitOfWork {
    async fn adjust_points(&self, user_id: Uuid, delta: i64) -> Result<i64, RepoError> {
        let result = profile::Entity::update_many()
            .col_expr(
                profile::Column::Points,
                Expr::col(profile::Column::Points).add(delta),
            )
            .filter(profile::Column::UserId.eq(user_id))
            .exec(&self.txn)
            .await
            .map_err(write_err)?;

        if result.rows_affected == 0 {
            let missing = profile::ActiveModel {
                user_id: Set(user_id),
                points: Set(delta),
                ..Default::default()
            };
            profile::Entity::insert(missing)
                .exec_without_returning(&self.txn)
                .await
                .map_err(write_err)?;
            return Ok(delta);
        }

        let profile = profile::Entity::find_by_id(user_id)
            .one(&self.txn)
            .await
            .map_err(query_err)?
            .ok_or(RepoError::NotFound)?;

        Ok(profile.points)
    }
}

#[async_trait]
impl PostRepository for PostgresUnitOfWork {
    async fn find_by_title(&self, title: &str) -> Result<Option<Post>, RepoError> {
        let result = post::Entity::find()
            .filter(post::Column::Title.eq(title))
            .one(&self.txn)
            .await
            .map_err(query_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        let result = post::Entity::find()
            .filter(post::Column::Slug.eq(slug))
            .one(&self.txn)
            .await
            .map_err(query_err)?;

        Ok(result.map(Into::into))
    }

    async fn list(&self, query: &PostQuery) -> Result<Vec<Post>, RepoError> {
        let mut select = post::Entity::find();

        if !query.tag_ids.is_empty() {
            select = select.filter(
                post::Column::Id.in_subquery(
                    Query::select()
                        .column(post_tag::Column::PostId)
                        .from(post_tag::Entity)
                        .and_where(post_tag::Column::TagId.is_in(query.tag_ids.clone()))
                        .to_owned(),
                ),
            );
        }

        let order = match query.sort.direction {
            SortDirection::Asc => Order::Asc,
            SortDirection::Desc => Order::Desc,
        };
        select = match query.sort.field {
            SortField::Title => select.order_by(post::Column::Title, order),
            SortField::Comments => select.order_by(Expr::cust(COMMENT_COUNT_SQL), order),
            SortField::Created => select.order_by(post::Column::CreatedAt, order),
            SortField::Updated => select.order_by(post::Column::UpdatedAt, order),
        };

        let posts = select
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::UpdatedAt)
            .all(&self.txn)
            .await
            .map_err(query_err)?;

        Ok(posts.into_iter().map(Into::into).collect())
    }

    async fn set_tags(&self, post_id: Uuid, tag_ids: &[Uuid]) -> Result<(), RepoError> {
        post_tag::Entity::delete_many()
            .filter(post_tag::Column::PostId.eq(post_id))
            .exec(&self.txn)
            .await
            .map_err(write_err)?;

        if tag_ids.is_empty() {
            return Ok(());
        }

        let links = tag_ids.iter().map(|tag_id| post_tag::ActiveModel {
            post_id: Set(post_id),
            tag_id: Set(*tag_id),
        });
        post_tag::Entity::insert_many(links)
            .exec_without_returning(&self.txn)
            .await
            .map_err(write_err)?;

        Ok(())
    }
}

#[async_trait]
impl TagRepository for PostgresUnitOfWork {
    async fn find_by_name(&self, name: &str) -> Result<Option<Tag>, RepoError> {
        let result = tag::Entity::find()
            .filter(tag::Column::Name.eq(name))
            .order_by_asc(tag::Column::Id)
            .one(&self.txn)
            .await
            .map_err(query_err)?;

        Ok(result.map(Into::into))
    }

    async fn list_all(&self) -> Result<Vec<Tag>, RepoError> {
        let tags = tag::Entity::find()
            .order_by_asc(tag::Column::Name)
            .all(&self.txn)
            .await
            .map_err(query_err)?;

        Ok(tags.into_iter().map(Into::into).collect())
    }

    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<Tag>, RepoError> {
        let tags = tag::Entity::find()
            .filter(
                tag::Column::Id.in_subquery(
                    Query::select()
                        .column(post_tag::Column::TagId)
                        .from(post_tag::Entity)
                        .and_where(post_tag::Column::PostId.eq(post_id))
                        .to_owned(),
                ),
            )
            .order_by_asc(tag::Column::Name)
            .all(&self.txn)
            .await
            .map_err(query_err)?;

        Ok(tags.into_iter().map(Into::into).collect())
    }

    async fn count_posts(&self, tag_id: Uuid) -> Result<u64, RepoError> {
        post_tag::Entity::find()
            .filter(post_tag::Column::TagId.eq(tag_id))
            .count(&self.txn)
            .await
            .map_err(query_err)
    }
}

#[async_trait]
impl CommentRepository for PostgresUnitOfWork {
    async fn list_all(&self) -> Result<Vec<Comment>, RepoError> {
        let comments = comment::Entity::find()
            .order_by_desc(comment::Column::CreatedAt)
            .order_by_desc(comment::Column::UpdatedAt)
            .all(&self.txn)
            .await
            .map_err(query_err)?;

        Ok(comments.into_iter().map(Into::into).collect())
    }

    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let comments = comment::Entity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_desc(comment::Column::CreatedAt)
            .order_by_desc(comment::Column::UpdatedAt)
            .all(&self.txn)
            .await
            .map_err(query_err)?;

        Ok(comments.into_iter().map(Into::into).collect())
    }

    async fn count_for_post(&self, post_id: Uuid) -> Result<u64, RepoError> {
        comment::Entity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .count(&self.txn)
            .await
            .map_err(query_err)
    }
}

#[async_trait]
impl VoteRepository for PostgresUnitOfWork {
    async fn find_by_user_and_comment(
        &self,
        user_id: Uuid,
        comment_id: Uuid,
    ) -> Result<Option<Vote>, RepoError> {
        let result = vote::Entity::find()
            .filter(vote::Column::UserId.eq(user_id))
            .filter(vote::Column::CommentId.eq(comment_id))
            .one(&self.txn)
            .await
            .map_err(query_err)?;

        Ok(result.map(Into::into))
    }

    async fn list_for_comment(&self, comment_id: Uuid) -> Result<Vec<Vote>, RepoError> {
        let votes = vote::Entity::find()
            .filter(vote::Column::CommentId.eq(comment_id))
            .order_by_asc(vote::Column::CreatedAt)
            .all(&self.txn)
            .await
            .map_err(query_err)?;

        Ok(votes.into_iter().map(Into::into).collect())
    }

    async fn count_for_comment(
        &self,
        comment_id: Uuid,
        vote_type: VoteType,
    ) -> Result<u64, RepoError> {
        vote::Entity::find()
            .filter(vote::Column::CommentId.eq(comment_id))
            .filter(vote::Column::VoteType.eq(vote::VoteKind::from(vote_type)))
            .count(&self.txn)
            .await
            .map_err(query_err)
    }
}

#[async_trait]
impl ImageRepository for PostgresUnitOfWork {
    async fn list_all(&self) -> Result<Vec<PostImage>, RepoError> {
        let images = image::Entity::find()
            .order_by_asc(image::Column::Title)
            .order_by_asc(image::Column::Id)
            .all(&self.txn)
            .await
            .map_err(query_err)?;

        Ok(images.into_iter().map(Into::into).collect())
    }

    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<PostImage>, RepoError> {
        let images = image::Entity::find()
            .filter(image::Column::PostId.eq(post_id))
            .order_by_asc(image::Column::Title)
            .order_by_asc(image::Column::Id)
            .all(&self.txn)
            .await
            .map_err(query_err)?;

        Ok(images.into_iter().map(Into::into).collect())
    }
}
