//! Post service
//!
//! Staff publish, edit and delete posts; everyone can read them. Deleting a
//! post announces `PostDeleting` first so orphaned tags can be collected
//! while the post's tag links are still in place.

use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::{Post, PostImage, PostQuery, Tag};
use crate::error::DomainError;
use crate::events::DomainEvent;
use crate::ports::UnitOfWork;

use super::comment::{CommentView, remove_comment, with_tallies};
use super::tag::validate_name;
use super::{Actor, ServiceContext, ServiceResult};

pub const MAX_TITLE_LENGTH: usize = 240;
pub const MAX_DESCRIPTION_LENGTH: usize = 255;

/// Fields of a post as listed.
#[derive(Debug, Clone)]
pub struct PostSummaryView {
    pub post: Post,
    pub tags: Vec<Tag>,
    pub number_of_comments: u64,
}

/// A single post with its body, images and comments.
#[derive(Debug, Clone)]
pub struct PostDetailView {
    pub summary: PostSummaryView,
    pub images: Vec<PostImage>,
    pub comments: Vec<CommentView>,
}

#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub title: String,
    pub description: String,
    pub body: String,
    pub cover_image: Option<String>,
    /// Tag names, created on demand.
    pub tags: Vec<String>,
}

/// Partial update. `None` leaves a field untouched; `Some` tag list replaces
/// the post's tags.
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub body: Option<String>,
    pub cover_image: Option<String>,
    pub tags: Option<Vec<String>>,
}

pub struct PostService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> PostService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    pub async fn list_posts(&self, query: &PostQuery) -> ServiceResult<Vec<PostSummaryView>> {
        let uow = self.ctx.begin().await?;
        let posts = uow.posts().list(query).await?;

        let mut views = Vec::with_capacity(posts.len());
        for post in posts {
            views.push(summarize(uow.as_ref(), post).await?);
        }
        Ok(views)
    }

    pub async fn get_post(&self, id: Uuid) -> ServiceResult<PostDetailView> {
        let uow = self.ctx.begin().await?;
        let post = uow
            .posts()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", id))?;
        detail(uow.as_ref(), post).await
    }

    #[instrument(skip(self, new), fields(user_id = %actor.user_id, title = %new.title))]
    pub async fn create_post(&self, actor: &Actor, new: NewPost) -> ServiceResult<PostDetailView> {
        actor.require_staff()?;
        validate_title(&new.title)?;
        validate_description(&new.description)?;

        let uow = self.ctx.begin().await?;

        let mut post = Post::new(actor.user_id, new.title, new.description, new.body);
        post.cover_image = new.cover_image;

        if post.slug.is_empty() {
            return Err(DomainError::validation(
                "title",
                "Title must contain at least one letter or digit.",
            ));
        }
        if uow.posts().find_by_title(&post.title).await?.is_some() {
            return Err(DomainError::duplicate("title", post.title));
        }
        if uow.posts().find_by_slug(&post.slug).await?.is_some() {
            return Err(DomainError::duplicate("slug", post.slug));
        }

        let post = uow.posts().save(post).await?;
        let tag_ids = resolve_tags(uow.as_ref(), new.tags, actor.user_id).await?;
        uow.posts().set_tags(post.id, &tag_ids).await?;

        let view = detail(uow.as_ref(), post).await?;
        uow.commit().await?;

        info!(post_id = %view.summary.post.id, slug = %view.summary.post.slug, "Post created");
        Ok(view)
    }

    #[instrument(skip(self, changes), fields(user_id = %actor.user_id))]
    pub async fn update_post(
        &self,
        actor: &Actor,
        id: Uuid,
        changes: PostChanges,
    ) -> ServiceResult<PostDetailView> {
        actor.require_staff()?;
        let uow = self.ctx.begin().await?;

        let mut post = uow
            .posts()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", id))?;

        if let Some(title) = changes.title {
            validate_title(&title)?;
            let taken = uow.posts().find_by_title(&title).await?;
            if taken.is_some_and(|other| other.id != id) {
                return Err(DomainError::duplicate("title", title));
            }
            post.title = title;
        }
        if let Some(description) = changes.description {
            validate_description(&description)?;
            post.description = description;
        }
        if let Some(body) = changes.body {
            post.body = body;
        }
        if let Some(cover_image) = changes.cover_image {
            post.cover_image = Some(cover_image);
        }
        post.touch();

        let post = uow.posts().save(post).await?;
        if let Some(names) = changes.tags {
            let tag_ids = resolve_tags(uow.as_ref(), names, actor.user_id).await?;
            uow.posts().set_tags(id, &tag_ids).await?;
        }

        let view = detail(uow.as_ref(), post).await?;
        uow.commit().await?;

        info!(post_id = %id, "Post updated");
        Ok(view)
    }

    /// Delete a post along with its comments, their votes, its images and
    /// any tag no other post uses.
    #[instrument(skip(self), fields(user_id = %actor.user_id))]
    pub async fn delete_post(&self, actor: &Actor, id: Uuid) -> ServiceResult<()> {
        actor.require_staff()?;
        let uow = self.ctx.begin().await?;

        if uow.posts().find_by_id(id).await?.is_none() {
            return Err(DomainError::not_found("Post", id));
        }

        self.ctx
            .events()
            .dispatch(DomainEvent::PostDeleting { post_id: id }, uow.as_ref())
            .await?;

        for comment in uow.comments().list_for_post(id).await? {
            remove_comment(self.ctx.events(), uow.as_ref(), &comment).await?;
        }
        for image in uow.images().list_for_post(id).await? {
            uow.images().delete(image.id).await?;
        }
        uow.posts().set_tags(id, &[]).await?;
        uow.posts().delete(id).await?;

        uow.commit().await?;

        info!(post_id = %id, "Post deleted");
        Ok(())
    }
}

fn validate_title(title: &str) -> ServiceResult<()> {
    if title.trim().is_empty() {
        return Err(DomainError::validation("title", "This field may not be blank."));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(DomainError::validation(
            "title",
            format!("Ensure this field has no more than {MAX_TITLE_LENGTH} characters."),
        ));
    }
    Ok(())
}

fn validate_description(description: &str) -> ServiceResult<()> {
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(DomainError::validation(
            "description",
            format!("Ensure this field has no more than {MAX_DESCRIPTION_LENGTH} characters."),
        ));
    }
    Ok(())
}

/// Get-or-create each named tag, returning distinct ids in input order.
/// New tags are attributed to `creator`.
async fn resolve_tags(
    uow: &dyn UnitOfWork,
    names: Vec<String>,
    creator: Uuid,
) -> ServiceResult<Vec<Uuid>> {
    let mut ids = Vec::with_capacity(names.len());
    for name in names {
        let name = validate_name(name)?;
        let tag = match uow.tags().find_by_name(&name).await? {
            Some(tag) => tag,
            None => uow.tags().save(Tag::new(name, Some(creator))).await?,
        };
        if !ids.contains(&tag.id) {
            ids.push(tag.id);
        }
    }
    Ok(ids)
}

async fn summarize(uow: &dyn UnitOfWork, post: Post) -> ServiceResult<PostSummaryView> {
    let tags = uow.tags().list_for_post(post.id).await?;
    let number_of_comments = uow.comments().count_for_post(post.id).await?;
    Ok(PostSummaryView {
        post,
        tags,
        number_of_comments,
    })
}

async fn detail(uow: &dyn UnitOfWork, post: Post) -> ServiceResult<PostDetailView> {
    let images = uow.images().list_for_post(post.id).await?;
    let comments = uow.comments().list_for_post(post.id).await?;
    let comments = with_tallies(uow, comments).await?;
    let summary = summarize(uow, post).await?;
    Ok(PostDetailView {
        summary,
        images,
        comments,
    })
}
