//! Post image service. Images are stored as path strings; writes are staff only.

use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::PostImage;
use crate::error::DomainError;

use super::{Actor, ServiceContext, ServiceResult, invalid_pk};

/// Longest image title accepted.
pub const MAX_IMAGE_TITLE_LENGTH: usize = 100;

pub struct ImageService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ImageService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    pub async fn list_images(&self) -> ServiceResult<Vec<PostImage>> {
        let uow = self.ctx.begin().await?;
        Ok(uow.images().list_all().await?)
    }

    /// Attach an image to a post. `filename` is the client-side name; the
    /// stored path is generated from it.
    #[instrument(skip(self), fields(user_id = %actor.user_id))]
    pub async fn create_image(
        &self,
        actor: &Actor,
        post_id: Uuid,
        title: String,
        filename: &str,
    ) -> ServiceResult<PostImage> {
        actor.require_staff()?;
        validate_title(&title)?;
        let uow = self.ctx.begin().await?;

        if uow.posts().find_by_id(post_id).await?.is_none() {
            return Err(DomainError::validation("post", invalid_pk(post_id)));
        }

        let image = uow
            .images()
            .save(PostImage::new(post_id, title, filename))
            .await?;
        uow.commit().await?;

        info!(image_id = %image.id, path = %image.image, "Post image created");
        Ok(image)
    }

    #[instrument(skip(self), fields(user_id = %actor.user_id))]
    pub async fn update_image(
        &self,
        actor: &Actor,
        id: Uuid,
        title: String,
    ) -> ServiceResult<PostImage> {
        actor.require_staff()?;
        validate_title(&title)?;
        let uow = self.ctx.begin().await?;

        let mut image = uow
            .images()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("PostImage", id))?;
        image.title = title;
        let image = uow.images().save(image).await?;
        uow.commit().await?;

        Ok(image)
    }

    #[instrument(skip(self), fields(user_id = %actor.user_id))]
    pub async fn delete_image(&self, actor: &Actor, id: Uuid) -> ServiceResult<()> {
        actor.require_staff()?;
        let uow = self.ctx.begin().await?;

        if uow.images().find_by_id(id).await?.is_none() {
            return Err(DomainError::not_found("PostImage", id));
        }
        uow.images().delete(id).await?;
        uow.commit().await?;

        info!(image_id = %id, "Post image deleted");
        Ok(())
    }
}

fn validate_title(title: &str) -> ServiceResult<()> {
    if title.trim().is_empty() {
        return Err(DomainError::validation("title", "This field may not be blank."));
    }
    if title.chars().count() > MAX_IMAGE_TITLE_LENGTH {
        return Err(DomainError::validation(
            "title",
            format!("Ensure this field has no more than {MAX_IMAGE_TITLE_LENGTH} characters."),
        ));
    }
    Ok(())
}
