//! Tag service. Tags are created through posts; here they can be listed,
//! renamed and removed.

use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::Tag;
use crate::error::DomainError;

use super::{Actor, ServiceContext, ServiceResult};

/// Longest tag name accepted.
pub const MAX_TAG_NAME_LENGTH: usize = 255;

pub struct TagService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> TagService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    pub async fn list_tags(&self) -> ServiceResult<Vec<Tag>> {
        let uow = self.ctx.begin().await?;
        Ok(uow.tags().list_all().await?)
    }

    #[instrument(skip(self), fields(user_id = %actor.user_id))]
    pub async fn update_tag(&self, actor: &Actor, id: Uuid, name: String) -> ServiceResult<Tag> {
        actor.require_staff()?;
        let name = validate_name(name)?;
        let uow = self.ctx.begin().await?;

        let mut tag = uow
            .tags()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Tag", id))?;

        let taken = uow.tags().find_by_name(&name).await?;
        if taken.is_some_and(|other| other.id != id) {
            return Err(DomainError::duplicate("name", name));
        }
        tag.name = name;
        let tag = uow.tags().save(tag).await?;
        uow.commit().await?;

        info!(tag_id = %id, name = %tag.name, "Tag renamed");
        Ok(tag)
    }

    #[instrument(skip(self), fields(user_id = %actor.user_id))]
    pub async fn delete_tag(&self, actor: &Actor, id: Uuid) -> ServiceResult<()> {
        actor.require_staff()?;
        let uow = self.ctx.begin().await?;

        if uow.tags().find_by_id(id).await?.is_none() {
            return Err(DomainError::not_found("Tag", id));
        }
        uow.tags().delete(id).await?;
        uow.commit().await?;

        info!(tag_id = %id, "Tag deleted");
        Ok(())
    }
}

pub(crate) fn validate_name(name: String) -> ServiceResult<String> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(DomainError::validation("name", "This field may not be blank."));
    }
    if name.chars().count() > MAX_TAG_NAME_LENGTH {
        return Err(DomainError::validation(
            "name",
            format!("Ensure this field has no more than {MAX_TAG_NAME_LENGTH} characters."),
        ));
    }
    Ok(name)
}
