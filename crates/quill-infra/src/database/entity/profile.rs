//! User profile entity. Keyed by the owning user's id.

use sea_orm::{NotSet, Set};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user_profiles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: Uuid,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<Date>,
    pub profile_image: Option<String>,
    pub points: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for quill_core::domain::UserProfile {
    fn from(model: Model) -> Self {
        Self {
            user_id: model.user_id,
            first_name: model.first_name,
            last_name: model.last_name,
            date_of_birth: model.date_of_birth,
            profile_image: model.profile_image,
            points: model.points,
        }
    }
}

/// `points` is left unset: it only moves through atomic adjustments, and the
/// column default covers inserts.
impl From<quill_core::domain::UserProfile> for ActiveModel {
    fn from(profile: quill_core::domain::UserProfile) -> Self {
        Self {
            user_id: Set(profile.user_id),
            first_name: Set(profile.first_name),
            last_name: Set(profile.last_name),
            date_of_birth: Set(profile.date_of_birth),
            profile_image: Set(profile.profile_image),
            points: NotSet,
        }
    }
}
