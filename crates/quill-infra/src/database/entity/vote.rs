//! Vote entity for SeaORM. `(user_id, comment_id)` carries a unique index.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use quill_core::domain::VoteType;

/// Stored form of [`VoteType`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum VoteKind {
    #[sea_orm(string_value = "upvote")]
    Upvote,
    #[sea_orm(string_value = "downvote")]
    Downvote,
}

impl From<VoteType> for VoteKind {
    fn from(vote_type: VoteType) -> Self {
        match vote_type {
            VoteType::Upvote => VoteKind::Upvote,
            VoteType::Downvote => VoteKind::Downvote,
        }
    }
}

impl From<VoteKind> for VoteType {
    fn from(kind: VoteKind) -> Self {
        match kind {
            VoteKind::Upvote => VoteType::Upvote,
            VoteKind::Downvote => VoteType::Downvote,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "votes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub comment_id: Uuid,
    pub vote_type: VoteKind,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::comment::Entity",
        from = "Column::CommentId",
        to = "super::comment::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Comment,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for quill_core::domain::Vote {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            comment_id: model.comment_id,
            vote_type: model.vote_type.into(),
            created_at: model.created_at.into(),
        }
    }
}

impl From<quill_core::domain::Vote> for ActiveModel {
    fn from(vote: quill_core::domain::Vote) -> Self {
        Self {
            id: Set(vote.id),
            user_id: Set(vote.user_id),
            comment_id: Set(vote.comment_id),
            vote_type: Set(vote.vote_type.into()),
            created_at: Set(vote.created_at.into()),
        }
    }
}
