//! Generic SeaORM helpers shared by every table.
//!
//! They take any [`ConnectionTrait`] so they run equally on a pooled
//! connection or inside a transaction.

use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ConnectionTrait, DbErr, EntityTrait, IntoActiveModel,
    PrimaryKeyTrait, SqlErr,
};

use quill_core::error::RepoError;

pub(crate) fn query_err(err: DbErr) -> RepoError {
    match err {
        DbErr::Conn(e) => RepoError::Connection(e.to_string()),
        other => RepoError::Query(other.to_string()),
    }
}

/// Map write failures, surfacing unique and foreign-key violations as
/// [`RepoError::Constraint`].
pub(crate) fn write_err(err: DbErr) -> RepoError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => RepoError::Constraint(detail),
        Some(SqlErr::ForeignKeyConstraintViolation(detail)) => RepoError::Constraint(detail),
        _ => query_err(err),
    }
}

pub(crate) async fn find_by_id<E, T, K, C>(db: &C, id: K) -> Result<Option<T>, RepoError>
where
    E: EntityTrait,
    T: From<E::Model>,
    K: Into<<E::PrimaryKey as PrimaryKeyTrait>::ValueType>,
    C: ConnectionTrait,
{
    let model = E::find_by_id(id).one(db).await.map_err(query_err)?;
    Ok(model.map(Into::into))
}

/// Update the row with the entity's primary key, inserting it when no such
/// row exists yet.
pub(crate) async fn upsert<E, T, C>(db: &C, entity: T) -> Result<T, RepoError>
where
    E: EntityTrait,
    E::Model: IntoActiveModel<E::ActiveModel>,
    E::ActiveModel: ActiveModelTrait<Entity = E> + ActiveModelBehavior + From<T> + Send,
    T: From<E::Model>,
    C: ConnectionTrait,
{
    let active: E::ActiveModel = entity.into();
    let model = match active.clone().update(db).await {
        Ok(model) => model,
        Err(DbErr::RecordNotUpdated) => active.insert(db).await.map_err(write_err)?,
        Err(e) => return Err(write_err(e)),
    };
    Ok(model.into())
}

pub(crate) async fn delete_by_id<E, K, C>(db: &C, id: K) -> Result<(), RepoError>
where
    E: EntityTrait,
    K: Into<<E::PrimaryKey as PrimaryKeyTrait>::ValueType>,
    C: ConnectionTrait,
{
    let result = E::delete_by_id(id).exec(db).await.map_err(write_err)?;

    if result.rows_affected == 0 {
        return Err(RepoError::NotFound);
    }

    Ok(())
}
