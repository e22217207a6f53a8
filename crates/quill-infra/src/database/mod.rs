//! Store implementations: in-memory and PostgreSQL.

mod connections;
mod memory;

#[cfg(feature = "postgres")]
mod postgres_base;
#[cfg(feature = "postgres")]
mod postgres_repo;

#[cfg(feature = "postgres")]
pub mod entity;

pub use connections::DatabaseConfig;
pub use memory::{InMemoryStore, InMemoryUnitOfWork};

#[cfg(feature = "postgres")]
pub use postgres_repo::{PostgresStore, PostgresUnitOfWork};
