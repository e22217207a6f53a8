//! # Quill Core
//!
//! The domain layer of the Quill blogging backend.
//! This crate contains entities, ports, domain events and the application
//! services that drive them. It has no infrastructure dependencies; storage,
//! hashing and token issuance are reached through the traits in [`ports`].

pub mod domain;
pub mod error;
pub mod events;
pub mod ports;
pub mod services;

pub use error::DomainError;
