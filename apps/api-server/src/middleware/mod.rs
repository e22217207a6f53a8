//! Middleware and request extractors.

pub mod auth;
pub mod error;
pub mod rate_limit;
pub mod validated;
