//! # Quill Shared
//!
//! Request and response bodies of the HTTP API, kept free of server
//! dependencies so clients can reuse them.

pub mod dto;
pub mod response;

pub use response::{ErrorResponse, FieldErrors, ListResponse};
