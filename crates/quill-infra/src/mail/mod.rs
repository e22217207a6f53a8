//! Mail delivery implementations.

mod log;

pub use log::LogMailer;
