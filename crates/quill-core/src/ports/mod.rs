//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod mail;
mod rate_limit;
mod repository;
mod unit_of_work;

pub use auth::{AuthError, PasswordService, TokenClaims, TokenService};
pub use mail::{MailError, Mailer, OutgoingMail};
pub use rate_limit::{RateLimitDecision, RateLimitError, RateLimiter};
pub use repository::{
    BaseRepository, CommentRepository, ImageRepository, PostRepository, ProfileRepository,
    TagRepository, UserRepository, VoteRepository,
};
pub use unit_of_work::{Store, UnitOfWork};
