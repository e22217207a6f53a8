//! Domain entities - the core business objects.

mod comment;
mod post;
mod query;
mod slug;
mod user;
mod vote;

pub use comment::{Comment, MAX_COMMENT_LENGTH};
pub use post::{Post, PostImage, Tag, image_file_path};
pub use query::{PostQuery, PostSort, SortDirection, SortField};
pub use slug::slugify;
pub use user::{MIN_PASSWORD_LENGTH, User, UserProfile, normalize_email};
pub use vote::{Vote, VoteTally, VoteType};
