use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Direction of a vote on a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteType {
    Upvote,
    Downvote,
}

impl VoteType {
    /// Points the comment author gains when a vote of this type is cast.
    pub fn points_delta(self) -> i64 {
        match self {
            VoteType::Upvote => 1,
            VoteType::Downvote => -1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VoteType::Upvote => "upvote",
            VoteType::Downvote => "downvote",
        }
    }
}

impl fmt::Display for VoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoteType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upvote" => Ok(VoteType::Upvote),
            "downvote" => Ok(VoteType::Downvote),
            other => Err(DomainError::validation(
                "vote_type",
                format!("\"{other}\" is not a valid choice"),
            )),
        }
    }
}

/// A single user's vote on a comment. At most one exists per (user, comment).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub id: Uuid,
    pub user_id: Uuid,
    pub comment_id: Uuid,
    pub vote_type: VoteType,
    pub created_at: DateTime<Utc>,
}

impl Vote {
    pub fn new(user_id: Uuid, comment_id: Uuid, vote_type: VoteType) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            comment_id,
            vote_type,
            created_at: Utc::now(),
        }
    }
}

/// Live vote counts for one comment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoteTally {
    pub upvotes: u64,
    pub downvotes: u64,
}

impl VoteTally {
    /// Net contribution of these votes to the author's points.
    pub fn score(&self) -> i64 {
        self.upvotes as i64 - self.downvotes as i64
    }
}
