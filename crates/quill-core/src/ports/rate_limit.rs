//! Rate limiting port for write requests.

use async_trait::async_trait;
use std::time::Duration;

/// Per-client rate limiter.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Record one request for `key` (usually the client address) and report
    /// whether it may proceed.
    async fn check(&self, key: &str) -> Result<RateLimitDecision, RateLimitError>;
}

/// Outcome of a rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    /// Rejected; the client may retry after the given delay.
    Limited { retry_after: Duration },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allowed)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("Backend error: {0}")]
    Backend(String),
}
