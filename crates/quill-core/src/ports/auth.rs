//! Authentication and authorization ports.

use uuid::Uuid;

/// Claims carried by an access token. Staff users carry the `staff` role.
#[derive(Debug, Clone)]
pub struct TokenClaims {
    pub user_id: Uuid,
    pub email: String,
    pub roles: Vec<String>,
    pub exp: i64,
}

/// Token service trait for issuing and checking bearer tokens.
pub trait TokenService: Send + Sync {
    /// Generate an access token for a user.
    fn generate_token(
        &self,
        user_id: Uuid,
        email: &str,
        roles: Vec<String>,
    ) -> Result<String, AuthError>;

    /// Validate and decode a token.
    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError>;

    /// Lifetime of issued tokens, in seconds.
    fn expiration_seconds(&self) -> i64;

    /// Issue a short-lived password reset token. It is bound to the current
    /// `password_hash`, so it stops working once the password changes.
    fn generate_reset_token(
        &self,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<String, AuthError>;

    /// Check a reset token against the user it was issued for.
    fn validate_reset_token(
        &self,
        token: &str,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<(), AuthError>;
}

/// Password hashing service.
pub trait PasswordService: Send + Sync {
    /// Hash a plain text password.
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// Verify a password against a hash.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;
}

/// Failures while issuing or checking credentials.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Missing authorization header")]
    MissingAuth,

    #[error("Hashing error: {0}")]
    HashingError(String),
}
