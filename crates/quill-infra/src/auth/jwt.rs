//! JWT bearer tokens.

use chrono::{TimeDelta, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use quill_core::ports::{AuthError, TokenClaims, TokenService};

const DEFAULT_SECRET: &str = "change-me-in-production";

/// `purpose` claim of password reset tokens.
const RESET_PURPOSE: &str = "password_reset";

/// Signing settings for issued tokens.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_hours: i64,
    pub issuer: String,
    /// Lifetime of password reset tokens.
    pub reset_expiration_minutes: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_SECRET.to_string(),
            expiration_hours: 24,
            issuer: "quill-api".to_string(),
            reset_expiration_minutes: 60,
        }
    }
}

impl JwtConfig {
    /// Read `JWT_SECRET`, `JWT_EXPIRATION_HOURS`, `JWT_ISSUER` and
    /// `JWT_RESET_EXPIRATION_MINUTES`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let secret = std::env::var("JWT_SECRET").unwrap_or(defaults.secret);

        if secret == DEFAULT_SECRET {
            let is_production = std::env::var("RUST_ENV")
                .map(|v| v == "production" || v == "prod")
                .unwrap_or(false);

            if is_production {
                tracing::error!(
                    "SECURITY: Using default JWT secret in production! Set JWT_SECRET environment variable."
                );
            } else {
                tracing::warn!("Using default JWT secret. Set JWT_SECRET for production use.");
            }
        }

        Self {
            secret,
            expiration_hours: std::env::var("JWT_EXPIRATION_HOURS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.expiration_hours),
            issuer: std::env::var("JWT_ISSUER").unwrap_or(defaults.issuer),
            reset_expiration_minutes: std::env::var("JWT_RESET_EXPIRATION_MINUTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.reset_expiration_minutes),
        }
    }
}

/// Wire form of the claims.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    email: String,
    roles: Vec<String>,
    exp: i64,
    iat: i64,
    iss: String,
}

/// Wire form of a password reset token.
#[derive(Debug, Serialize, Deserialize)]
struct ResetClaims {
    sub: String,
    purpose: String,
    exp: i64,
    iat: i64,
    iss: String,
}

/// HMAC-signed JWT token service.
pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    config: JwtConfig,
}

impl JwtTokenService {
    pub fn new(config: JwtConfig) -> Self {
        let mut validation = Validation::default();
        validation.set_issuer(&[&config.issuer]);

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            config,
        }
    }

    /// Reset tokens are signed with the secret plus the current password
    /// hash, so changing the password revokes every outstanding token.
    fn reset_key(&self, password_hash: &str) -> Vec<u8> {
        [self.config.secret.as_bytes(), password_hash.as_bytes()].concat()
    }
}

fn decode_error(e: jsonwebtoken::errors::Error) -> AuthError {
    match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken(e.to_string()),
    }
}

impl TokenService for JwtTokenService {
    fn generate_token(
        &self,
        user_id: Uuid,
        email: &str,
        roles: Vec<String>,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            roles,
            exp: (now + TimeDelta::hours(self.config.expiration_hours)).timestamp(),
            iat: now.timestamp(),
            iss: self.config.issuer.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(decode_error)?;

        let user_id =
            Uuid::parse_str(&data.claims.sub).map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        Ok(TokenClaims {
            user_id,
            email: data.claims.email,
            roles: data.claims.roles,
            exp: data.claims.exp,
        })
    }

    fn expiration_seconds(&self) -> i64 {
        self.config.expiration_hours * 3600
    }

    fn generate_reset_token(
        &self,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = ResetClaims {
            sub: user_id.to_string(),
            purpose: RESET_PURPOSE.to_string(),
            exp: (now + TimeDelta::minutes(self.config.reset_expiration_minutes)).timestamp(),
            iat: now.timestamp(),
            iss: self.config.issuer.clone(),
        };

        let key = EncodingKey::from_secret(&self.reset_key(password_hash));
        encode(&Header::default(), &claims, &key)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    fn validate_reset_token(
        &self,
        token: &str,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<(), AuthError> {
        let key = DecodingKey::from_secret(&self.reset_key(password_hash));
        let claims = decode::<ResetClaims>(token, &key, &self.validation)
            .map_err(decode_error)?
            .claims;

        if claims.purpose != RESET_PURPOSE || claims.sub != user_id.to_string() {
            return Err(AuthError::InvalidToken("token was issued for another purpose".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(issuer: &str, expiration_hours: i64) -> JwtTokenService {
        JwtTokenService::new(JwtConfig {
            secret: "test-secret-key".to_string(),
            expiration_hours,
            issuer: issuer.to_string(),
            ..JwtConfig::default()
        })
    }

    #[test]
    fn test_staff_role_survives_round_trip() {
        let service = service("quill-test", 1);
        let user_id = Uuid::new_v4();

        let token = service
            .generate_token(
                user_id,
                "editor@example.com",
                vec!["user".to_string(), "staff".to_string()],
            )
            .unwrap();
        let claims = service.validate_token(&token).unwrap();

        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.email, "editor@example.com");
        assert!(claims.roles.iter().any(|r| r == "staff"));
    }

    #[test]
    fn test_garbage_token_is_invalid() {
        let result = service("quill-test", 1).validate_token("not-a-jwt");
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_expired_token_is_reported() {
        let service = service("quill-test", -2);
        let token = service
            .generate_token(Uuid::new_v4(), "old@example.com", vec![])
            .unwrap();

        assert!(matches!(
            service.validate_token(&token),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn test_foreign_issuer_is_rejected() {
        let token = service("someone-else", 1)
            .generate_token(Uuid::new_v4(), "a@example.com", vec![])
            .unwrap();

        assert!(service("quill-test", 1).validate_token(&token).is_err());
    }

    #[test]
    fn test_expiration_seconds() {
        assert_eq!(service("quill-test", 24).expiration_seconds(), 86_400);
    }

    #[test]
    fn test_reset_token_is_bound_to_user_and_password() {
        let service = service("quill-test", 1);
        let user_id = Uuid::new_v4();
        let token = service.generate_reset_token(user_id, "hash-v1").unwrap();

        assert!(service.validate_reset_token(&token, user_id, "hash-v1").is_ok());
        assert!(service.validate_reset_token(&token, user_id, "hash-v2").is_err());
        assert!(
            service
                .validate_reset_token(&token, Uuid::new_v4(), "hash-v1")
                .is_err()
        );
    }

    #[test]
    fn test_access_token_is_not_a_reset_token() {
        let service = service("quill-test", 1);
        let user_id = Uuid::new_v4();
        let access = service
            .generate_token(user_id, "a@example.com", vec![])
            .unwrap();

        assert!(service.validate_reset_token(&access, user_id, "").is_err());
    }

    #[test]
    fn test_expired_reset_token_is_reported() {
        let service = JwtTokenService::new(JwtConfig {
            secret: "test-secret-key".to_string(),
            reset_expiration_minutes: -5,
            ..JwtConfig::default()
        });
        let user_id = Uuid::new_v4();
        let token = service.generate_reset_token(user_id, "hash").unwrap();

        assert!(matches!(
            service.validate_reset_token(&token, user_id, "hash"),
            Err(AuthError::TokenExpired)
        ));
    }
}
