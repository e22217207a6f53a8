use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Shortest password accepted at account creation and password change.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// User entity - an account that can author comments, vote and (as staff) publish posts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub is_staff: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new regular user with generated ID and timestamp.
    ///
    /// The email is normalized with [`normalize_email`].
    pub fn new(email: &str, username: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: normalize_email(email),
            username,
            password_hash,
            is_staff: false,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    /// Roles carried in issued tokens.
    pub fn roles(&self) -> Vec<String> {
        let mut roles = vec!["user".to_string()];
        if self.is_staff {
            roles.push("staff".to_string());
        }
        roles
    }
}

/// Lower-case the domain part of an email address, leaving the local part intact.
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

/// Profile attached one-to-one to a [`User`].
///
/// `points` is denormalized: it is only ever changed by the points aggregator
/// reacting to votes on the user's comments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub profile_image: Option<String>,
    pub points: i64,
}

impl UserProfile {
    /// Empty profile with zero points.
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            first_name: None,
            last_name: None,
            date_of_birth: None,
            profile_image: None,
            points: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email_lowercases_domain_only() {
        let cases = [
            ("test1@EXAMPLE.com", "test1@example.com"),
            ("Test2@Example.com", "Test2@example.com"),
            ("TEST3@EXAMPLE.COM", "TEST3@example.com"),
            ("test4@example.COM", "test4@example.com"),
        ];
        for (raw, expected) in cases {
            assert_eq!(normalize_email(raw), expected);
        }
    }

    #[test]
    fn test_roles_include_staff_flag() {
        let mut user = User::new("a@b.io", "alice".to_string(), "hash".to_string());
        assert_eq!(user.roles(), vec!["user".to_string()]);

        user.is_staff = true;
        assert!(user.roles().contains(&"staff".to_string()));
    }
}
