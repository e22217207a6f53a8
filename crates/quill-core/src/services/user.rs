//! User service
//!
//! Registration, credential checks and profile maintenance. Token issuing is
//! left to the caller; this service only establishes who the user is.

use chrono::NaiveDate;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::domain::{MIN_PASSWORD_LENGTH, User, UserProfile, normalize_email};
use crate::error::DomainError;
use crate::ports::OutgoingMail;

use super::{Actor, ServiceContext, ServiceResult};

/// Path of the reset endpoint; the encoded key and token are appended.
pub const RESET_LINK_PATH: &str = "/api/users/reset-password";

/// A user and their profile.
#[derive(Debug, Clone)]
pub struct AccountView {
    pub user: User,
    pub profile: UserProfile,
}

#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub email: String,
    pub username: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub profile_image: Option<String>,
}

/// Partial profile update. Email and username are immutable and are only
/// carried so an attempt to change them can be rejected.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub profile_image: Option<String>,
}

pub struct UserService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> UserService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    #[instrument(skip(self, registration), fields(username = %registration.username))]
    pub async fn register(&self, registration: Registration) -> ServiceResult<AccountView> {
        let Registration {
            email,
            username,
            password,
            first_name,
            last_name,
            date_of_birth,
            profile_image,
        } = registration;

        let email = normalize_email(&email);
        if email.is_empty() {
            return Err(DomainError::validation("email", "This field may not be blank."));
        }
        if username.trim().is_empty() {
            return Err(DomainError::validation("username", "This field may not be blank."));
        }
        validate_password(&password)?;

        let uow = self.ctx.begin().await?;

        if uow.users().find_by_email(&email).await?.is_some() {
            return Err(DomainError::duplicate("email", email));
        }
        if uow.users().find_by_username(&username).await?.is_some() {
            return Err(DomainError::duplicate("username", username));
        }

        let password_hash = self.ctx.passwords().hash(&password)?;
        let user = uow
            .users()
            .save(User::new(&email, username, password_hash))
            .await?;

        let mut profile = UserProfile::new(user.id);
        profile.first_name = first_name;
        profile.last_name = last_name;
        profile.date_of_birth = date_of_birth;
        profile.profile_image = profile_image;
        let profile = uow.profiles().save(profile).await?;

        uow.commit().await?;

        info!(user_id = %user.id, "User registered");
        Ok(AccountView { user, profile })
    }

    /// Check an email/password pair. Every failure looks the same to the caller.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, email: &str, password: &str) -> ServiceResult<User> {
        if password.is_empty() {
            return Err(DomainError::InvalidCredentials);
        }

        let uow = self.ctx.begin().await?;
        let user = uow
            .users()
            .find_by_email(&normalize_email(email))
            .await?
            .filter(|user| user.is_active)
            .ok_or(DomainError::InvalidCredentials)?;

        if !self.ctx.passwords().verify(password, &user.password_hash)? {
            warn!(user_id = %user.id, "Password mismatch");
            return Err(DomainError::InvalidCredentials);
        }

        Ok(user)
    }

    pub async fn get_profile(&self, actor: &Actor) -> ServiceResult<AccountView> {
        let uow = self.ctx.begin().await?;
        let user = uow
            .users()
            .find_by_id(actor.user_id)
            .await?
            .ok_or(DomainError::Unauthorized)?;
        let profile = uow
            .profiles()
            .find_by_id(user.id)
            .await?
            .unwrap_or_else(|| UserProfile::new(user.id));
        Ok(AccountView { user, profile })
    }

    #[instrument(skip(self, changes), fields(user_id = %actor.user_id))]
    pub async fn update_profile(
        &self,
        actor: &Actor,
        changes: ProfileChanges,
    ) -> ServiceResult<AccountView> {
        if changes.email.is_some() {
            return Err(DomainError::validation(
                "email",
                "Email field is not allowed to be updated.",
            ));
        }
        if changes.username.is_some() {
            return Err(DomainError::validation(
                "username",
                "Username field is not allowed to be updated.",
            ));
        }

        let uow = self.ctx.begin().await?;

        let mut user = uow
            .users()
            .find_by_id(actor.user_id)
            .await?
            .ok_or(DomainError::Unauthorized)?;

        if let Some(password) = changes.password {
            validate_password(&password)?;
            user.password_hash = self.ctx.passwords().hash(&password)?;
            user = uow.users().save(user).await?;
        }

        let mut profile = uow
            .profiles()
            .find_by_id(user.id)
            .await?
            .unwrap_or_else(|| UserProfile::new(user.id));
        if let Some(first_name) = changes.first_name {
            profile.first_name = Some(first_name);
        }
        if let Some(last_name) = changes.last_name {
            profile.last_name = Some(last_name);
        }
        if let Some(date_of_birth) = changes.date_of_birth {
            profile.date_of_birth = Some(date_of_birth);
        }
        if let Some(profile_image) = changes.profile_image {
            profile.profile_image = Some(profile_image);
        }
        let profile = uow.profiles().save(profile).await?;

        uow.commit().await?;

        info!(user_id = %user.id, "Profile updated");
        Ok(AccountView { user, profile })
    }

    /// Mail a password reset link to the owner of `email`.
    ///
    /// Unknown or inactive addresses succeed silently so the endpoint cannot
    /// be used to discover accounts.
    #[instrument(skip(self))]
    pub async fn request_password_reset(&self, email: &str) -> ServiceResult<()> {
        let recovery = self.ctx.recovery()?;
        let email = normalize_email(email);

        let uow = self.ctx.begin().await?;
        let user = uow
            .users()
            .find_by_email(&email)
            .await?
            .filter(|user| user.is_active);
        drop(uow);

        let Some(user) = user else {
            debug!("Password reset requested for unknown address");
            return Ok(());
        };

        let token = recovery
            .tokens
            .generate_reset_token(user.id, &user.password_hash)?;
        let link = format!("{RESET_LINK_PATH}/{}/{token}", encode_pk(user.id));

        recovery
            .mailer
            .send(OutgoingMail {
                to: user.email.clone(),
                subject: "Reset your password".to_string(),
                body: format!(
                    "Hi {},\n\nUse the link below to choose a new password:\n\n{link}\n",
                    user.username
                ),
            })
            .await
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        info!(user_id = %user.id, "Password reset link sent");
        Ok(())
    }

    /// Set a new password using a link issued by [`Self::request_password_reset`].
    #[instrument(skip(self, token, new_password))]
    pub async fn reset_password(
        &self,
        encoded_pk: &str,
        token: &str,
        new_password: &str,
    ) -> ServiceResult<()> {
        let recovery = self.ctx.recovery()?;
        validate_password(new_password)?;
        let user_id = decode_pk(encoded_pk).ok_or_else(invalid_reset_link)?;

        let uow = self.ctx.begin().await?;
        let mut user = uow
            .users()
            .find_by_id(user_id)
            .await?
            .filter(|user| user.is_active)
            .ok_or_else(invalid_reset_link)?;

        if let Err(err) = recovery
            .tokens
            .validate_reset_token(token, user.id, &user.password_hash)
        {
            warn!(user_id = %user.id, error = %err, "Rejected password reset token");
            return Err(invalid_reset_link());
        }

        user.password_hash = self.ctx.passwords().hash(new_password)?;
        uow.users().save(user).await?;
        uow.commit().await?;

        info!(user_id = %user_id, "Password reset");
        Ok(())
    }

    /// Make sure a staff account with this email exists, creating it (or
    /// promoting an existing user) if needed.
    #[instrument(skip(self, password))]
    pub async fn ensure_staff_user(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> ServiceResult<User> {
        validate_password(password)?;
        let email = normalize_email(email);
        let uow = self.ctx.begin().await?;

        let user = match uow.users().find_by_email(&email).await? {
            Some(user) if user.is_staff => return Ok(user),
            Some(mut user) => {
                user.is_staff = true;
                uow.users().save(user).await?
            }
            None => {
                let password_hash = self.ctx.passwords().hash(password)?;
                let mut user = User::new(&email, username.to_string(), password_hash);
                user.is_staff = true;
                let user = uow.users().save(user).await?;
                uow.profiles().save(UserProfile::new(user.id)).await?;
                user
            }
        };

        uow.commit().await?;

        info!(user_id = %user.id, "Staff account ready");
        Ok(user)
    }
}

fn validate_password(password: &str) -> ServiceResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(DomainError::validation(
            "password",
            format!("Ensure this field has at least {MIN_PASSWORD_LENGTH} characters."),
        ));
    }
    Ok(())
}

/// URL-safe form of a user id used in reset links.
pub fn encode_pk(id: Uuid) -> String {
    id.simple().to_string()
}

fn decode_pk(encoded: &str) -> Option<Uuid> {
    Uuid::try_parse(encoded).ok()
}

fn invalid_reset_link() -> DomainError {
    DomainError::validation("token", "The reset link is invalid or has expired.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_minimum_length() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
    }

    #[test]
    fn test_encoded_pk_decodes_back() {
        let id = Uuid::new_v4();
        let encoded = encode_pk(id);

        assert!(!encoded.contains('-'));
        assert_eq!(decode_pk(&encoded), Some(id));
        assert_eq!(decode_pk("not-a-key"), None);
    }
}
