//! Application services.
//!
//! Each service borrows a [`ServiceContext`] and runs every operation in a
//! single unit of work: open it, do the work (dispatching domain events as
//! it goes), commit. An error returned before the commit drops the unit of
//! work and rolls everything back.

mod comment;
mod image;
mod post;
mod tag;
mod user;
mod vote;

use std::sync::Arc;

use uuid::Uuid;

use crate::error::DomainError;
use crate::events::EventDispatcher;
use crate::ports::{AuthError, Mailer, PasswordService, Store, TokenService, UnitOfWork};

pub use comment::{CommentService, CommentView};
pub use image::ImageService;
pub use post::{NewPost, PostChanges, PostDetailView, PostService, PostSummaryView};
pub use tag::TagService;
pub use user::{
    AccountView, ProfileChanges, RESET_LINK_PATH, Registration, UserService, encode_pk,
};
pub use vote::{VoteOutcome, VoteService};

pub type ServiceResult<T> = Result<T, DomainError>;

/// The authenticated caller of a service operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub is_staff: bool,
}

impl Actor {
    pub fn user(user_id: Uuid) -> Self {
        Self {
            user_id,
            is_staff: false,
        }
    }

    pub fn staff(user_id: Uuid) -> Self {
        Self {
            user_id,
            is_staff: true,
        }
    }

    pub fn require_staff(&self) -> ServiceResult<()> {
        if self.is_staff {
            Ok(())
        } else {
            Err(DomainError::forbidden(
                "You do not have permission to perform this action.",
            ))
        }
    }

    /// Fails unless the actor is the owner of the resource.
    pub fn require_owner(&self, owner_id: Uuid) -> ServiceResult<()> {
        if self.user_id == owner_id {
            Ok(())
        } else {
            Err(DomainError::forbidden(
                "You do not have permission to perform this action.",
            ))
        }
    }
}

/// What the password reset flow needs beyond the store.
#[derive(Clone)]
pub(crate) struct AccountRecovery {
    pub tokens: Arc<dyn TokenService>,
    pub mailer: Arc<dyn Mailer>,
}

/// Dependencies shared by all services.
#[derive(Clone)]
pub struct ServiceContext {
    store: Arc<dyn Store>,
    events: EventDispatcher,
    passwords: Arc<dyn PasswordService>,
    recovery: Option<AccountRecovery>,
}

impl ServiceContext {
    /// Context with the standard event handlers registered.
    pub fn new(store: Arc<dyn Store>, passwords: Arc<dyn PasswordService>) -> Self {
        Self {
            store,
            events: EventDispatcher::standard(),
            passwords,
            recovery: None,
        }
    }

    pub fn with_events(mut self, events: EventDispatcher) -> Self {
        self.events = events;
        self
    }

    /// Enable password reset by mail.
    pub fn with_account_recovery(
        mut self,
        tokens: Arc<dyn TokenService>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        self.recovery = Some(AccountRecovery { tokens, mailer });
        self
    }

    pub fn events(&self) -> &EventDispatcher {
        &self.events
    }

    pub fn passwords(&self) -> &dyn PasswordService {
        self.passwords.as_ref()
    }

    pub(crate) fn recovery(&self) -> ServiceResult<&AccountRecovery> {
        self.recovery
            .as_ref()
            .ok_or_else(|| DomainError::Internal("account recovery is not configured".into()))
    }

    pub(crate) async fn begin(&self) -> ServiceResult<Box<dyn UnitOfWork>> {
        Ok(self.store.begin().await?)
    }

    pub fn votes(&self) -> VoteService<'_> {
        VoteService::new(self)
    }

    pub fn posts(&self) -> PostService<'_> {
        PostService::new(self)
    }

    pub fn comments(&self) -> CommentService<'_> {
        CommentService::new(self)
    }

    pub fn tags(&self) -> TagService<'_> {
        TagService::new(self)
    }

    pub fn images(&self) -> ImageService<'_> {
        ImageService::new(self)
    }

    pub fn users(&self) -> UserService<'_> {
        UserService::new(self)
    }
}

impl From<AuthError> for DomainError {
    fn from(err: AuthError) -> Self {
        DomainError::Internal(err.to_string())
    }
}

/// Message used when a referenced row in a request body does not exist.
pub(crate) fn invalid_pk(id: Uuid) -> String {
    format!("Invalid pk \"{id}\" - object does not exist.")
}
