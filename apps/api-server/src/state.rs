//! Application state - shared across all handlers.

use std::sync::Arc;

use quill_core::ports::{RateLimiter, Store, TokenService};
use quill_core::services::ServiceContext;
use quill_infra::{
    Argon2PasswordService, DatabaseConfig, InMemoryStore, JwtTokenService, LogMailer,
};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub services: ServiceContext,
    pub tokens: Arc<dyn TokenService>,
    /// `None` when write routes are not rate limited.
    pub rate_limiter: Option<Arc<dyn RateLimiter>>,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Self {
        let store = open_store(config.database.as_ref()).await;
        let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::new(config.jwt.clone()));
        let services = ServiceContext::new(store, Arc::new(Argon2PasswordService::new()))
            .with_account_recovery(tokens.clone(), Arc::new(LogMailer::new()));

        #[cfg(feature = "rate-limit")]
        let rate_limiter = config.rate_limit.clone().map(|limits| {
            Arc::new(quill_infra::InMemoryRateLimiter::new(limits)) as Arc<dyn RateLimiter>
        });

        #[cfg(not(feature = "rate-limit"))]
        let rate_limiter = None;

        tracing::info!(
            rate_limited = rate_limiter.is_some(),
            "Application state initialized"
        );

        Self {
            services,
            tokens,
            rate_limiter,
        }
    }

    /// Create or promote the configured bootstrap staff account.
    pub async fn bootstrap_admin(&self, config: &AppConfig) -> anyhow::Result<()> {
        let Some(admin) = &config.bootstrap_admin else {
            return Ok(());
        };

        let user = self
            .services
            .users()
            .ensure_staff_user(&admin.email, &admin.username, &admin.password)
            .await?;
        tracing::info!(user_id = %user.id, "Bootstrap staff account ready");
        Ok(())
    }
}

#[cfg(feature = "postgres")]
async fn open_store(db_config: Option<&DatabaseConfig>) -> Arc<dyn Store> {
    let Some(config) = db_config else {
        tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
        return Arc::new(InMemoryStore::new());
    };

    match config.connect().await {
        Ok(conn) => Arc::new(quill_infra::PostgresStore::new(conn)),
        Err(e) => {
            tracing::error!(
                error = %e,
                "Failed to connect to database. Using in-memory fallback."
            );
            Arc::new(InMemoryStore::new())
        }
    }
}

#[cfg(not(feature = "postgres"))]
async fn open_store(db_config: Option<&DatabaseConfig>) -> Arc<dyn Store> {
    if db_config.is_some() {
        tracing::warn!("Built without the postgres feature; DATABASE_URL is ignored.");
    }
    tracing::info!("Using in-memory store");
    Arc::new(InMemoryStore::new())
}
