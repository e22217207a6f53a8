//! # Quill API Server
//!
//! The main entry point for the Actix-web HTTP server.

use actix_web::{App, HttpServer, web};
use anyhow::Context;
use tracing_actix_web::TracingLogger;

mod config;
mod handlers;
mod logging;
mod middleware;
mod observability;
mod state;

use config::AppConfig;
use middleware::rate_limit::RateLimitMiddleware;
use observability::RequestIdMiddleware;
use state::AppState;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    logging::init(logging::LogFormat::from_env()).context("failed to install log subscriber")?;

    let config = AppConfig::from_env();

    tracing::info!(host = %config.host, port = config.port, "Starting Quill API Server");

    let state = AppState::new(&config).await;
    state
        .bootstrap_admin(&config)
        .await
        .context("failed to create bootstrap staff account")?;

    HttpServer::new(move || {
        App::new()
            .wrap(RateLimitMiddleware::new(state.rate_limiter.clone()))
            .wrap(RequestIdMiddleware)
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(state.clone()))
            .configure(handlers::configure_routes)
    })
    .bind((config.host.as_str(), config.port))
    .with_context(|| format!("failed to bind {}:{}", config.host, config.port))?
    .run()
    .await?;

    Ok(())
}
