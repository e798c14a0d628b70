//! Academy API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod auth;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use std::time::Duration;

use academy_application::RateLimitService;
use academy_core::AppError;
use axum::Router;
use tracing::{info, warn};

use crate::api_config::{ApiConfig, StorageBackend};

const RATE_LIMIT_CLEANUP_INTERVAL: Duration = Duration::from_secs(15 * 60);

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    api_config::init_tracing();

    let config = ApiConfig::load()?;

    let pool = match config.database_url.as_deref() {
        Some(database_url) => Some(api_services::connect_and_migrate(database_url).await?),
        None => None,
    };

    if config.migrate_only {
        if pool.is_none() {
            return Err(AppError::Validation(
                "DATABASE_URL is required to run migrations".to_owned(),
            ));
        }
        info!("database migrations applied successfully");
        return Ok(());
    }

    let app_state = api_services::build_app_state(&config, pool.clone()).await?;
    api_services::seed_staff_accounts(app_state.user_repository.as_ref(), &config).await?;
    spawn_rate_limit_cleanup(app_state.rate_limit_service.clone());

    let app: Router = match (config.storage_backend, pool) {
        (StorageBackend::Postgres, Some(pool)) => {
            let session_layer =
                api_services::build_postgres_session_layer(pool, config.cookie_secure).await?;
            api_router::build_router(app_state, &config.frontend_url, session_layer)?
        }
        _ => {
            let session_layer = api_services::build_memory_session_layer(config.cookie_secure);
            api_router::build_router(app_state, &config.frontend_url, session_layer)?
        }
    };

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, storage = ?config.storage_backend, "academy-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}

fn spawn_rate_limit_cleanup(rate_limit_service: RateLimitService) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(RATE_LIMIT_CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            match rate_limit_service.cleanup().await {
                Ok(removed) if removed > 0 => info!(removed, "expired rate limit windows removed"),
                Ok(_) => {}
                Err(error) => warn!(error = %error, "rate limit cleanup failed"),
            }
        }
    });
}
