//! Application wiring, assembled in dependency order: configuration,
//! telemetry, database, storage, cache, services, router.

pub mod database;
pub mod routes;
pub mod server;
pub mod services;
pub mod telemetry;

use std::sync::Arc;

use anyhow::{Context, Result};

use komuchi_core::Config;

use crate::state::AppState;

/// Build the fully wired application. Returns the shared state (which owns
/// the running job queue) and the router to serve.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    config.validate().context("Configuration validation failed")?;

    telemetry::init_telemetry(&config);

    tracing::info!(
        environment = config.environment(),
        "Configuration loaded and validated"
    );

    let pool = database::setup_database(&config).await?;

    let storage = komuchi_storage::create_storage(&config)
        .await
        .context("Failed to initialize storage backend")?;
    tracing::info!(backend = %config.storage_backend(), "Storage initialized");

    let cache = komuchi_cache::create_cache(&config).context("Failed to initialize cache")?;

    let state = services::initialize_services(&config, pool, storage, cache).await?;

    let router = routes::setup_routes(&config, state.clone()).await?;

    Ok((state, router))
}
