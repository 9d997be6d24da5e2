//! Application setup and initialization

pub mod database;
pub mod routes;
pub mod server;
pub mod services;

use crate::state::AppState;
use anyhow::{Context, Result};
use axum::Router;
use std::sync::Arc;
use tubely_core::Config;
use tubely_db::PgVideoRepository;
use tubely_storage::create_storage;

/// Connect to the database and object store, build the upload pipeline and routes.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, Router)> {
    let pool = database::setup_database(&config).await?;

    let storage = create_storage(&config)
        .await
        .context("Failed to initialize storage backend")?;
    tracing::info!(backend = %storage.backend_type(), "Storage initialized");

    let videos = Arc::new(PgVideoRepository::new(pool));
    let pipeline = services::build_upload_pipeline(&config, videos, storage.clone())?;

    let state = Arc::new(AppState {
        config,
        pipeline: Arc::new(pipeline),
        storage,
    });
    let router = routes::build_router(state.clone());

    Ok((state, router))
}
