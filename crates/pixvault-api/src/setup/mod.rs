//! Application setup and initialization
//!
//! Everything main.rs needs before serving: config validation, telemetry,
//! directories, the media backend and the router.

pub mod routes;
pub mod server;
pub mod validation;

use crate::state::AppState;
use anyhow::{Context, Result};
use pixvault_core::Config;
use pixvault_processing::{
    build_media_tools, FormatProber, MediaValidationGate, Transcoder, VariantResolver,
};
use pixvault_storage::AssetStore;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    validation::validate_config(&config).context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.log_format())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment(),
        "Configuration loaded and validated successfully"
    );

    let store = AssetStore::from_config(&config)
        .await
        .context("Failed to prepare storage directories")?;

    let tools = build_media_tools(&config).context("Failed to set up media backend")?;

    let state = build_state(config.clone(), store, tools.prober, tools.transcoder);
    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}

/// Wire the gate and resolver around an already prepared store.
pub fn build_state(
    config: Config,
    store: AssetStore,
    prober: Arc<dyn FormatProber>,
    transcoder: Arc<dyn Transcoder>,
) -> Arc<AppState> {
    let gate = MediaValidationGate::new(prober, config.allowed_codecs());
    let resolver = VariantResolver::new(store.clone(), transcoder, config.max_dimension());

    Arc::new(AppState {
        config,
        store,
        gate,
        resolver,
    })
}
