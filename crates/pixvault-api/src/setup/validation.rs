//! Configuration validation
//!
//! Validates critical configuration values at startup to catch misconfigurations early.

use anyhow::Result;
use pixvault_core::{Config, MediaBackend};

/// Validate critical configuration values
///
/// Runs the config's own checks, then the ones that only matter once a server
/// is about to start.
pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    let env_var = std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .ok();
    if config.is_production() && env_var.is_none() {
        tracing::warn!(
            "Production mode detected but ENVIRONMENT/APP_ENV not set - error details may leak"
        );
    }

    if config.media_backend() == MediaBackend::Native && config.is_production() {
        tracing::warn!(
            "Native media backend in production - probing covers fewer formats than ffprobe"
        );
    }

    if config.max_file_size_bytes() > 100 * 1024 * 1024 {
        tracing::warn!(
            max_file_size_bytes = config.max_file_size_bytes(),
            "Upload limit above 100 MB - uploads are buffered in memory"
        );
    }

    Ok(())
}
