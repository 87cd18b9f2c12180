pub mod config;
pub mod error;

pub use config::{
    Provider, Units, ValidationResult, WeatherConfig, WeatherOptions, DEFAULT_ACCURACY,
    DEFAULT_TIMEOUT_SECS, DEFAULT_TTL_SECS, MAX_ACCURACY,
};
pub use error::ConfigError;

use anyhow::Result;

/// Initialize tracing/logging for applications embedding Rainman.
///
/// Honors `RUST_LOG`, defaulting to `info`. Safe to call more than once:
/// if a global subscriber is already installed it is left in place.
pub fn init() -> Result<()> {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();

    if let Err(e) = installed {
        tracing::debug!("Tracing subscriber already installed: {}", e);
    }

    tracing::info!("Rainman core initialized");
    Ok(())
}
