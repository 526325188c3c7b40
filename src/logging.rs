// Logging setup for the binaries
//
// Engine code only emits `tracing` events. Installing a subscriber is the
// host application's job; tests can scope one with
// `tracing::subscriber::with_default`.

use crate::config::Settings;
use tracing_subscriber::EnvFilter;

/// Build the filter: `RUST_LOG` wins, otherwise the configured level
pub fn env_filter(settings: &Settings) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global fmt subscriber. Safe to call more than once.
pub fn init(settings: &Settings) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(settings))
        .with_target(false)
        .try_init();
}
