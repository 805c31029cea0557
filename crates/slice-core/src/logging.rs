//! Logging and tracing initialization.
//!
//! The level is controlled through `RUST_LOG`:
//!
//! ```bash
//! RUST_LOG=debug slice serve
//! RUST_LOG=slice_core=debug,tower_http=debug,sqlx=warn slice serve
//! ```

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize plain-text logging, `info` unless `RUST_LOG` says otherwise.
///
/// # Panics
///
/// Panics if a global subscriber is already installed. Call it once at startup.
pub fn init_logging() {
    init_logging_with_level("info");
}

/// Initialize logging with a fallback level used when `RUST_LOG` is unset.
pub fn init_logging_with_level(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Initialize pretty-formatted logging for local development.
pub fn init_logging_pretty() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .pretty()
                .with_line_number(true)
                .with_target(true),
        )
        .init();
}

/// Initialize JSON-formatted logging for log aggregation in production.
pub fn init_logging_json() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}
