//! Structured logging setup
//!
//! `RUST_LOG` wins when set; otherwise the configured level applies, with
//! debug output for this crate when running verbose.

use crate::config::LoggingConfig;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError, EnvFilter};

/// Filter directive used when `RUST_LOG` is unset
pub fn default_directive(level: &str, verbose: bool) -> String {
    if verbose {
        format!("{},house_tracker=debug", level)
    } else {
        level.to_string()
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_tracing(logging: &LoggingConfig, verbose: bool) -> Result<(), TryInitError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(&logging.level, verbose)));

    let registry = tracing_subscriber::registry().with(env_filter);

    if logging.json {
        registry.with(fmt::layer().json().with_target(true)).try_init()
    } else {
        registry
            .with(fmt::layer().with_target(true).with_level(true).compact())
            .try_init()
    }
}
