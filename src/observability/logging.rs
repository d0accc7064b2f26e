//! Structured logging.
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - `RUST_LOG` wins over the configured level

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::schema::ObservabilityConfig;

/// Default filter directives for a configured level.
pub fn default_directives(config: &ObservabilityConfig) -> String {
    format!("quotation_service={},tower_http=info", config.log_level)
}

/// Initialize the global subscriber. Call once, before anything logs.
pub fn init_logging(config: &ObservabilityConfig) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directives(config).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
