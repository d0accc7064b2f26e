//! Configuration validation.
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::ServiceConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("timeouts.{stage}_ms ({stage_ms}) exceeds timeouts.request_ms ({request_ms})")]
    StageExceedsRequest {
        stage: &'static str,
        stage_ms: u64,
        request_ms: u64,
    },

    /// A connect timeout shorter than the fetch budget would surface a slow
    /// connect as a transport failure instead of an upstream timeout.
    #[error("upstream.connect_timeout_ms ({connect_ms}) is below timeouts.fetch_ms ({fetch_ms})")]
    ConnectBelowFetch { connect_ms: u64, fetch_ms: u64 },

    #[error("{field} is not a valid socket address: {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("upstream.base_url is not a valid http(s) URL: {0}")]
    InvalidUrl(String),

    #[error("upstream.pair must look like 'USD-BRL', got '{0}'")]
    InvalidPair(String),

    #[error("listener.route must start with '/', got '{0}'")]
    InvalidRoute(String),

    #[error("storage.database_url must be a sqlite: URL, got '{0}'")]
    UnsupportedDatabase(String),
}

/// Check every semantic rule and collect all failures.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let timeouts = &config.timeouts;

    for (field, value) in [
        ("timeouts.request_ms", timeouts.request_ms),
        ("timeouts.fetch_ms", timeouts.fetch_ms),
        ("timeouts.persist_ms", timeouts.persist_ms),
        ("upstream.connect_timeout_ms", config.upstream.connect_timeout_ms),
    ] {
        if value == 0 {
            errors.push(ValidationError::Zero { field });
        }
    }
    if config.storage.max_connections == 0 {
        errors.push(ValidationError::Zero {
            field: "storage.max_connections",
        });
    }

    for (stage, stage_ms) in [("fetch", timeouts.fetch_ms), ("persist", timeouts.persist_ms)] {
        if stage_ms > timeouts.request_ms {
            errors.push(ValidationError::StageExceedsRequest {
                stage,
                stage_ms,
                request_ms: timeouts.request_ms,
            });
        }
    }

    if config.upstream.connect_timeout_ms < timeouts.fetch_ms {
        errors.push(ValidationError::ConnectBelowFetch {
            connect_ms: config.upstream.connect_timeout_ms,
            fetch_ms: timeouts.fetch_ms,
        });
    }

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    match url::Url::parse(&config.upstream.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        _ => errors.push(ValidationError::InvalidUrl(config.upstream.base_url.clone())),
    }

    if !is_valid_pair(&config.upstream.pair) {
        errors.push(ValidationError::InvalidPair(config.upstream.pair.clone()));
    }

    if !config.listener.route.starts_with('/') {
        errors.push(ValidationError::InvalidRoute(config.listener.route.clone()));
    }

    if !config.storage.database_url.starts_with("sqlite:") {
        errors.push(ValidationError::UnsupportedDatabase(
            config.storage.database_url.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

fn is_valid_pair(pair: &str) -> bool {
    match pair.split_once('-') {
        Some((base, quote)) => [base, quote]
            .iter()
            .all(|code| !code.is_empty() && code.chars().all(|c| c.is_ascii_alphabetic())),
        None => false,
    }
}
