//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the quotation service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address, route).
    pub listener: ListenerConfig,

    /// Upstream pricing API.
    pub upstream: UpstreamConfig,

    /// Request and stage budgets.
    pub timeouts: TimeoutConfig,

    /// Quotation store.
    pub storage: StorageConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// What to do when a request fails in a non-routine way.
    pub fault_policy: FaultPolicyConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Path of the quotation endpoint.
    pub route: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            route: "/cotacao".to_string(),
        }
    }
}

/// Upstream pricing API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Scheme and host of the API.
    pub base_url: String,

    /// Currency pair, e.g. "USD-BRL".
    pub pair: String,

    /// TCP connect timeout in milliseconds.
    pub connect_timeout_ms: u64,

    /// User-Agent sent upstream.
    pub user_agent: String,
}

impl UpstreamConfig {
    /// Full URL of the latest-quotation resource for the pair.
    pub fn quotation_url(&self) -> String {
        format!("{}/json/last/{}", self.base_url.trim_end_matches('/'), self.pair)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://economia.awesomeapi.com.br".to_string(),
            pair: "USD-BRL".to_string(),
            connect_timeout_ms: 1000,
            user_agent: concat!("quotation-service/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Timeout budgets, in milliseconds.
///
/// Stage budgets are further clamped at runtime to whatever the request has left.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Ceiling for a whole request.
    pub request_ms: u64,

    /// Budget for the upstream fetch.
    pub fetch_ms: u64,

    /// Budget for the store write.
    pub persist_ms: u64,
}

impl TimeoutConfig {
    pub fn request(&self) -> Duration {
        Duration::from_millis(self.request_ms)
    }

    pub fn persist(&self) -> Duration {
        Duration::from_millis(self.persist_ms)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_ms: 2000,
            fetch_ms: 200,
            persist_ms: 10,
        }
    }
}

/// Quotation store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite URL, e.g. "sqlite://server.db".
    pub database_url: String,

    /// Pool size.
    pub max_connections: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://server.db".to_string(),
            max_connections: 5,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Escalation for internal errors.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct FaultPolicyConfig {
    /// Stop the server (and exit non-zero) after the first internal error.
    pub shutdown_on_internal_error: bool,
}
