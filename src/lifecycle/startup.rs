//! Startup orchestration.
//!
//! # Responsibilities
//! - Open the quotation store (the process-wide handle)
//! - Build the upstream client and the engine
//! - Hand everything to the HTTP server
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The store is created here and injected, never reached through a global

use std::sync::Arc;
use thiserror::Error;

use crate::config::ServiceConfig;
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::quoting::{FetchError, QuoteEngine, UpstreamClient};
use crate::storage::{SqliteQuotationStore, StoreError};

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to open quotation store: {0}")]
    Storage(#[from] StoreError),

    #[error("failed to build upstream client: {0}")]
    Upstream(#[from] FetchError),
}

/// Everything `main` needs to serve and later tear down.
pub struct Service {
    pub server: HttpServer,
    pub store: SqliteQuotationStore,
}

/// Wire store, upstream client and engine into a server.
pub async fn build_service(config: ServiceConfig, shutdown: Shutdown) -> Result<Service, StartupError> {
    let store = SqliteQuotationStore::connect(&config.storage, config.timeouts.persist()).await?;
    let existing = store.count().await?;
    tracing::info!(existing_quotations = existing, "Quotation store ready");

    let upstream = UpstreamClient::new(&config.upstream, &config.timeouts)?;
    tracing::info!(
        url = %upstream.url(),
        fetch_ms = config.timeouts.fetch_ms,
        persist_ms = config.timeouts.persist_ms,
        request_ms = config.timeouts.request_ms,
        "Upstream client ready"
    );

    let engine = QuoteEngine::new(
        Arc::new(upstream),
        Arc::new(store.clone()),
        config.timeouts.request(),
    );

    Ok(Service {
        server: HttpServer::new(config, engine, shutdown),
        store,
    })
}
