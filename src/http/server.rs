//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the quotation handler
//! - Wire up middleware (request ID, tracing, outer timeout)
//! - Bind server to listener
//! - Stop on OS signal, external trigger, or fatal fault

use axum::{http::StatusCode, routing::get, Router};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::schema::FaultPolicyConfig;
use crate::config::ServiceConfig;
use crate::http::quote::get_quotation;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::lifecycle::signals::shutdown_signal;
use crate::lifecycle::Shutdown;
use crate::quoting::QuoteEngine;

/// Slack on top of the request budget before the outer layer gives up.
/// The engine's own deadline should always fire first.
const HANDLER_GRACE: Duration = Duration::from_millis(250);

/// Backstop for a handler that outlives the request budget. Answers 408 like
/// the engine's own stage timeouts.
fn outer_timeout_layer(request_budget: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, request_budget + HANDLER_GRACE)
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<QuoteEngine>,
    pub fault_policy: FaultPolicyConfig,
    pub shutdown: Shutdown,
}

/// Errors that stop the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Shut down by the fault policy after an internal error.
    #[error("fatal quotation error: {0}")]
    Fatal(String),
}

/// HTTP server for the quotation endpoint.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
    shutdown: Shutdown,
    shutdown_rx: broadcast::Receiver<()>,
}

impl HttpServer {
    /// Create a new HTTP server around an engine.
    pub fn new(config: ServiceConfig, engine: QuoteEngine, shutdown: Shutdown) -> Self {
        let state = AppState {
            engine: Arc::new(engine),
            fault_policy: config.fault_policy.clone(),
            shutdown: shutdown.clone(),
        };

        let router = Self::build_router(&config, state);
        // Subscribe now so a trigger that lands before `run` is not lost
        let shutdown_rx = shutdown.subscribe();
        Self {
            router,
            config,
            shutdown,
            shutdown_rx,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ServiceConfig, state: AppState) -> Router {
        Router::new()
            .route(&config.listener.route, get(get_quotation))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(TraceLayer::new_for_http())
                    .layer(propagate_request_id_layer())
                    .layer(outer_timeout_layer(config.timeouts.request())),
            )
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            route = %self.config.listener.route,
            "HTTP server starting"
        );

        let mut shutdown_rx = self.shutdown_rx;
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown_signal() => {}
                    _ = shutdown_rx.recv() => {
                        tracing::info!("Shutdown triggered");
                    }
                }
            })
            .await?;

        tracing::info!("HTTP server stopped");
        match self.shutdown.fatal_reason() {
            Some(reason) => Err(ServerError::Fatal(reason.to_string())),
            None => Ok(()),
        }
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}
