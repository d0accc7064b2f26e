//! Currency quotation service (v1)
//!
//! Serves the latest quotation for one currency pair, fetched from an
//! upstream API and recorded in a local store on every request.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌───────────────────────────────────────────────────┐
//!                      │                QUOTATION SERVICE                  │
//!                      │                                                   │
//!   GET /cotacao       │  ┌─────────┐    ┌──────────────────────────────┐  │
//!   ───────────────────┼─▶│  http   │───▶│        quoting::engine       │  │
//!                      │  │ adapter │    │  request budget, cancellation│  │
//!                      │  └────▲────┘    └───────┬──────────────┬───────┘  │
//!                      │       │                 │ fetch        │ persist  │
//!                      │       │                 ▼              ▼          │
//!                      │       │          ┌────────────┐ ┌────────────┐    │     Upstream
//!                      │       │          │  upstream  │ │  storage   │    │     pricing API
//!                      │       │          │  client    │─┼────────────┼────┼──▶  /json/last/USD-BRL
//!                      │       │          └────────────┘ │  (SQLite)  │    │
//!   200 {"bid"} / 408  │       │                         └────────────┘    │
//!   ◀──────────────────┼───────┘                                           │
//!                      │  ┌──────────────────────────────────────────────┐ │
//!                      │  │ config │ observability │ lifecycle │ timeouts│ │
//!                      │  └──────────────────────────────────────────────┘ │
//!                      └───────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use quotation_service::config::{load_config, ServiceConfig};
use quotation_service::http::ServerError;
use quotation_service::lifecycle::{build_service, Shutdown};
use quotation_service::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "quotation-service")]
#[command(about = "Serves the latest currency quotation and records every lookup", long_about = None)]
struct Cli {
    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!("quotation-service v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        route = %config.listener.route,
        request_ms = config.timeouts.request_ms,
        config_file = ?cli.config,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let service = build_service(config, shutdown).await?;

    let result = service.server.run(listener).await;
    service.store.close().await;

    match result {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            Ok(())
        }
        Err(ServerError::Fatal(reason)) => {
            tracing::error!(reason = %reason, "Stopped after internal error");
            Err(ServerError::Fatal(reason).into())
        }
        Err(e) => Err(e.into()),
    }
}
