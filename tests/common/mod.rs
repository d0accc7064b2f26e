//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use quotation_service::config::ServiceConfig;
use quotation_service::http::ServerError;
use quotation_service::lifecycle::{build_service, Shutdown};
use quotation_service::storage::SqliteQuotationStore;

/// A well-formed upstream body for USD-BRL with bid "5.43".
pub const USD_BRL_BODY: &str = r#"{"USDBRL":{"code":"USD","codein":"BRL","name":"Dólar Americano/Real Brasileiro","high":"5.4700","low":"5.4100","varBid":"0.0120","pctChange":"0.22","bid":"5.43","ask":"5.4310","timestamp":"1700000000","create_date":"2023-11-14 19:00:00"}}"#;

/// What the mock upstream answers with.
#[derive(Clone)]
pub struct UpstreamReply {
    pub status: u16,
    pub body: String,
    pub delay: Duration,
}

impl UpstreamReply {
    pub fn ok() -> Self {
        Self {
            status: 200,
            body: USD_BRL_BODY.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Start a mock upstream on an ephemeral port. Returns its base URL and a
/// counter of accepted requests.
pub async fn start_mock_upstream(reply: UpstreamReply) -> (String, Arc<AtomicU32>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicU32::new(0));
    let counter = hits.clone();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let reply = reply.clone();
                    counter.fetch_add(1, Ordering::SeqCst);
                    tokio::spawn(async move {
                        let mut buf = [0u8; 1024];
                        let _ = socket.read(&mut buf).await;
                        tokio::time::sleep(reply.delay).await;

                        let status_text = match reply.status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            reply.body.len(),
                            reply.body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (format!("http://{}", addr), hits)
}

/// Config pointing at `upstream_url` with a database under `dir`.
///
/// The persist budget is widened so a cold SQLite file does not trip it.
pub fn test_config(upstream_url: &str, dir: &Path) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.upstream.base_url = upstream_url.to_string();
    config.storage.database_url = format!("sqlite://{}", dir.join("server.db").display());
    config.timeouts.persist_ms = 1000;
    config
}

/// A running service under test.
pub struct TestService {
    pub addr: SocketAddr,
    pub store: SqliteQuotationStore,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), ServerError>>,
}

impl TestService {
    pub fn url(&self) -> String {
        format!("http://{}/cotacao", self.addr)
    }
}

/// Build and start the service on an ephemeral port.
pub async fn start_service(config: ServiceConfig) -> TestService {
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let service = build_service(config, shutdown.clone()).await.unwrap();
    let store = service.store.clone();
    let handle = tokio::spawn(service.server.run(listener));

    TestService {
        addr,
        store,
        shutdown,
        handle,
    }
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
