use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Body returned by the quotation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotationResponse {
    pub bid: String,
}

#[derive(Debug, Error)]
pub enum ClientError {
    /// Our own deadline expired before the server answered.
    #[error("request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("server returned status {0}")]
    Status(StatusCode),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Client for the quotation endpoint, bounded by a local deadline.
pub struct QuotationClient {
    client: Client,
    url: String,
    timeout: Duration,
}

impl QuotationClient {
    pub fn new(url: &str, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            url: url.to_string(),
            timeout,
        }
    }

    /// Fetch the current bid. Nothing more is sent once the deadline passes.
    pub async fn fetch_bid(&self) -> Result<String, ClientError> {
        let request = async {
            let resp = self.client.get(&self.url).send().await?;

            let status = resp.status();
            if status != StatusCode::OK {
                return Err(ClientError::Status(status));
            }

            let quotation: QuotationResponse = resp.json().await?;
            Ok(quotation.bid)
        };

        tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| ClientError::Timeout(self.timeout))?
    }
}

/// The line written for a bid, e.g. `Dólar: 5.43`.
pub fn format_bid(label: &str, bid: &str) -> String {
    format!("{}: {}", label, bid)
}

/// Write the labelled bid to `path`, replacing any previous content.
pub fn write_bid(path: &Path, label: &str, bid: &str) -> Result<String, ClientError> {
    let line = format_bid(label, bid);
    std::fs::write(path, &line)?;
    Ok(line)
}
