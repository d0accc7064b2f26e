//! Upstream quotation client.
//!
//! # Responsibilities
//! - Issue one deadline-bounded GET per request to the pricing API
//! - Drain the response body before inspecting the status
//! - Decode the pair envelope into a `QuotationRecord`

use async_trait::async_trait;
use axum::body::Bytes;
use std::time::Duration;

use crate::config::schema::{TimeoutConfig, UpstreamConfig};
use crate::quoting::error::FetchError;
use crate::quoting::types::{pair_key, QuotationRecord, UpstreamEnvelope};
use crate::resilience::{run_stage, RequestContext};

/// Source of quotation records.
#[async_trait]
pub trait QuotationSource: Send + Sync {
    /// Fetch one record under a sub-deadline derived from `ctx`.
    async fn fetch(&self, ctx: &RequestContext) -> Result<QuotationRecord, FetchError>;
}

/// HTTP client for the quotation API.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    url: String,
    pair_key: String,
    timeout: Duration,
}

impl UpstreamClient {
    /// Build a client for the configured pair.
    pub fn new(config: &UpstreamConfig, timeouts: &TimeoutConfig) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            http,
            url: config.quotation_url(),
            pair_key: pair_key(&config.pair),
            timeout: Duration::from_millis(timeouts.fetch_ms),
        })
    }

    /// The full URL requested on every fetch.
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn get_body(&self) -> Result<Bytes, FetchError> {
        let response = self.http.get(&self.url).send().await?;
        let status = response.status();

        // Read to the end either way so the connection goes back to the pool
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(FetchError::UpstreamBadStatus {
                status: status.as_u16(),
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl QuotationSource for UpstreamClient {
    async fn fetch(&self, ctx: &RequestContext) -> Result<QuotationRecord, FetchError> {
        let body = run_stage(ctx, self.timeout, self.get_body()).await??;
        let envelope = UpstreamEnvelope::decode(&body, &self.pair_key)?;

        tracing::debug!(
            pair = %envelope.pair_key(),
            bytes = body.len(),
            "Upstream quotation decoded"
        );
        Ok(envelope.into_record())
    }
}
