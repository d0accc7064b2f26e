//! Pipeline error definitions.

use std::time::Duration;
use thiserror::Error;

use crate::resilience::StageTimeout;
use crate::storage::StoreError;

/// Errors from the upstream fetch stage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The fetch sub-deadline expired.
    #[error("upstream deadline of {}ms exceeded", .limit.as_millis())]
    DeadlineExceeded { limit: Duration },

    /// Connection, DNS, TLS or body read failure.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Upstream answered with a non-2xx status.
    #[error("upstream returned status {status}")]
    UpstreamBadStatus { status: u16 },

    /// Body was not a valid quotation envelope.
    #[error("failed to decode upstream payload: {0}")]
    Decode(String),
}

impl FetchError {
    pub fn is_deadline(&self) -> bool {
        matches!(self, FetchError::DeadlineExceeded { .. })
    }
}

impl From<StageTimeout> for FetchError {
    fn from(timeout: StageTimeout) -> Self {
        FetchError::DeadlineExceeded {
            limit: timeout.limit,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::UpstreamUnavailable(err.to_string())
    }
}

/// A non-routine failure carried by `Outcome::InternalError`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("persist failed: {0}")]
    Store(#[from] StoreError),

    /// The pipeline task itself failed (panicked or was aborted).
    #[error("pipeline task failed: {0}")]
    Task(String),
}

impl PipelineError {
    /// Stage label for logs and metrics.
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Fetch(_) => "fetch",
            PipelineError::Store(_) => "persist",
            PipelineError::Task(_) => "task",
        }
    }
}
