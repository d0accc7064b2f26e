//! Quotation persistence.
//!
//! # Responsibilities
//! - Append one quotation per successful request
//! - Enforce the persist sub-deadline independently of the fetch deadline
//!
//! # Design Decisions
//! - Append-only: no update, upsert or delete is ever issued
//! - Not idempotent: a write that commits after its deadline expired leaves a
//!   row the caller never hears about
//! - The pool is created once by the entry point and shared by all requests

pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;

use crate::quoting::QuotationRecord;
use crate::resilience::{RequestContext, StageTimeout};

pub use sqlite::SqliteQuotationStore;

/// A quotation as persisted, with store-assigned metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredQuotation {
    pub id: i64,
    pub record: QuotationRecord,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Errors from the persist stage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The persist sub-deadline expired.
    #[error("storage deadline of {}ms exceeded", .limit.as_millis())]
    DeadlineExceeded { limit: Duration },

    /// Any other storage failure (constraint, I/O, connection).
    #[error("storage error: {0}")]
    Storage(String),
}

impl StoreError {
    pub fn is_deadline(&self) -> bool {
        matches!(self, StoreError::DeadlineExceeded { .. })
    }
}

impl From<StageTimeout> for StoreError {
    fn from(timeout: StageTimeout) -> Self {
        StoreError::DeadlineExceeded {
            limit: timeout.limit,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Storage(err.to_string())
    }
}

/// Append-only quotation store.
#[async_trait]
pub trait QuotationStore: Send + Sync {
    /// Insert one record under a sub-deadline derived from `ctx`.
    async fn persist(
        &self,
        ctx: &RequestContext,
        record: &QuotationRecord,
    ) -> Result<StoredQuotation, StoreError>;
}
