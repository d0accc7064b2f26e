//! Request orchestration: fetch, then persist, under one request budget.
//!
//! ```text
//! Start ──▶ Fetching ──▶ Persisting ──▶ Success
//!   │          │  │           │  │
//!   │          │  │           │  └──▶ StorageTimeout / InternalError
//!   │          │  └──▶ UpstreamTimeout / InternalError
//!   └──────────┴──▶ ClientCancelled
//! ```
//!
//! Each stage derives its own sub-deadline from the request context, so a
//! timeout is always attributed to the stage that caused it. The fetch is
//! raced against caller cancellation; the store is only reached after a
//! successful fetch by a caller that is still listening.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::observability::metrics;
use crate::quoting::error::PipelineError;
use crate::quoting::upstream::QuotationSource;
use crate::resilience::RequestContext;
use crate::storage::QuotationStore;

/// The single result of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Fetched and durably stored.
    Success { bid: String, stored_id: i64 },
    /// The caller went away before the pipeline finished.
    ClientCancelled,
    /// The fetch stage ran out of time.
    UpstreamTimeout,
    /// The persist stage ran out of time.
    StorageTimeout,
    /// Anything else. Never routine.
    InternalError(PipelineError),
}

impl Outcome {
    /// Label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Success { .. } => "success",
            Outcome::ClientCancelled => "client_cancelled",
            Outcome::UpstreamTimeout => "upstream_timeout",
            Outcome::StorageTimeout => "storage_timeout",
            Outcome::InternalError(_) => "internal_error",
        }
    }
}

/// Orchestrates the fetch and persist stages for each request.
#[derive(Clone)]
pub struct QuoteEngine {
    source: Arc<dyn QuotationSource>,
    store: Arc<dyn QuotationStore>,
    request_budget: Duration,
}

impl QuoteEngine {
    /// Create a new engine. `request_budget` caps every request end to end.
    pub fn new(
        source: Arc<dyn QuotationSource>,
        store: Arc<dyn QuotationStore>,
        request_budget: Duration,
    ) -> Self {
        Self {
            source,
            store,
            request_budget,
        }
    }

    /// Run one request to a single outcome.
    pub async fn handle(&self, parent: &RequestContext) -> Outcome {
        let started = Instant::now();
        let ctx = parent.with_timeout(self.request_budget);
        let outcome = self.run(&ctx).await;
        metrics::record_outcome(outcome.label(), started);
        outcome
    }

    async fn run(&self, ctx: &RequestContext) -> Outcome {
        if ctx.is_cancelled() {
            return Outcome::ClientCancelled;
        }

        let fetch_started = Instant::now();
        let fetched = tokio::select! {
            biased;
            _ = ctx.cancelled() => {
                metrics::record_stage("fetch", "cancelled", fetch_started);
                info!("Request cancelled by the client during fetch");
                return Outcome::ClientCancelled;
            }
            result = self.source.fetch(ctx) => result,
        };

        let record = match fetched {
            Ok(record) => {
                metrics::record_stage("fetch", "ok", fetch_started);
                record
            }
            Err(e) if e.is_deadline() => {
                metrics::record_stage("fetch", "timeout", fetch_started);
                warn!(error = %e, "Upstream timed out");
                return Outcome::UpstreamTimeout;
            }
            Err(e) => {
                metrics::record_stage("fetch", "error", fetch_started);
                return Outcome::InternalError(e.into());
            }
        };

        // Never write on behalf of a caller that is no longer listening
        if ctx.is_cancelled() {
            info!("Request cancelled by the client before persist");
            return Outcome::ClientCancelled;
        }

        let persist_started = Instant::now();
        match self.store.persist(ctx, &record).await {
            Ok(stored) => {
                metrics::record_stage("persist", "ok", persist_started);
                Outcome::Success {
                    bid: stored.record.bid,
                    stored_id: stored.id,
                }
            }
            Err(e) if e.is_deadline() => {
                metrics::record_stage("persist", "timeout", persist_started);
                warn!(error = %e, "Storage timed out");
                Outcome::StorageTimeout
            }
            Err(e) => {
                metrics::record_stage("persist", "error", persist_started);
                Outcome::InternalError(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quoting::error::FetchError;
    use crate::quoting::types::{sample_record, QuotationRecord};
    use crate::resilience::run_stage;
    use crate::storage::{StoreError, StoredQuotation};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};

    /// Source that answers after `delay` under its own stage budget.
    struct FakeSource {
        delay: Duration,
        timeout: Duration,
        result: Result<QuotationRecord, FetchError>,
        calls: AtomicU32,
    }

    impl FakeSource {
        fn new(delay_ms: u64, result: Result<QuotationRecord, FetchError>) -> Self {
            Self {
                delay: Duration::from_millis(delay_ms),
                timeout: Duration::from_millis(200),
                result,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl QuotationSource for FakeSource {
        async fn fetch(&self, ctx: &RequestContext) -> Result<QuotationRecord, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let delay = self.delay;
            run_stage(ctx, self.timeout, tokio::time::sleep(delay)).await?;
            self.result.clone()
        }
    }

    /// Store that counts confirmed writes.
    struct FakeStore {
        delay: Duration,
        timeout: Duration,
        fail_with: Option<StoreError>,
        calls: AtomicU32,
        next_id: AtomicI64,
    }

    impl FakeStore {
        fn new(delay_ms: u64) -> Self {
            Self {
                delay: Duration::from_millis(delay_ms),
                timeout: Duration::from_millis(10),
                fail_with: None,
                calls: AtomicU32::new(0),
                next_id: AtomicI64::new(1),
            }
        }

        fn writes(&self) -> i64 {
            self.next_id.load(Ordering::SeqCst) - 1
        }
    }

    #[async_trait]
    impl QuotationStore for FakeStore {
        async fn persist(
            &self,
            ctx: &RequestContext,
            record: &QuotationRecord,
        ) -> Result<StoredQuotation, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let delay = self.delay;
            run_stage(ctx, self.timeout, tokio::time::sleep(delay)).await?;
            if let Some(err) = &self.fail_with {
                return Err(err.clone());
            }
            let now = Utc::now();
            Ok(StoredQuotation {
                id: self.next_id.fetch_add(1, Ordering::SeqCst),
                record: record.clone(),
                created_at: now,
                updated_at: now,
            })
        }
    }

    fn engine(source: &Arc<FakeSource>, store: &Arc<FakeStore>) -> QuoteEngine {
        QuoteEngine::new(source.clone(), store.clone(), Duration::from_secs(2))
    }

    #[tokio::test]
    async fn test_success_returns_upstream_bid() {
        let source = Arc::new(FakeSource::new(5, Ok(sample_record())));
        let store = Arc::new(FakeStore::new(0));
        let (ctx, _handle) = RequestContext::new();

        let outcome = engine(&source, &store).handle(&ctx).await;

        assert_eq!(
            outcome,
            Outcome::Success {
                bid: "5.43".into(),
                stored_id: 1
            }
        );
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.writes(), 1);
    }

    #[tokio::test]
    async fn test_upstream_timeout_skips_store() {
        let source = Arc::new(FakeSource::new(1000, Ok(sample_record())));
        let store = Arc::new(FakeStore::new(0));
        let (ctx, _handle) = RequestContext::new();

        let outcome = engine(&source, &store).handle(&ctx).await;

        assert_eq!(outcome, Outcome::UpstreamTimeout);
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_storage_timeout_discards_record() {
        let source = Arc::new(FakeSource::new(0, Ok(sample_record())));
        let store = Arc::new(FakeStore::new(500));
        let (ctx, _handle) = RequestContext::new();

        let outcome = engine(&source, &store).handle(&ctx).await;

        assert_eq!(outcome, Outcome::StorageTimeout);
        assert_eq!(store.calls.load(Ordering::SeqCst), 1, "no retry");
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn test_cancel_during_fetch() {
        let source = Arc::new(FakeSource::new(150, Ok(sample_record())));
        let store = Arc::new(FakeStore::new(0));
        let (ctx, handle) = RequestContext::new();
        let engine = engine(&source, &store);

        let task = tokio::spawn(async move { engine.handle(&ctx).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        let cancelled_at = Instant::now();
        handle.cancel();

        let outcome = task.await.unwrap();
        assert_eq!(outcome, Outcome::ClientCancelled);
        // Returned without waiting for the fetch to finish
        assert!(cancelled_at.elapsed() < Duration::from_millis(100));
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let source = Arc::new(FakeSource::new(0, Ok(sample_record())));
        let store = Arc::new(FakeStore::new(0));
        let (ctx, handle) = RequestContext::new();
        handle.cancel();

        let outcome = engine(&source, &store).handle(&ctx).await;

        assert_eq!(outcome, Outcome::ClientCancelled);
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_bad_status_is_internal_error() {
        let source = Arc::new(FakeSource::new(
            0,
            Err(FetchError::UpstreamBadStatus { status: 500 }),
        ));
        let store = Arc::new(FakeStore::new(0));
        let (ctx, _handle) = RequestContext::new();

        let outcome = engine(&source, &store).handle(&ctx).await;

        assert_eq!(
            outcome,
            Outcome::InternalError(PipelineError::Fetch(FetchError::UpstreamBadStatus {
                status: 500
            }))
        );
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_storage_failure_is_internal_error() {
        let source = Arc::new(FakeSource::new(0, Ok(sample_record())));
        let mut store = FakeStore::new(0);
        store.fail_with = Some(StoreError::Storage("UNIQUE constraint failed".into()));
        let store = Arc::new(store);
        let (ctx, _handle) = RequestContext::new();

        let outcome = engine(&source, &store).handle(&ctx).await;

        assert!(matches!(
            outcome,
            Outcome::InternalError(PipelineError::Store(StoreError::Storage(_)))
        ));
    }

    #[tokio::test]
    async fn test_request_ceiling_bounds_fetch() {
        // Stage allows 200ms but the request ceiling is only 30ms
        let source = Arc::new(FakeSource::new(100, Ok(sample_record())));
        let store = Arc::new(FakeStore::new(0));
        let engine = QuoteEngine::new(source.clone(), store.clone(), Duration::from_millis(30));
        let (ctx, _handle) = RequestContext::new();

        let started = Instant::now();
        let outcome = engine.handle(&ctx).await;

        assert_eq!(outcome, Outcome::UpstreamTimeout);
        assert!(started.elapsed() < Duration::from_millis(90));
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(Outcome::UpstreamTimeout.label(), "upstream_timeout");
        assert_eq!(Outcome::StorageTimeout.label(), "storage_timeout");
        assert_eq!(
            Outcome::InternalError(PipelineError::Task("panicked".into())).label(),
            "internal_error"
        );
    }
}
