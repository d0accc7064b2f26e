//! Timeout enforcement and request context.
//!
//! # Responsibilities
//! - Carry a request deadline and a cancellation signal through the pipeline
//! - Derive per-stage sub-deadlines from the remaining budget
//! - Cancel stage futures cleanly on expiry
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - A stage budget is `min(configured, parent remaining)`, never longer
//! - An exhausted parent fails the stage without polling it
//! - Dropping the `CancelHandle` cancels the context (the caller went away)

use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Error returned when a stage does not finish inside its sub-deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("stage deadline of {}ms exceeded", .limit.as_millis())]
pub struct StageTimeout {
    /// The budget the stage was given.
    pub limit: Duration,
}

/// Deadline and cancellation state for one inbound request.
///
/// Cloning is cheap; clones share the cancellation signal.
#[derive(Debug, Clone)]
pub struct RequestContext {
    deadline: Option<Instant>,
    cancelled: watch::Receiver<bool>,
}

/// Owner side of a context's cancellation signal.
///
/// Cancels on [`CancelHandle::cancel`] or when dropped.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Signal cancellation to every context derived from this handle.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl Drop for CancelHandle {
    fn drop(&mut self) {
        self.tx.send_replace(true);
    }
}

impl RequestContext {
    /// Create a root context without a deadline.
    pub fn new() -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        (
            Self {
                deadline: None,
                cancelled: rx,
            },
            CancelHandle { tx },
        )
    }

    /// Derive a child whose deadline is `now + timeout`, or the parent's
    /// deadline if that is earlier. The child shares the parent's cancellation.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(parent) => parent.min(candidate),
            None => candidate,
        };
        Self {
            deadline: Some(deadline),
            cancelled: self.cancelled.clone(),
        }
    }

    /// The absolute deadline, if one is attached.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline. `None` means unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// True once the deadline has passed.
    pub fn is_expired(&self) -> bool {
        matches!(self.remaining(), Some(left) if left.is_zero())
    }

    /// True once the caller has cancelled.
    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.borrow()
    }

    /// Budget for a stage configured with `configured`, clamped to what the
    /// parent has left.
    pub fn stage_budget(&self, configured: Duration) -> Duration {
        match self.remaining() {
            Some(left) => configured.min(left),
            None => configured,
        }
    }

    /// Resolves when the caller cancels.
    pub async fn cancelled(&self) {
        let mut rx = self.cancelled.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            // A closed channel means the handle is gone, which also cancels.
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

/// Run `stage` under a sub-deadline derived from `ctx`.
///
/// When the parent is already exhausted the future is dropped unpolled.
pub async fn run_stage<F, T>(
    ctx: &RequestContext,
    configured: Duration,
    stage: F,
) -> Result<T, StageTimeout>
where
    F: Future<Output = T>,
{
    let limit = ctx.stage_budget(configured);
    if limit.is_zero() {
        return Err(StageTimeout { limit });
    }
    tokio::time::timeout(limit, stage)
        .await
        .map_err(|_| StageTimeout { limit })
}
