//! Shutdown coordination for the service.

use std::sync::{Arc, OnceLock};
use tokio::sync::broadcast;

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that all long-running tasks can subscribe to.
/// A shutdown may carry a fatal reason; only the first one is kept.
#[derive(Clone)]
pub struct Shutdown {
    /// Broadcast channel sender.
    tx: broadcast::Sender<()>,
    fatal: Arc<OnceLock<String>>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            fatal: Arc::new(OnceLock::new()),
        }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Record a fatal reason and trigger shutdown.
    pub fn trigger_fatal(&self, reason: impl Into<String>) {
        let _ = self.fatal.set(reason.into());
        self.trigger();
    }

    /// The first fatal reason, if shutdown was fatal.
    pub fn fatal_reason(&self) -> Option<&str> {
        self.fatal.get().map(String::as_str)
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_reaches_subscribers() {
        let shutdown = Shutdown::new();
        let mut rx = shutdown.subscribe();
        shutdown.clone().trigger();
        assert!(rx.recv().await.is_ok());
        assert_eq!(shutdown.fatal_reason(), None);
    }

    #[tokio::test]
    async fn test_first_fatal_reason_wins() {
        let shutdown = Shutdown::new();
        let mut rx = shutdown.subscribe();

        shutdown.trigger_fatal("fetch failed: upstream returned status 500");
        shutdown.trigger_fatal("persist failed");

        assert!(rx.recv().await.is_ok());
        assert_eq!(
            shutdown.fatal_reason(),
            Some("fetch failed: upstream returned status 500")
        );
    }
}
