//! Listener lifecycle guard.
//!
//! [`Lifecycle`] owns the resources a live listener hands out (the handler
//! set) and moves through `Open -> Closing -> Closed`. Authorization decisions
//! run inside [`Lifecycle::enter`], which only succeeds while `Open`; closing
//! takes the exclusive side of the same lock, so it waits for in-flight
//! decisions and no decision can observe a half-closed listener.

use thiserror::Error;
use tokio::sync::{RwLock, RwLockReadGuard, broadcast};

/// Phase of the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Open,
    Closing,
    Closed,
}

/// Returned when a decision is attempted on a listener that is not open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("listener is closing")]
    Closing,
    #[error("listener is closed")]
    Closed,
}

struct Inner<T> {
    phase: Phase,
    resources: Option<T>,
}

/// Lifecycle state of a listener guarding resources of type `T`.
pub struct Lifecycle<T> {
    inner: RwLock<Inner<T>>,
    /// Shutdown signal broadcaster. Sent once when closing begins.
    shutdown_tx: broadcast::Sender<()>,
}

impl<T> Lifecycle<T> {
    /// Create an open lifecycle holding `resources`.
    pub fn new(resources: T) -> Self {
        // Capacity 16 provides buffer for multiple slow subscribers during shutdown
        let (shutdown_tx, _) = broadcast::channel(16);

        Self {
            inner: RwLock::new(Inner {
                phase: Phase::Open,
                resources: Some(resources),
            }),
            shutdown_tx,
        }
    }

    /// Enter the open state.
    ///
    /// The returned guard keeps the listener from closing until it is dropped.
    pub async fn enter(&self) -> Result<RwLockReadGuard<'_, T>, LifecycleError> {
        let guard = self.inner.read().await;
        match guard.phase {
            Phase::Open => {}
            Phase::Closing => return Err(LifecycleError::Closing),
            Phase::Closed => return Err(LifecycleError::Closed),
        }
        RwLockReadGuard::try_map(guard, |inner| inner.resources.as_ref())
            .map_err(|_| LifecycleError::Closed)
    }

    /// Current phase.
    pub async fn phase(&self) -> Phase {
        self.inner.read().await.phase
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Close the listener.
    ///
    /// Waits for in-flight guards, announces shutdown, then commits `Closed`
    /// and returns the released resources. Later calls return `None`.
    pub async fn close(&self) -> Option<T> {
        {
            let mut inner = self.inner.write().await;
            if inner.phase != Phase::Open {
                return None;
            }
            inner.phase = Phase::Closing;
        }

        // No receivers is fine: nothing is listening yet.
        let _ = self.shutdown_tx.send(());

        let mut inner = self.inner.write().await;
        inner.phase = Phase::Closed;
        inner.resources.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_enter_while_open() {
        let lifecycle = Lifecycle::new("handlers");
        let guard = lifecycle.enter().await.unwrap();
        assert_eq!(*guard, "handlers");
    }

    #[tokio::test]
    async fn test_close_rejects_later_decisions() {
        let lifecycle = Lifecycle::new(1u32);

        assert_eq!(lifecycle.close().await, Some(1));
        assert_eq!(lifecycle.phase().await, Phase::Closed);
        assert_eq!(lifecycle.enter().await.err(), Some(LifecycleError::Closed));
        assert_eq!(lifecycle.close().await, None);
    }

    #[tokio::test]
    async fn test_close_waits_for_in_flight_decision() {
        let lifecycle = Arc::new(Lifecycle::new(()));
        let guard = lifecycle.enter().await.unwrap();

        let closer = {
            let lifecycle = Arc::clone(&lifecycle);
            tokio::spawn(async move { lifecycle.close().await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!closer.is_finished());
        drop(guard);

        assert_eq!(closer.await.unwrap(), Some(()));
        assert_eq!(lifecycle.phase().await, Phase::Closed);
    }

    #[tokio::test]
    async fn test_close_broadcasts_shutdown() {
        let lifecycle = Lifecycle::new(());
        let mut rx = lifecycle.subscribe();

        lifecycle.close().await;
        assert!(rx.recv().await.is_ok());
    }
}
