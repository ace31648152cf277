// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cancellation tokens and single-slot subscriptions for background tasks

use parking_lot::Mutex;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Token for signaling cancelation of a task
#[derive(Debug, Clone)]
pub struct CancellationToken {
    inner: Arc<Notify>,
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new cancellation token
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Notify::new()),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Check if the token has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Cancel the token, notifying all waiters.
    ///
    /// Returns `true` only for the call that actually cancelled it.
    pub fn cancel(&self) -> bool {
        let first = !self.cancelled.swap(true, Ordering::AcqRel);
        if first {
            self.inner.notify_waiters();
        }
        first
    }

    /// Wait for cancellation
    pub async fn cancelled(&self) {
        let notified = self.inner.notified();
        tokio::pin!(notified);
        // Register before checking the flag so a concurrent cancel is not missed
        notified.as_mut().enable();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// A spawned task bound to a cancellation token.
///
/// Cancelling (or dropping) the subscription cancels the token and aborts the
/// task. Cancellation happens at most once.
#[derive(Debug)]
pub struct Subscription {
    name: &'static str,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl Subscription {
    /// Spawn `body` on the current runtime with a fresh token
    pub fn spawn<F, Fut>(name: &'static str, body: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let handle = tokio::spawn(body(token.clone()));
        tracing::trace!(task = name, "Subscription started");
        Self {
            name,
            token,
            handle,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Cancel the task; returns `false` if it was already cancelled
    pub fn cancel(&self) -> bool {
        if !self.token.cancel() {
            return false;
        }
        self.handle.abort();
        tracing::trace!(task = self.name, "Subscription cancelled");
        true
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Task is neither cancelled nor finished
    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled() && !self.handle.is_finished()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Holds at most one subscription; installing a new one cancels the previous
#[derive(Debug, Default)]
pub struct SerialSubscription {
    current: Mutex<Option<Subscription>>,
}

impl SerialSubscription {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current subscription, cancelling the previous one
    pub fn set(&self, subscription: Subscription) {
        let previous = self.current.lock().replace(subscription);
        if let Some(previous) = previous {
            previous.cancel();
        }
    }

    /// Cancel and remove the current subscription; returns whether one was active
    pub fn clear(&self) -> bool {
        let previous = self.current.lock().take();
        previous.map(|s| s.cancel()).unwrap_or(false)
    }

    pub fn is_active(&self) -> bool {
        self.current
            .lock()
            .as_ref()
            .map(Subscription::is_active)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_token_wakes_waiter() {
        let token = CancellationToken::new();
        let waiter = {
            let token = token.clone();
            tokio::spawn(async move { token.cancelled().await })
        };
        tokio::task::yield_now().await;
        assert!(token.cancel());
        assert!(!token.cancel());
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_returns_immediately_after_cancel() {
        let token = CancellationToken::new();
        token.cancel();
        tokio::time::timeout(Duration::from_millis(50), token.cancelled())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_serial_subscription_cancels_previous() {
        let slot = SerialSubscription::new();
        let mut tokens = Vec::new();

        for _ in 0..3 {
            let sub = Subscription::spawn("test", |token| async move { token.cancelled().await });
            tokens.push(sub.token().clone());
            slot.set(sub);
        }

        assert!(tokens[0].is_cancelled());
        assert!(tokens[1].is_cancelled());
        assert!(!tokens[2].is_cancelled());
        assert!(slot.is_active());
        assert!(slot.clear());
        assert!(!slot.clear());
        assert!(!slot.is_active());
        assert!(tokens[2].is_cancelled());
    }

    #[tokio::test]
    async fn test_drop_cancels_once() {
        let sub = Subscription::spawn("drop", |token| async move { token.cancelled().await });
        let token = sub.token().clone();
        assert!(sub.cancel());
        assert!(!sub.cancel());
        drop(sub);
        assert!(token.is_cancelled());
    }
}
