//! Per-request cancellation and deadlines.

use super::MonitorError;
use crate::provider::ProviderError;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Caller-supplied limits for one aggregation request.
///
/// Every provider call made on behalf of the request runs through
/// [`RequestContext::run`]. The service itself never times out on its own.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    deadline: Option<Instant>,
    cancel: Option<watch::Receiver<bool>>,
}

/// Handle that cancels every request sharing its context.
#[derive(Debug)]
pub struct CancelHandle {
    sender: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        // Receivers may all be gone already; nothing left to stop then.
        let _ = self.sender.send(true);
    }
}

impl RequestContext {
    /// A context with no deadline that is never cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail provider calls still running `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Attach a cancellation signal and return the handle that fires it.
    pub fn cancellable(mut self) -> (Self, CancelHandle) {
        let (sender, receiver) = watch::channel(false);
        self.cancel = Some(receiver);
        (self, CancelHandle { sender })
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Run one provider call under this context's limits.
    ///
    /// If the context is cancelled or its deadline passes first, the call's
    /// future is dropped and the request fails.
    pub async fn run<T, F>(&self, call: F) -> Result<T, MonitorError>
    where
        F: Future<Output = Result<T, ProviderError>>,
    {
        if self.is_cancelled() {
            return Err(MonitorError::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(MonitorError::DeadlineExceeded);
        }

        let cancelled = wait_for_cancel(self.cancel.clone());
        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            _ = cancelled => Err(MonitorError::Cancelled),
            _ = expired => Err(MonitorError::DeadlineExceeded),
            result = call => result.map_err(MonitorError::from),
        }
    }
}

async fn wait_for_cancel(receiver: Option<watch::Receiver<bool>>) {
    let Some(mut rx) = receiver else {
        return std::future::pending().await;
    };
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            // Handle dropped without cancelling.
            return std::future::pending().await;
        }
    }
}
