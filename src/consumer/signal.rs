//! Signal

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tokio::time::timeout;

/// One-shot handle resolving to the number of tasks the worker processed.
///
/// Returned by `terminate` and `terminate_now`. Only the worker fulfills it,
/// once, after its loop (and drain, if requested) has ended. Awaiting it
/// yields [`ConsumerError::WorkerGone`](crate::ConsumerError::WorkerGone) if
/// no worker will ever fulfill it, e.g. when the consumer was never started.
#[derive(Debug)]
#[must_use = "the signal reports the final processed count"]
pub struct CompletionSignal {
    rx: oneshot::Receiver<u64>,
}

impl CompletionSignal {
    pub(crate) fn new(rx: oneshot::Receiver<u64>) -> Self {
        Self { rx }
    }

    /// Wait for the final count, giving up after `limit`
    pub async fn wait_timeout(self, limit: Duration) -> crate::Result<u64> {
        timeout(limit, self)
            .await
            .map_err(|_| crate::ConsumerError::SignalTimeout(limit))?
    }

    /// Block the current thread until the final count is available.
    ///
    /// Panics if called from within an async execution context, like
    /// `tokio::sync::oneshot::Receiver::blocking_recv`.
    pub fn blocking_wait(self) -> crate::Result<u64> {
        self.rx
            .blocking_recv()
            .map_err(|_| crate::ConsumerError::WorkerGone)
    }

    /// Check for the final count without waiting.
    ///
    /// Returns `None` while the worker is still running. Once this returns
    /// `Some`, the signal must not be awaited again.
    pub fn try_result(&mut self) -> Option<crate::Result<u64>> {
        match self.rx.try_recv() {
            Ok(count) => Some(Ok(count)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(crate::ConsumerError::WorkerGone)),
        }
    }
}

impl Future for CompletionSignal {
    type Output = crate::Result<u64>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|res| res.map_err(|_| crate::ConsumerError::WorkerGone))
    }
}
