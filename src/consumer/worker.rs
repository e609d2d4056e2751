use crate::consumer::{Shared, State};
use crate::queue::WorkQueue;
use crate::task::policy::ExceptionPolicy;
use crate::task::TaskError;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::Ordering;
use std::sync::{Arc, PoisonError};
use tokio::sync::broadcast;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info};

/// Worker routine: consume while running, drain if asked, then fulfill the
/// completion signal.
pub(crate) async fn run<T: Send + Sync + 'static>(
    shared: Arc<Shared<T>>,
    queue: Arc<dyn WorkQueue<T>>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    info!(consumer = %shared.name, "Worker started");

    while shared.state() == State::Running {
        tokio::select! {
            biased;
            _ = shutdown_rx.recv() => break,
            next = queue.fetch() => match next {
                Some(task) => shared.consume(task).await,
                None => {
                    // Nothing handed out (closed or polling queue), back off
                    tokio::select! {
                        _ = shutdown_rx.recv() => break,
                        _ = sleep(shared.idle_backoff) => {}
                    }
                }
            },
        }
    }

    if shared.drain.load(Ordering::Acquire) {
        let before = shared.consumed_count();
        let mut drained = 0u64;
        while let Some(task) = queue.try_fetch().await {
            shared.consume(task).await;
            drained += 1;
        }
        debug!(
            consumer = %shared.name,
            "Drained {} remaining tasks ({} succeeded)",
            drained,
            shared.consumed_count() - before
        );
    }

    queue.close();

    let consumed = shared.consumed_count();
    match shared.take_completion() {
        Some(tx) => {
            let _ = tx.send(consumed);
        }
        None => debug!(consumer = %shared.name, "Worker exited without a termination request"),
    }

    info!(consumer = %shared.name, consumed, "Worker stopped");
}

impl<T: Send + Sync + 'static> Shared<T> {
    /// Process one task, containing any failure
    async fn consume(&self, task: T) {
        let outcome = {
            let fut = AssertUnwindSafe(self.handler.handle(&task)).catch_unwind();
            match self.task_timeout {
                Some(limit) => match timeout(limit, fut).await {
                    Ok(outcome) => outcome,
                    Err(_) => Ok(Err(TaskError::Timeout(limit))),
                },
                None => fut.await,
            }
        };

        let result = outcome.unwrap_or_else(|panic| Err(TaskError::from_panic(panic)));
        match result {
            Ok(()) => {
                let consumed = self.consumed.fetch_add(1, Ordering::AcqRel) + 1;
                debug!(consumer = %self.name, consumed, "Task consumed");
            }
            Err(err) => self.handle_failure(&task, &err),
        }
    }

    fn handle_failure(&self, task: &T, err: &TaskError) {
        let policy = self
            .policy
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let outcome = match policy {
            Some(policy) => std::panic::catch_unwind(AssertUnwindSafe(|| policy.on_error(task, err))),
            None => std::panic::catch_unwind(AssertUnwindSafe(|| {
                self.fallback_policy.on_error(task, err)
            })),
        };

        if outcome.is_err() {
            error!(consumer = %self.name, "Exception policy panicked while handling: {}", err);
        }
    }
}
