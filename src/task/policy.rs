//! Policy

use crate::task::TaskError;
use tracing::error;

/// Strategy invoked when a task handler fails.
///
/// The worker calls it instead of propagating the error, then moves on to the
/// next task. Any `Fn(&T, &TaskError)` closure is a policy.
pub trait ExceptionPolicy<T>: Send + Sync {
    /// Called with the task whose handler failed and the failure
    fn on_error(&self, task: &T, error: &TaskError);
}

impl<T, F> ExceptionPolicy<T> for F
where
    F: Fn(&T, &TaskError) + Send + Sync,
{
    fn on_error(&self, task: &T, error: &TaskError) {
        self(task, error)
    }
}

/// Default policy: log the failure and continue
#[derive(Debug, Clone)]
pub struct LogPolicy {
    name: String,
}

impl LogPolicy {
    /// Create a policy logging under the given consumer name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl<T> ExceptionPolicy<T> for LogPolicy {
    fn on_error(&self, _task: &T, error: &TaskError) {
        error!(
            consumer = %self.name,
            kind = error.as_label(),
            "Task processing failed: {}",
            error
        );
    }
}
